//! Inventory interaction controller
//!
//! Maps pointer and window input onto leases, transfers and grid layout
//! through a [`void_interaction::ActionMachine`]. The machine decides which
//! action may run; the handlers below do the work against the registry.

use crate::container::ExternalContainer;
use crate::error::{most_severe, InventoryResult, Reason};
use crate::item::{InventoryId, ItemId};
use crate::lease::{DragLease, LeaseManager, LeasePayload, LockTable};
use crate::metadata::ItemMetadata;
use crate::registry::InventoryRegistry;
use void_interaction::{ActionId, ActionMachine, InputEvent};

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
}

/// Keyboard modifier held during a click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// No modifier
    None,
    /// Shift held
    Shift,
}

/// What an action is registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputTrigger {
    /// Pointer entered a slot
    HoverEnter,
    /// Pointer left the slot
    HoverLeave,
    /// Mouse click
    Click(MouseButton, Modifier),
    /// Grid resized
    Resize,
    /// Inventory window closed
    Close,
}

/// Input delivered by the host UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryInput {
    /// Pointer entered display slot `slot` of `inventory`
    HoverEnter { inventory: InventoryId, slot: usize },
    /// Pointer left the hovered slot
    HoverLeave,
    /// Mouse click
    Click { button: MouseButton, modifier: Modifier },
    /// Visible grid of `inventory` resized
    Resize {
        inventory: InventoryId,
        width: usize,
        height: usize,
    },
    /// Window of `inventory` closed
    Close { inventory: InventoryId },
}

impl InputEvent for InventoryInput {
    type Trigger = InputTrigger;

    fn trigger(&self) -> InputTrigger {
        match *self {
            Self::HoverEnter { .. } => InputTrigger::HoverEnter,
            Self::HoverLeave => InputTrigger::HoverLeave,
            Self::Click { button, modifier } => InputTrigger::Click(button, modifier),
            Self::Resize { .. } => InputTrigger::Resize,
            Self::Close { .. } => InputTrigger::Close,
        }
    }
}

/// Interaction state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionState {
    /// Pointer is not over a slot
    Idle,
    /// Pointer is over a slot
    Hovering,
    /// Items are being dragged
    Dragging,
}

/// Feedback for the host UI after a drop attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Drop accepted
    Positive,
    /// Drop refused, with the most severe reason
    Negative { reason: String },
}

/// A display slot of some inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    /// Inventory
    pub inventory: InventoryId,
    /// Display slot
    pub slot: usize,
}

/// What leases lock items in: the registry plus where a drop lands
pub struct DragContext<C: ExternalContainer> {
    /// All inventories
    pub registry: InventoryRegistry<C>,
    /// Slot the next consume moves items to
    pub drop_target: Option<SlotRef>,
}

impl<C: ExternalContainer> LockTable for DragContext<C> {
    fn contains_item(&self, id: ItemId) -> bool {
        self.registry.contains_item(id)
    }

    fn is_item_locked(&self, id: ItemId) -> bool {
        self.registry.is_item_locked(id)
    }

    fn set_item_locked(&mut self, id: ItemId, locked: bool) -> bool {
        self.registry.set_item_locked(id, locked)
    }
}

/// State handed to every action handler
pub struct InteractionContext<C: ExternalContainer> {
    /// Registry and drop target
    pub drag: DragContext<C>,
    /// Active drag lease
    pub leases: LeaseManager<DragContext<C>>,
    /// Slot under the pointer
    pub hovered: Option<SlotRef>,
    /// Icon source for drag payloads
    pub metadata: Option<Box<dyn ItemMetadata>>,
    feedback: Vec<Feedback>,
}

impl<C: ExternalContainer + 'static> InteractionContext<C> {
    fn new(registry: InventoryRegistry<C>) -> Self {
        Self {
            drag: DragContext {
                registry,
                drop_target: None,
            },
            leases: LeaseManager::new(),
            hovered: None,
            metadata: None,
            feedback: Vec::new(),
        }
    }

    /// Up to `count` unleased items under the pointer
    fn hovered_items(&self, count: usize) -> Vec<ItemId> {
        let Some(hovered) = self.hovered else {
            return Vec::new();
        };
        self.drag
            .registry
            .get(hovered.inventory)
            .map(|inventory| inventory.pick(hovered.slot, count))
            .unwrap_or_default()
    }

    fn can_pick(&self) -> bool {
        !self.hovered_items(1).is_empty()
    }

    fn payload_for(&self, items: &[ItemId]) -> LeasePayload {
        let Some(first) = items.first().and_then(|&id| self.drag.registry.find_item(id)) else {
            return LeasePayload::default();
        };
        let payload = &first.payload;
        LeasePayload {
            icon: self
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.icon(&payload.kind, payload.variant.as_deref())),
            summary: format!("{}x {}", items.len(), payload.label()),
            source: first.owner(),
        }
    }

    /// Lease up to `count` items from the hovered slot
    fn start_drag(&mut self, count: usize) -> InventoryResult<()> {
        let items = self.hovered_items(count);
        let payload = self.payload_for(&items);
        self.leases.lease(&mut self.drag, drop_lease(items, payload))
    }

    /// Add one item from the hovered slot to the active lease
    fn extend_drag(&mut self) -> InventoryResult<()> {
        let extra = self.hovered_items(1);
        let mut items = self.leases.items().to_vec();
        items.extend(extra.iter().copied());
        let payload = self.payload_for(&items);
        self.leases
            .extend(&mut self.drag, &extra, drop_lease(Vec::new(), payload))
    }

    /// Drop the leased items on the hovered slot
    fn drop_on_hovered(&mut self) -> InventoryResult<()> {
        self.drag.drop_target = self.hovered;
        let result = self.leases.consume(&mut self.drag);
        self.drag.drop_target = None;
        result
    }

    fn report(&mut self, result: InventoryResult<()>) -> bool {
        match result {
            Ok(()) => {
                self.feedback.push(Feedback::Positive);
                true
            }
            Err(err) => {
                let reason = most_severe(err.reasons())
                    .map(ToString::to_string)
                    .unwrap_or_else(|| err.to_string());
                log::debug!("Negative feedback: {}", reason);
                self.feedback.push(Feedback::Negative { reason });
                false
            }
        }
    }

    fn rest_state(&self) -> InteractionState {
        if self.hovered.is_some() {
            InteractionState::Hovering
        } else {
            InteractionState::Idle
        }
    }
}

/// A lease whose consume moves the items to the drop target
fn drop_lease<C: ExternalContainer + 'static>(items: Vec<ItemId>, payload: LeasePayload) -> DragLease<DragContext<C>> {
    DragLease::new(
        items,
        payload,
        |drag: &mut DragContext<C>, items| {
            let target = drag.drop_target.ok_or(Reason::NoFreeDisplaySlots)?;
            drag.registry.transfer(items, target.inventory, Some(target.slot))
        },
        |_, items| log::trace!("Drag of {} items abandoned", items.len()),
    )
}

/// Drives inventories from host UI input
pub struct InventoryController<C: ExternalContainer + 'static> {
    machine: ActionMachine<InteractionState, InventoryInput, InteractionContext<C>>,
    context: InteractionContext<C>,
}

impl<C: ExternalContainer + 'static> InventoryController<C> {
    /// Create a controller over a registry
    pub fn new(registry: InventoryRegistry<C>) -> Self {
        let mut controller = Self {
            machine: ActionMachine::new(InteractionState::Idle),
            context: InteractionContext::new(registry),
        };
        controller.define_actions();
        controller.machine.refresh(&controller.context);
        controller
    }

    /// Use `metadata` for drag icons
    pub fn with_metadata(mut self, metadata: impl ItemMetadata + 'static) -> Self {
        self.context.metadata = Some(Box::new(metadata));
        self
    }

    fn define_actions(&mut self) {
        use InteractionState::{Dragging, Hovering, Idle};
        let machine = &mut self.machine;

        for state in [Idle, Hovering, Dragging] {
            machine.define_action(state, InputTrigger::HoverEnter, move |ctx, event| {
                if let InventoryInput::HoverEnter { inventory, slot } = *event {
                    ctx.hovered = Some(SlotRef { inventory, slot });
                }
                Some(if state == Dragging { Dragging } else { Hovering })
            });
            machine.define_action(state, InputTrigger::HoverLeave, move |ctx, _| {
                ctx.hovered = None;
                Some(if state == Dragging { Dragging } else { Idle })
            });
        }

        let pick = |ctx: &InteractionContext<C>| ctx.can_pick();
        machine.define_guarded_action(
            Hovering,
            InputTrigger::Click(MouseButton::Left, Modifier::None),
            pick,
            |ctx, _| {
                let count = ctx.drag.registry.get(ctx.hovered?.inventory)?.display().max_items_per_slot();
                let started = ctx.start_drag(count);
                lease_started(started)
            },
        );
        machine.define_guarded_action(
            Hovering,
            InputTrigger::Click(MouseButton::Left, Modifier::Shift),
            pick,
            |ctx, _| lease_started(ctx.start_drag(1)),
        );

        machine.define_action(Dragging, InputTrigger::Click(MouseButton::Left, Modifier::None), |ctx, _| {
            let result = ctx.drop_on_hovered();
            ctx.report(result).then(|| ctx.rest_state())
        });
        machine.define_guarded_action(
            Dragging,
            InputTrigger::Click(MouseButton::Left, Modifier::Shift),
            pick,
            |ctx, _| {
                if let Err(err) = ctx.extend_drag() {
                    log::debug!("Could not extend drag: {}", err);
                }
                Some(Dragging)
            },
        );
        machine.define_action(Dragging, InputTrigger::Click(MouseButton::Right, Modifier::None), |ctx, _| {
            ctx.leases.cancel(&mut ctx.drag);
            Some(ctx.rest_state())
        });

        for state in [Idle, Hovering] {
            machine.define_action(state, InputTrigger::Resize, |ctx, event| {
                if let InventoryInput::Resize {
                    inventory,
                    width,
                    height,
                } = *event
                {
                    match ctx.drag.registry.get_mut(inventory) {
                        Some(target) => target.arrange(width, height),
                        None => log::warn!("Resize for unknown inventory {}", inventory),
                    }
                }
                None
            });
        }

        for state in [Idle, Hovering, Dragging] {
            machine.define_action(state, InputTrigger::Close, |ctx, _| {
                ctx.leases.cancel(&mut ctx.drag);
                ctx.hovered = None;
                Some(Idle)
            });
        }
    }

    /// Feed one input event. Returns the action that ran, if any.
    pub fn handle(&mut self, input: InventoryInput) -> Option<ActionId> {
        self.machine.dispatch(&mut self.context, &input)
    }

    /// Current state
    pub fn state(&self) -> InteractionState {
        *self.machine.current()
    }

    /// Slot under the pointer
    pub fn hovered(&self) -> Option<SlotRef> {
        self.context.hovered
    }

    /// Items being dragged
    pub fn dragged_items(&self) -> &[ItemId] {
        self.context.leases.items()
    }

    /// Payload of the active drag
    pub fn drag_payload(&self) -> Option<&LeasePayload> {
        self.context.leases.active().map(|lease| lease.payload())
    }

    /// Inventories
    pub fn registry(&self) -> &InventoryRegistry<C> {
        &self.context.drag.registry
    }

    /// Inventories, mutably. Call [`refresh`](Self::refresh) after changes
    /// that affect what can be picked up.
    pub fn registry_mut(&mut self) -> &mut InventoryRegistry<C> {
        &mut self.context.drag.registry
    }

    /// Re-evaluate which actions are available
    pub fn refresh(&mut self) {
        self.machine.refresh(&self.context);
    }

    /// Take pending drop feedback
    pub fn drain_feedback(&mut self) -> Vec<Feedback> {
        std::mem::take(&mut self.context.feedback)
    }
}

fn lease_started(result: InventoryResult<()>) -> Option<InteractionState> {
    match result {
        Ok(()) => Some(InteractionState::Dragging),
        Err(err) => {
            log::debug!("Could not start drag: {}", err);
            None
        }
    }
}
