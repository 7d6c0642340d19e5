//! Inventories
//!
//! [`PlainInventory`] keeps an item store and the host container's backing
//! index in step. [`SlottedInventory`] decorates it with the resizable display
//! grid. Both are driven through [`ItemContainer`].

use crate::backing::{BackingEvent, BackingSync, ReconcileReport};
use crate::config::InventoryConfig;
use crate::container::{ExternalContainer, SlotContents};
use crate::display::DisplayGrid;
use crate::error::{most_severe, summarize, InventoryError, InventoryResult, Reason, ReasonKind};
use crate::item::{reserve_item_id, InventoryId, Item, ItemId, ItemPayload};
use crate::lease::LockTable;
use crate::metadata::ItemMetadata;
use crate::persistence::{SavedLayout, SlotBinding};
use crate::store::{ItemStore, StoreEvent};
use std::collections::HashMap;

/// Slack allowed when comparing volumes
const VOLUME_EPSILON: f64 = 1e-9;

/// Where an attached item should go
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    /// Explicit backing slot
    pub backing: Option<usize>,
    /// Preferred display slots, in order
    pub display: Vec<usize>,
    /// Only the first preferred display slot is acceptable
    pub exact_display: bool,
    /// Invisible overflow is acceptable regardless of configuration
    pub overflow: bool,
}

impl Placement {
    /// Let the inventory decide
    pub fn anywhere() -> Self {
        Self::default()
    }

    /// Require a backing slot
    pub fn backing_slot(index: usize) -> Self {
        Self {
            backing: Some(index),
            ..Self::default()
        }
    }

    /// Prefer display slots, falling back to the usual search
    pub fn near(slots: impl Into<Vec<usize>>) -> Self {
        Self {
            display: slots.into(),
            ..Self::default()
        }
    }

    /// Require one display slot
    pub fn exactly(slot: usize) -> Self {
        Self {
            display: vec![slot],
            exact_display: true,
            ..Self::default()
        }
    }

    /// Accept invisible overflow
    pub fn with_overflow(mut self) -> Self {
        self.overflow = true;
        self
    }
}

/// Something items can be attached to and detached from
pub trait ItemContainer {
    /// Inventory id
    fn id(&self) -> InventoryId;

    /// Items held
    fn store(&self) -> &ItemStore;

    /// Every reason `item` cannot be attached with `placement`
    fn check_attach(&self, item: &Item, placement: &Placement) -> Vec<Reason>;

    /// Attach a detached item
    fn attach(&mut self, item: Item, placement: &Placement) -> InventoryResult<ItemId>;

    /// Detach an unlocked item
    fn detach(&mut self, id: ItemId) -> InventoryResult<Item>;

    /// Detach an item held by a lease; the lock stays on the returned item
    fn detach_leased(&mut self, id: ItemId) -> InventoryResult<Item>;

    /// Fold host-originated container changes into the store
    fn on_external_change(&mut self, metadata: &dyn ItemMetadata) -> ReconcileReport;
}

/// Item store plus backing index
pub struct PlainInventory<C: ExternalContainer> {
    id: InventoryId,
    max_volume: Option<f64>,
    store: ItemStore,
    backing: BackingSync<C>,
    /// Store notifications already applied to the backing index
    forwarded: Vec<StoreEvent>,
}

impl<C: ExternalContainer> PlainInventory<C> {
    /// Create an inventory over a host container
    pub fn new(id: InventoryId, container: C, config: &InventoryConfig) -> Self {
        Self {
            id,
            max_volume: config.max_volume,
            store: ItemStore::new(id),
            backing: BackingSync::new(container, config.policy),
            forwarded: Vec::new(),
        }
    }

    /// Backing index
    pub fn backing(&self) -> &BackingSync<C> {
        &self.backing
    }

    /// Host-side container access; follow up with
    /// [`on_external_change`](ItemContainer::on_external_change)
    pub fn container_mut(&mut self) -> &mut C {
        self.backing.container_mut()
    }

    /// Volume in use
    pub fn used_volume(&self) -> f64 {
        self.store.totals().volume
    }

    /// Volume left (None = unlimited)
    pub fn free_volume(&self) -> Option<f64> {
        self.max_volume.map(|max| (max - self.used_volume()).max(0.0))
    }

    /// Lock or unlock an item
    pub fn set_locked(&mut self, id: ItemId, locked: bool) -> bool {
        self.store.set_locked(id, locked)
    }

    /// Take store notifications that reached the backing index
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.forwarded)
    }

    /// Take backing notifications
    pub fn drain_backing_events(&mut self) -> Vec<BackingEvent> {
        self.backing.drain_events()
    }

    /// Add an item that already sits in host slot `index`
    pub(crate) fn restore_item(&mut self, index: usize, item: Item) -> InventoryResult<()> {
        let id = self.store.add(item)?;
        self.backing.adopt(index, id);
        self.pump();
        Ok(())
    }

    fn pump(&mut self) {
        for event in self.store.drain_events() {
            if let Err(err) = self.backing.on_store_event(&self.store, event) {
                log::warn!("Backing index out of step after {:?}: {}", event, err);
            }
            self.forwarded.push(event);
        }
    }
}

impl<C: ExternalContainer> ItemContainer for PlainInventory<C> {
    fn id(&self) -> InventoryId {
        self.id
    }

    fn store(&self) -> &ItemStore {
        &self.store
    }

    fn check_attach(&self, item: &Item, placement: &Placement) -> Vec<Reason> {
        let mut reasons = Vec::new();
        if !item.is_detached() || self.store.contains(item.id) {
            reasons.push(Reason::AlreadyAttached(item.id));
        }
        if item.carries == Some(self.id) {
            reasons.push(Reason::SelfContainment);
        }
        if let Some(available) = self.free_volume() {
            if item.volume > available + VOLUME_EPSILON {
                reasons.push(Reason::VolumeExceeded {
                    needed: item.volume,
                    available,
                });
            }
        }
        if let Err(reason) = self.backing.find_slot_for_item(&item.payload, placement.backing) {
            reasons.push(reason);
        }
        reasons
    }

    fn attach(&mut self, item: Item, placement: &Placement) -> InventoryResult<ItemId> {
        let reasons = self.check_attach(&item, placement);
        if !reasons.is_empty() {
            return Err(InventoryError::Rejected(reasons));
        }

        let id = item.id;
        self.backing.plan(id, &item.payload, placement.backing)?;
        if let Err(err) = self.store.add(item) {
            self.backing.cancel_plan(id);
            return Err(err);
        }
        self.pump();
        log::trace!("Attached item {} to {}", id, self.id);
        Ok(id)
    }

    fn detach(&mut self, id: ItemId) -> InventoryResult<Item> {
        let item = self.store.remove(id)?;
        self.pump();
        Ok(item)
    }

    fn detach_leased(&mut self, id: ItemId) -> InventoryResult<Item> {
        let item = self.store.remove_leased(id)?;
        self.pump();
        Ok(item)
    }

    fn on_external_change(&mut self, metadata: &dyn ItemMetadata) -> ReconcileReport {
        let report = self.backing.reconcile(&mut self.store, metadata);
        self.pump();
        report
    }
}

impl<C: ExternalContainer> LockTable for PlainInventory<C> {
    fn contains_item(&self, id: ItemId) -> bool {
        self.store.contains(id)
    }

    fn is_item_locked(&self, id: ItemId) -> bool {
        self.store.is_locked(id)
    }

    fn set_item_locked(&mut self, id: ItemId, locked: bool) -> bool {
        self.store.set_locked(id, locked)
    }
}

/// Slotted inventory notifications, drained by the host UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryEvent {
    /// Item attached
    ItemAdded {
        item: ItemId,
        backing: Option<usize>,
        display: usize,
    },
    /// Item detached
    ItemRemoved { item: ItemId, display: Option<usize> },
    /// A relaxed backing slot settled
    LayoutStabilized { slot: usize },
    /// Visible grid resized
    Arranged { width: usize, height: usize },
}

/// Outcome of a bulk attach
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkReport {
    /// Items attached
    pub added: Vec<ItemId>,
    /// Number of copies that failed
    pub failed: usize,
    /// Distinct reasons encountered
    pub reasons: Vec<Reason>,
}

impl BulkReport {
    /// Reason classes in order of first appearance
    pub fn kinds(&self) -> Vec<ReasonKind> {
        summarize(&self.reasons)
    }

    /// Most severe reason encountered
    pub fn most_severe(&self) -> Option<&Reason> {
        most_severe(&self.reasons)
    }

    fn record(&mut self, err: InventoryError) {
        self.failed += 1;
        if err.reasons().is_empty() {
            log::warn!("Bulk attach failed: {}", err);
        }
        for reason in err.reasons() {
            if !self.reasons.contains(reason) {
                self.reasons.push(reason.clone());
            }
        }
    }
}

/// Plain inventory plus the display grid
pub struct SlottedInventory<C: ExternalContainer> {
    inner: PlainInventory<C>,
    display: DisplayGrid,
    allow_overflow: bool,
    /// Display slots chosen for items being attached
    planned: HashMap<ItemId, usize>,
    events: Vec<InventoryEvent>,
}

impl<C: ExternalContainer> SlottedInventory<C> {
    /// Create an inventory over a host container
    pub fn new(id: InventoryId, container: C, config: &InventoryConfig) -> Self {
        Self {
            inner: PlainInventory::new(id, container, config),
            display: DisplayGrid::new(config.grid_width, config.grid_height, config.max_items_per_slot),
            allow_overflow: config.allow_display_overflow,
            planned: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Wrapped plain inventory
    pub fn plain(&self) -> &PlainInventory<C> {
        &self.inner
    }

    /// Backing index
    pub fn backing(&self) -> &BackingSync<C> {
        self.inner.backing()
    }

    /// Display grid
    pub fn display(&self) -> &DisplayGrid {
        &self.display
    }

    /// Host-side container access; follow up with
    /// [`on_external_change`](ItemContainer::on_external_change)
    pub fn container_mut(&mut self) -> &mut C {
        self.inner.container_mut()
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<InventoryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Display slot an item would go to, or why it cannot go anywhere
    pub fn display_target(&self, payload: &ItemPayload, placement: &Placement) -> Result<usize, Reason> {
        let store = self.inner.store();
        if placement.exact_display {
            if let Some(&slot) = placement.display.first() {
                self.display.check_slot(slot, payload, store)?;
                return Ok(slot);
            }
        }
        let overflow = placement.overflow || self.allow_overflow;
        self.display
            .find_slot_for_item(payload, store, &placement.display, overflow)
            .ok_or(Reason::NoFreeDisplaySlots)
    }

    /// Up to `count` unleased items of a display slot
    pub fn pick(&self, slot: usize, count: usize) -> Vec<ItemId> {
        self.display.pick(slot, count)
    }

    /// Resize the visible grid
    pub fn arrange(&mut self, width: usize, height: usize) {
        self.display.arrange(width, height);
        self.events.push(InventoryEvent::Arranged { width, height });
    }

    /// Swap two display slots
    pub fn swap_display(&mut self, a: usize, b: usize) -> InventoryResult<()> {
        self.display.swap(a, b)
    }

    /// Merge one display slot into another
    pub fn merge_display(&mut self, from: usize, to: usize) -> InventoryResult<usize> {
        self.display.merge(from, to, self.inner.store())
    }

    /// Attach `count` copies of `template`, continuing past failures
    pub fn add_copies(&mut self, template: &Item, count: usize, placement: &Placement) -> BulkReport {
        let mut report = BulkReport::default();
        for _ in 0..count {
            let copy = Item::new(template.payload.clone()).with_figures(template.mass, template.volume, template.cost);
            match self.attach(copy, placement) {
                Ok(id) => report.added.push(id),
                Err(err) => report.record(err),
            }
        }
        if report.failed > 0 {
            log::debug!(
                "Added {} of {} copies of {} to {}",
                report.added.len(),
                count,
                template.payload.label(),
                self.id()
            );
        }
        report
    }

    /// Snapshot the backing and display indices
    pub fn save_layout(&self) -> SavedLayout {
        let mut layout = SavedLayout::new(self.display.width(), self.display.height());
        for (slot, items) in self.inner.backing().indexed_slots() {
            layout.backing.extend(items.iter().map(|&item| SlotBinding::new(slot, item)));
        }
        for (slot, display) in self.display.slots().iter().enumerate() {
            layout.display.extend(display.items().iter().map(|&item| SlotBinding::new(slot, item)));
        }
        layout
    }

    /// Rebuild items from the host container and lay them out as saved.
    ///
    /// Items are recreated per host slot, reusing the saved ids of that slot
    /// in order. Display slots are then filled from the saved mapping; items
    /// the mapping does not place go wherever they fit, overflow included.
    /// Host slots that already have indexed items are left alone.
    pub fn restore(&mut self, layout: &SavedLayout, metadata: &dyn ItemMetadata) -> InventoryResult<()> {
        let slots: Vec<(usize, SlotContents)> = self
            .inner
            .backing()
            .container()
            .stored_slots()
            .iter()
            .map(|(&index, contents)| (index, contents.clone()))
            .collect();

        for (index, contents) in slots {
            if !self.inner.backing().items_in(index).is_empty() {
                continue;
            }
            let mut saved = layout.backing_ids(index);
            for _ in 0..contents.quantity {
                let item = match saved.next() {
                    Some(id) if !self.inner.store().contains(id) => {
                        reserve_item_id(id);
                        let mut item = Item::with_id(id, contents.payload.clone());
                        item.refresh_figures(metadata);
                        item
                    }
                    _ => Item::from_metadata(contents.payload.clone(), metadata),
                };
                self.inner.restore_item(index, item)?;
            }
        }
        self.inner.drain_events();

        self.display = DisplayGrid::new(layout.width, layout.height, self.display.max_items_per_slot());
        let mut bindings = layout.display.clone();
        bindings.sort_by_key(|binding| binding.slot);
        let visible = self.display.visible_count();
        let mut overflow_slots: HashMap<usize, usize> = HashMap::new();

        for binding in bindings {
            let store = self.inner.store();
            let Some(item) = store.find(binding.item) else {
                continue;
            };
            if self.display.slot_of(binding.item).is_some() {
                continue;
            }
            let target = if binding.slot < visible {
                binding.slot
            } else {
                let next = self.display.slots().len();
                *overflow_slots.entry(binding.slot).or_insert(next)
            };
            if target < self.display.slots().len() && self.display.check_slot(target, &item.payload, store).is_err() {
                continue;
            }
            if let Err(err) = self.display.place(binding.item, target, item.is_locked()) {
                log::warn!("Failed to restore item {} to display slot {}: {}", binding.item, target, err);
            }
        }

        let leftovers: Vec<ItemId> = self
            .inner
            .store()
            .all()
            .map(|item| item.id)
            .filter(|&id| self.display.slot_of(id).is_none())
            .collect();
        for id in &leftovers {
            self.place_added(*id);
        }

        log::info!(
            "Restored {} items into {} ({} placed by fallback)",
            self.inner.store().len(),
            self.id(),
            leftovers.len()
        );
        Ok(())
    }

    fn sync_display(&mut self) {
        for event in self.inner.drain_events() {
            match event {
                StoreEvent::Added(id) => self.place_added(id),
                StoreEvent::Removed(id) => {
                    self.planned.remove(&id);
                    let display = self.display.remove(id);
                    self.events.push(InventoryEvent::ItemRemoved { item: id, display });
                }
            }
        }
        for event in self.inner.drain_backing_events() {
            match event {
                BackingEvent::LayoutStabilized(slot) => self.events.push(InventoryEvent::LayoutStabilized { slot }),
            }
        }
    }

    fn place_added(&mut self, id: ItemId) {
        let store = self.inner.store();
        let Some(item) = store.find(id) else {
            return;
        };
        let index = match self.planned.remove(&id) {
            Some(index) => index,
            None => self
                .display
                .find_slot_for_item(&item.payload, store, &[], true)
                .unwrap_or(self.display.slots().len()),
        };

        let locked = item.is_locked();
        let display = match self.display.place(id, index, locked) {
            Ok(()) => index,
            Err(err) => {
                log::warn!("Display slot {} unavailable for item {}: {}", index, id, err);
                let overflow = self.display.slots().len();
                if self.display.place(id, overflow, locked).is_err() {
                    return;
                }
                overflow
            }
        };

        let backing = self.inner.backing().slot_of(id);
        self.events.push(InventoryEvent::ItemAdded {
            item: id,
            backing,
            display,
        });
    }
}

impl<C: ExternalContainer> ItemContainer for SlottedInventory<C> {
    fn id(&self) -> InventoryId {
        self.inner.id()
    }

    fn store(&self) -> &ItemStore {
        self.inner.store()
    }

    fn check_attach(&self, item: &Item, placement: &Placement) -> Vec<Reason> {
        let mut reasons = self.inner.check_attach(item, placement);
        if let Err(reason) = self.display_target(&item.payload, placement) {
            reasons.push(reason);
        }
        reasons
    }

    fn attach(&mut self, item: Item, placement: &Placement) -> InventoryResult<ItemId> {
        let mut reasons = self.inner.check_attach(&item, placement);
        let target = match self.display_target(&item.payload, placement) {
            Ok(target) => target,
            Err(reason) => {
                reasons.push(reason);
                return Err(InventoryError::Rejected(reasons));
            }
        };
        if !reasons.is_empty() {
            return Err(InventoryError::Rejected(reasons));
        }

        let id = item.id;
        self.planned.insert(id, target);
        if let Err(err) = self.inner.attach(item, placement) {
            self.planned.remove(&id);
            return Err(err);
        }
        self.sync_display();
        Ok(id)
    }

    fn detach(&mut self, id: ItemId) -> InventoryResult<Item> {
        let item = self.inner.detach(id)?;
        self.sync_display();
        Ok(item)
    }

    fn detach_leased(&mut self, id: ItemId) -> InventoryResult<Item> {
        let item = self.inner.detach_leased(id)?;
        self.sync_display();
        Ok(item)
    }

    fn on_external_change(&mut self, metadata: &dyn ItemMetadata) -> ReconcileReport {
        let report = self.inner.on_external_change(metadata);
        self.sync_display();
        report
    }
}

impl<C: ExternalContainer> LockTable for SlottedInventory<C> {
    fn contains_item(&self, id: ItemId) -> bool {
        self.inner.store().contains(id)
    }

    fn is_item_locked(&self, id: ItemId) -> bool {
        self.inner.store().is_locked(id)
    }

    fn set_item_locked(&mut self, id: ItemId, locked: bool) -> bool {
        if !self.inner.set_locked(id, locked) {
            return false;
        }
        self.display.set_reserved(id, locked);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompatibilityPolicy;
    use crate::container::MemoryContainer;
    use crate::metadata::{KindMetadata, MetadataTable};

    fn tank(fuel: f64) -> Item {
        Item::new(ItemPayload::new("tank").with_resource("fuel", fuel, 100.0)).with_figures(2.0, 1.0, 5.0)
    }

    fn inventory(config: InventoryConfig) -> SlottedInventory<MemoryContainer> {
        let container = MemoryContainer::new(9).with_stack_limit("tank", 5);
        SlottedInventory::new(InventoryId(1), container, &config)
    }

    #[test]
    fn test_attach_places_everywhere() {
        let mut inv = inventory(InventoryConfig::new(3, 1));
        let id = inv.attach(tank(50.0), &Placement::anywhere()).unwrap();

        assert!(inv.store().contains(id));
        assert_eq!(inv.backing().slot_of(id), Some(0));
        assert_eq!(inv.display().slot_of(id), Some(0));
        assert_eq!(
            inv.drain_events(),
            vec![InventoryEvent::ItemAdded {
                item: id,
                backing: Some(0),
                display: 0
            }]
        );
    }

    #[test]
    fn test_detach_clears_everywhere() {
        let mut inv = inventory(InventoryConfig::new(3, 1));
        let id = inv.attach(tank(50.0), &Placement::anywhere()).unwrap();
        inv.drain_events();

        let item = inv.detach(id).unwrap();
        assert!(item.is_detached());
        assert!(inv.backing().container().slot(0).is_none());
        assert!(inv.display().slot_of(id).is_none());
        assert_eq!(
            inv.drain_events(),
            vec![InventoryEvent::ItemRemoved {
                item: id,
                display: Some(0)
            }]
        );
    }

    #[test]
    fn test_rejection_lists_all_reasons() {
        let mut inv = inventory(InventoryConfig::new(1, 1).with_max_volume(1.5));
        inv.attach(tank(50.0), &Placement::anywhere()).unwrap();

        let err = inv.attach(tank(80.0), &Placement::anywhere()).unwrap_err();
        let reasons = err.reasons();
        assert!(reasons.iter().any(|r| matches!(r, Reason::VolumeExceeded { .. })));
        assert!(reasons.contains(&Reason::NoFreeDisplaySlots));
        assert_eq!(inv.store().len(), 1);
    }

    #[test]
    fn test_self_containment() {
        let mut inv = inventory(InventoryConfig::new(2, 2));
        let bag = tank(50.0).carrying(InventoryId(1));

        let err = inv.attach(bag, &Placement::anywhere()).unwrap_err();
        assert_eq!(err.reasons(), &[Reason::SelfContainment]);
    }

    #[test]
    fn test_exact_display_slot() {
        let mut inv = inventory(InventoryConfig::new(3, 1));
        inv.attach(tank(50.0), &Placement::exactly(2)).unwrap();

        let err = inv.attach(tank(90.0), &Placement::exactly(2)).unwrap_err();
        assert!(matches!(err.reasons(), [Reason::Incompatible { .. }]));

        // A preference falls back instead
        let id = inv.attach(tank(90.0), &Placement::near([2])).unwrap();
        assert_eq!(inv.display().slot_of(id), Some(0));
    }

    #[test]
    fn test_add_copies_reports() {
        let config = InventoryConfig::new(1, 1)
            .with_policy(CompatibilityPolicy::RespectCapacity)
            .with_max_items_per_slot(3);
        let mut inv = inventory(config);

        let report = inv.add_copies(&tank(50.0), 5, &Placement::anywhere());
        assert_eq!(report.added.len(), 3);
        assert_eq!(report.failed, 2);
        assert_eq!(report.kinds(), vec![ReasonKind::Capacity]);
        assert_eq!(report.most_severe(), Some(&Reason::NoFreeDisplaySlots));
    }

    #[test]
    fn test_lock_reserves_display_slot() {
        let mut inv = inventory(InventoryConfig::new(2, 1));
        let id = inv.attach(tank(50.0), &Placement::anywhere()).unwrap();

        assert!(inv.set_item_locked(id, true));
        assert!(inv.display().slot(0).unwrap().is_locked());
        assert!(matches!(inv.detach(id), Err(InventoryError::Locked(_))));

        // Similar items avoid the reserved slot
        let other = inv.attach(tank(50.0), &Placement::anywhere()).unwrap();
        assert_eq!(inv.display().slot_of(other), Some(1));

        inv.set_item_locked(id, false);
        assert!(!inv.display().slot(0).unwrap().is_locked());
    }

    #[test]
    fn test_external_change_updates_display() {
        let mut inv = inventory(InventoryConfig::new(2, 1));
        inv.container_mut().host_store(3, ItemPayload::new("battery"), 2);

        let metadata = MetadataTable::new().with_kind("battery", KindMetadata::new(1.0, 0.5, 3.0));
        let report = inv.on_external_change(&metadata);

        assert_eq!(report.created.len(), 2);
        assert_eq!(inv.display().slot(0).unwrap().len(), 2);
        assert_eq!(inv.plain().used_volume(), 1.0);
    }

    #[test]
    fn test_save_and_restore() {
        let mut inv = inventory(InventoryConfig::new(2, 2));
        let a = inv.attach(tank(50.0), &Placement::exactly(3)).unwrap();
        let b = inv.attach(tank(50.0), &Placement::exactly(3)).unwrap();
        let c = inv.attach(tank(90.0), &Placement::exactly(1)).unwrap();
        let layout = inv.save_layout();

        // Same host contents, fresh inventory
        let mut container = MemoryContainer::new(9).with_stack_limit("tank", 5);
        for (&index, slot) in inv.backing().container().stored_slots() {
            container.host_store(index, slot.payload.clone(), slot.quantity);
        }
        let mut restored = SlottedInventory::new(InventoryId(1), container, &InventoryConfig::new(2, 2));
        restored.restore(&layout, &MetadataTable::new()).unwrap();

        assert_eq!(restored.store().len(), 3);
        assert_eq!(restored.display().slot_of(a), Some(3));
        assert_eq!(restored.display().slot_of(b), Some(3));
        assert_eq!(restored.display().slot_of(c), Some(1));
        assert_eq!(restored.backing().slot_of(a), inv.backing().slot_of(a));
        assert_eq!(restored.backing().slot_of(c), inv.backing().slot_of(c));
        let fuel = restored.store().find(c).unwrap().payload.resource("fuel").unwrap().amount;
        assert_eq!(fuel, 90.0);

        // Fresh ids never collide with restored ones
        assert!(ItemId::next() > c);
    }
}
