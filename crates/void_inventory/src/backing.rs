//! Backing-index synchronizer
//!
//! Mirrors the item store onto the host container's slot array. Every item
//! lives in exactly one backing slot; a slot only holds items with identical
//! payloads (kind, variant and resource amounts), since the host keeps one
//! payload per slot and items are rebuilt from it on load. Changes made by the host itself reach the synchronizer through a
//! listener registered on the container and are folded back into the store by
//! [`BackingSync::reconcile`].

use crate::config::CompatibilityPolicy;
use crate::container::{ExternalContainer, SlotContents};
use crate::error::{InventoryError, InventoryResult, Reason};
use crate::item::{Item, ItemId, ItemPayload};
use crate::metadata::ItemMetadata;
use crate::store::{ItemStore, StoreEvent};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Notifications for layers above the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingEvent {
    /// A relaxed stack ceiling was restored; slot layout is final again
    LayoutStabilized(usize),
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Items created to match the host
    pub created: Vec<ItemId>,
    /// Items destroyed to match the host
    pub destroyed: Vec<ItemId>,
    /// Items the host dropped that are held by a lease
    pub skipped_locked: Vec<ItemId>,
}

impl ReconcileReport {
    /// Whether anything changed
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty() && self.skipped_locked.is_empty()
    }
}

/// State shared with the container listener
#[derive(Default)]
struct SyncShared {
    /// Set while the synchronizer itself mutates the container
    applying: AtomicBool,
    /// Slots changed by the host since the last reconcile
    pending: Mutex<Vec<usize>>,
}

impl SyncShared {
    fn record(&self, index: usize) {
        if self.applying.load(Ordering::Acquire) {
            return;
        }
        let mut pending = self.pending.lock();
        if !pending.contains(&index) {
            pending.push(index);
        }
    }
}

/// Re-entrancy guard, cleared on drop
struct Applying<'a>(&'a AtomicBool);

impl<'a> Applying<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for Applying<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the host container consistent with an item store
pub struct BackingSync<C: ExternalContainer> {
    container: C,
    policy: CompatibilityPolicy,
    /// Backing slot -> items, in insertion order
    index: BTreeMap<usize, Vec<ItemId>>,
    /// Original ceilings of slots widened by relaxation
    relaxed: HashMap<usize, u32>,
    /// Slots chosen for items about to be added to the store
    planned: HashMap<ItemId, usize>,
    shared: Arc<SyncShared>,
    events: Vec<BackingEvent>,
}

impl<C: ExternalContainer> BackingSync<C> {
    /// Wrap a container and start listening for host changes
    pub fn new(mut container: C, policy: CompatibilityPolicy) -> Self {
        let shared = Arc::new(SyncShared::default());
        let listener = Arc::clone(&shared);
        container.on_slot_changed(Box::new(move |index| listener.record(index)));

        Self {
            container,
            policy,
            index: BTreeMap::new(),
            relaxed: HashMap::new(),
            planned: HashMap::new(),
            shared,
            events: Vec::new(),
        }
    }

    /// The host container
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Host-side access. Mutations made here count as external changes.
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// Compatibility policy
    pub fn policy(&self) -> CompatibilityPolicy {
        self.policy
    }

    /// Backing slot of an item
    pub fn slot_of(&self, id: ItemId) -> Option<usize> {
        self.index
            .iter()
            .find(|(_, items)| items.contains(&id))
            .map(|(&index, _)| index)
    }

    /// Items indexed in a backing slot
    pub fn items_in(&self, index: usize) -> &[ItemId] {
        self.index.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All non-empty indexed slots
    pub fn indexed_slots(&self) -> impl Iterator<Item = (usize, &[ItemId])> {
        self.index.iter().map(|(&index, items)| (index, items.as_slice()))
    }

    /// Whether host changes are waiting for [`reconcile`](Self::reconcile)
    pub fn has_pending(&self) -> bool {
        !self.shared.pending.lock().is_empty()
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<BackingEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pick a backing slot for `payload`.
    ///
    /// With an explicit index only that slot is validated. Otherwise the first
    /// slot holding an identical payload with room wins, then the first empty slot, then (under
    /// the custom policy) the first unused index past the host's slot count.
    pub fn find_slot_for_item(&self, payload: &ItemPayload, explicit: Option<usize>) -> Result<usize, Reason> {
        if let Some(index) = explicit {
            return self.validate_slot(payload, index).map(|_| index);
        }

        let variant = payload.variant.as_deref();
        let stackable = self.container.stored_slots().iter().find(|&(&index, slot)| {
            slot.payload == *payload
                && slot.quantity < slot.stack_ceiling
                && self.container.can_stack(&payload.kind, variant, index)
        });
        if let Some((&index, _)) = stackable {
            return Ok(index);
        }

        if let Some(index) = self.container.first_empty_slot() {
            return Ok(index);
        }

        if !self.policy.allows_overflow() {
            return Err(Reason::NoFreeSlots);
        }

        let stored = self.container.stored_slots();
        (self.container.capacity()..)
            .find(|index| !stored.contains_key(index) && !self.index.contains_key(index))
            .ok_or(Reason::NoFreeSlots)
    }

    fn validate_slot(&self, payload: &ItemPayload, index: usize) -> Result<(), Reason> {
        if index >= self.container.capacity() && !self.policy.allows_overflow() {
            return Err(Reason::NoFreeSlots);
        }

        match self.container.slot(index) {
            None => Ok(()),
            Some(slot) if slot.payload != *payload => Err(Reason::Incompatible {
                item: payload.label(),
                other: slot.payload.label(),
            }),
            Some(slot) if slot.quantity >= slot.stack_ceiling && !self.policy.allows_relaxation() => {
                Err(Reason::SlotFull {
                    index,
                    quantity: slot.quantity,
                    ceiling: slot.stack_ceiling,
                })
            }
            Some(_) => Ok(()),
        }
    }

    /// Choose the slot for an item that is about to be added to the store.
    /// The choice is committed when the store's `Added` notification arrives.
    pub fn plan(&mut self, id: ItemId, payload: &ItemPayload, explicit: Option<usize>) -> Result<usize, Reason> {
        let index = self.find_slot_for_item(payload, explicit)?;
        self.planned.insert(id, index);
        Ok(index)
    }

    /// Drop a planned slot for an item that was not added after all
    pub fn cancel_plan(&mut self, id: ItemId) {
        self.planned.remove(&id);
    }

    /// React to an item store notification
    pub fn on_store_event(&mut self, store: &ItemStore, event: StoreEvent) -> InventoryResult<()> {
        match event {
            StoreEvent::Added(id) => {
                if self.slot_of(id).is_some() {
                    self.planned.remove(&id);
                    return Ok(());
                }
                let item = store.find(id).ok_or(InventoryError::NotFound(id))?;
                let index = match self.planned.remove(&id) {
                    Some(index) => index,
                    None => self.find_slot_for_item(&item.payload, None)?,
                };
                self.insert_at(id, &item.payload, index)
            }
            StoreEvent::Removed(id) => {
                self.planned.remove(&id);
                match self.slot_of(id) {
                    Some(index) => self.remove_from(id, index),
                    None => Ok(()),
                }
            }
        }
    }

    fn insert_at(&mut self, id: ItemId, payload: &ItemPayload, index: usize) -> InventoryResult<()> {
        let shared = Arc::clone(&self.shared);
        let _applying = Applying::enter(&shared.applying);

        match self.container.slot(index).map(|slot| (slot.quantity, slot.stack_ceiling)) {
            None => {
                let ceiling = self.container.stack_ceiling_for(payload);
                self.container.store_at(index, payload, ceiling)?;
            }
            Some((quantity, ceiling)) if quantity >= ceiling => {
                self.relaxed_insert(index, quantity, ceiling)?;
            }
            Some((quantity, _)) => {
                self.container.set_quantity_at(index, quantity + 1)?;
            }
        }

        self.index.entry(index).or_default().push(id);
        log::trace!("Backed item {} in slot {}", id, index);
        Ok(())
    }

    /// Insert into a full slot by widening its ceiling for the duration of
    /// the insert, then settling it at `max(original, final quantity)`
    fn relaxed_insert(&mut self, index: usize, quantity: u32, ceiling: u32) -> InventoryResult<()> {
        if !self.policy.allows_relaxation() {
            return Err(Reason::SlotFull {
                index,
                quantity,
                ceiling,
            }
            .into());
        }

        let original = *self.relaxed.entry(index).or_insert(ceiling);
        self.container.set_stack_ceiling_at(index, quantity + 1)?;
        let inserted = self.container.set_quantity_at(index, quantity + 1);

        let settled = self.container.slot(index).map_or(quantity, |slot| slot.quantity);
        self.container.set_stack_ceiling_at(index, original.max(settled))?;
        if settled <= original {
            self.relaxed.remove(&index);
        }
        self.events.push(BackingEvent::LayoutStabilized(index));
        log::debug!(
            "Relaxed slot {} ceiling {} -> {} for insert",
            index,
            original,
            original.max(settled)
        );

        inserted.map_err(Into::into)
    }

    fn remove_from(&mut self, id: ItemId, index: usize) -> InventoryResult<()> {
        self.unindex(id, index);

        let shared = Arc::clone(&self.shared);
        let _applying = Applying::enter(&shared.applying);

        let Some(quantity) = self.container.slot(index).map(|slot| slot.quantity) else {
            return Ok(());
        };
        let remaining = quantity.saturating_sub(1);
        if remaining == 0 {
            self.relaxed.remove(&index);
            self.container.clear_at(index)?;
            return Ok(());
        }

        self.container.set_quantity_at(index, remaining)?;
        if let Some(&original) = self.relaxed.get(&index) {
            self.container.set_stack_ceiling_at(index, original.max(remaining))?;
            if remaining <= original {
                self.relaxed.remove(&index);
            }
            self.events.push(BackingEvent::LayoutStabilized(index));
        }
        Ok(())
    }

    fn unindex(&mut self, id: ItemId, index: usize) {
        if let Some(items) = self.index.get_mut(&index) {
            items.retain(|&other| other != id);
            if items.is_empty() {
                self.index.remove(&index);
            }
        }
    }

    /// Record an item as already present in a host slot (used on load)
    pub fn adopt(&mut self, index: usize, id: ItemId) {
        self.index.entry(index).or_default().push(id);
    }

    /// Fold host-originated slot changes back into the store.
    ///
    /// For each changed slot the host quantity is compared with the number of
    /// indexed items; missing items are created from the slot payload and
    /// surplus items destroyed (never locked ones).
    pub fn reconcile(&mut self, store: &mut ItemStore, metadata: &dyn ItemMetadata) -> ReconcileReport {
        let mut pending = std::mem::take(&mut *self.shared.pending.lock());
        pending.sort_unstable();

        let mut report = ReconcileReport::default();
        for index in pending {
            self.reconcile_slot(store, metadata, index, &mut report);
        }
        if !report.is_empty() {
            log::debug!(
                "Reconciled host changes: {} created, {} destroyed, {} locked",
                report.created.len(),
                report.destroyed.len(),
                report.skipped_locked.len()
            );
        }
        report
    }

    fn reconcile_slot(
        &mut self,
        store: &mut ItemStore,
        metadata: &dyn ItemMetadata,
        index: usize,
        report: &mut ReconcileReport,
    ) {
        let external: Option<SlotContents> = self.container.slot(index).cloned();
        let target = external.as_ref().map_or(0, |slot| slot.quantity as usize);

        // A different payload in the slot replaces everything indexed there
        let swapped = match (&external, self.items_in(index).first()) {
            (Some(slot), Some(&first)) => store
                .find(first)
                .map_or(true, |item| item.payload != slot.payload),
            _ => false,
        };

        let indexed = self.items_in(index).to_vec();
        let surplus = if swapped {
            indexed.len()
        } else {
            indexed.len().saturating_sub(target)
        };
        let mut destroyed = 0;
        for &id in indexed.iter().rev() {
            if destroyed == surplus {
                break;
            }
            if store.is_locked(id) {
                log::warn!("Host dropped item {} from slot {} while it is leased", id, index);
                report.skipped_locked.push(id);
                continue;
            }
            self.unindex(id, index);
            match store.remove(id) {
                Ok(_) => report.destroyed.push(id),
                Err(err) => log::warn!("Failed to drop item {} for slot {}: {}", id, index, err),
            }
            destroyed += 1;
        }

        let Some(slot) = external else {
            return;
        };
        let present = self.items_in(index).len();
        for _ in present..target {
            let item = Item::from_metadata(slot.payload.clone(), metadata);
            let id = item.id;
            self.adopt(index, id);
            match store.add(item) {
                Ok(_) => report.created.push(id),
                Err(err) => {
                    self.unindex(id, index);
                    log::warn!("Failed to create item for slot {}: {}", index, err);
                }
            }
        }
    }
}
