//! Drag leases
//!
//! A lease holds items "in flight" during a drag. Leased items are locked so
//! nothing else can move or destroy them; the lease ends either by consuming
//! it (the drop succeeded) or by cancelling it. Both paths unlock every item.

use crate::error::{InventoryError, InventoryResult};
use crate::item::{InventoryId, ItemId};
use crate::metadata::IconHandle;

/// Somewhere items can be looked up and locked
pub trait LockTable {
    /// Whether the item exists here
    fn contains_item(&self, id: ItemId) -> bool;

    /// Whether the item is locked
    fn is_item_locked(&self, id: ItemId) -> bool;

    /// Lock or unlock an item. Returns false if the item is unknown.
    fn set_item_locked(&mut self, id: ItemId, locked: bool) -> bool;
}

/// Lease manager state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaseState {
    /// No drag in progress
    Idle,
    /// Items are held by a lease
    Leased,
}

/// How the last lease ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaseOutcome {
    /// The drop succeeded
    Consumed,
    /// The drag was abandoned
    Cancelled,
}

/// What the drag cursor shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeasePayload {
    /// Icon of the dragged stack
    pub icon: Option<IconHandle>,
    /// Short description ("3x tank")
    pub summary: String,
    /// Inventory the items came from
    pub source: Option<InventoryId>,
}

/// Runs when the lease is consumed. An error keeps the lease active.
pub type ConsumeCallback<C> = Box<dyn FnMut(&mut C, &[ItemId]) -> InventoryResult<()>>;

/// Runs when the lease is cancelled
pub type CancelCallback<C> = Box<dyn FnMut(&mut C, &[ItemId])>;

/// An active drag
pub struct DragLease<C> {
    items: Vec<ItemId>,
    payload: LeasePayload,
    on_consume: ConsumeCallback<C>,
    on_cancel: CancelCallback<C>,
}

impl<C> DragLease<C> {
    /// Create a lease record
    pub fn new<F, G>(items: Vec<ItemId>, payload: LeasePayload, on_consume: F, on_cancel: G) -> Self
    where
        F: FnMut(&mut C, &[ItemId]) -> InventoryResult<()> + 'static,
        G: FnMut(&mut C, &[ItemId]) + 'static,
    {
        let mut unique = Vec::with_capacity(items.len());
        for id in items {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self {
            items: unique,
            payload,
            on_consume: Box::new(on_consume),
            on_cancel: Box::new(on_cancel),
        }
    }

    /// Items in flight
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Cursor payload
    pub fn payload(&self) -> &LeasePayload {
        &self.payload
    }
}

/// Owns at most one active lease for an interaction context
pub struct LeaseManager<C> {
    active: Option<DragLease<C>>,
    last_outcome: Option<LeaseOutcome>,
}

impl<C> Default for LeaseManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> LeaseManager<C> {
    /// Create an idle manager
    pub fn new() -> Self {
        Self {
            active: None,
            last_outcome: None,
        }
    }

    /// Current state
    pub fn state(&self) -> LeaseState {
        if self.active.is_some() {
            LeaseState::Leased
        } else {
            LeaseState::Idle
        }
    }

    /// Whether a lease is active
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Active lease
    pub fn active(&self) -> Option<&DragLease<C>> {
        self.active.as_ref()
    }

    /// Items of the active lease
    pub fn items(&self) -> &[ItemId] {
        self.active.as_ref().map_or(&[], |lease| lease.items())
    }

    /// How the previous lease ended
    pub fn last_outcome(&self) -> Option<LeaseOutcome> {
        self.last_outcome
    }
}

impl<C: LockTable> LeaseManager<C> {
    /// Start a lease, locking every item.
    ///
    /// Fails without touching anything if a lease is active or any item is
    /// unknown or already locked.
    pub fn lease(&mut self, context: &mut C, lease: DragLease<C>) -> InventoryResult<()> {
        if self.active.is_some() {
            return Err(InventoryError::LeaseInProgress);
        }
        for &id in lease.items() {
            if !context.contains_item(id) {
                return Err(InventoryError::NotFound(id));
            }
            if context.is_item_locked(id) {
                return Err(InventoryError::Locked(id));
            }
        }

        for &id in lease.items() {
            context.set_item_locked(id, true);
        }
        log::debug!("Leased {} items ({})", lease.items().len(), lease.payload().summary);
        self.active = Some(lease);
        Ok(())
    }

    /// Run the consume callback. On success the items are unlocked and the
    /// manager returns to idle; on failure the lease stays as it was.
    pub fn consume(&mut self, context: &mut C) -> InventoryResult<()> {
        let lease = self.active.as_mut().ok_or(InventoryError::NoActiveLease)?;
        if let Err(err) = (lease.on_consume)(context, &lease.items) {
            log::debug!("Drop refused: {}", err);
            return Err(err);
        }

        if let Some(lease) = self.active.take() {
            release(context, &lease.items);
        }
        self.last_outcome = Some(LeaseOutcome::Consumed);
        Ok(())
    }

    /// Abandon the active lease. Returns whether there was one.
    pub fn cancel(&mut self, context: &mut C) -> bool {
        let Some(mut lease) = self.active.take() else {
            return false;
        };
        (lease.on_cancel)(context, &lease.items);
        release(context, &lease.items);
        self.last_outcome = Some(LeaseOutcome::Cancelled);
        log::debug!("Cancelled lease of {} items", lease.items.len());
        true
    }

    /// Replace the active lease with one covering its items plus `extra`.
    ///
    /// New items are checked first, so a failure leaves the current lease in
    /// place.
    pub fn extend(&mut self, context: &mut C, extra: &[ItemId], mut lease: DragLease<C>) -> InventoryResult<()> {
        let current = self.items().to_vec();
        for &id in extra.iter().chain(lease.items.iter()).filter(|id| !current.contains(id)) {
            if !context.contains_item(id) {
                return Err(InventoryError::NotFound(id));
            }
            if context.is_item_locked(id) {
                return Err(InventoryError::Locked(id));
            }
        }

        let mut items = current;
        for &id in extra.iter().chain(lease.items.iter()) {
            if !items.contains(&id) {
                items.push(id);
            }
        }
        lease.items = items;

        self.cancel(context);
        self.lease(context, lease)
    }
}

fn release<C: LockTable>(context: &mut C, items: &[ItemId]) {
    for &id in items {
        if !context.set_item_locked(id, false) {
            log::trace!("Leased item {} no longer exists", id);
        }
    }
}
