//! Item store
//!
//! The authoritative set of items for one inventory, keyed by id. Mutations
//! record [`StoreEvent`]s that the owning inventory drains and forwards to the
//! backing synchronizer and the display allocator.

use crate::error::{InventoryError, InventoryResult};
use crate::item::{InventoryId, Item, ItemId};
use std::collections::BTreeMap;

/// Store mutation notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// Item attached to the store
    Added(ItemId),
    /// Item removed from the store
    Removed(ItemId),
}

/// Aggregated figures of all stored items
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    /// Total mass
    pub mass: f64,
    /// Total volume
    pub volume: f64,
    /// Total cost
    pub cost: f64,
}

impl Totals {
    fn sum<'a>(items: impl Iterator<Item = &'a Item>) -> Self {
        items.fold(Self::default(), |acc, item| Self {
            mass: acc.mass + item.mass,
            volume: acc.volume + item.volume,
            cost: acc.cost + item.cost,
        })
    }
}

/// Items owned by one inventory
#[derive(Debug)]
pub struct ItemStore {
    owner: InventoryId,
    items: BTreeMap<ItemId, Item>,
    totals: Totals,
    events: Vec<StoreEvent>,
}

impl ItemStore {
    /// Create an empty store for `owner`
    pub fn new(owner: InventoryId) -> Self {
        Self {
            owner,
            items: BTreeMap::new(),
            totals: Totals::default(),
            events: Vec::new(),
        }
    }

    /// Owning inventory id
    pub fn owner(&self) -> InventoryId {
        self.owner
    }

    /// Attach a detached item
    pub fn add(&mut self, mut item: Item) -> InventoryResult<ItemId> {
        if item.owner.is_some() || self.items.contains_key(&item.id) {
            return Err(InventoryError::AlreadyAttached(item.id));
        }

        let id = item.id;
        item.owner = Some(self.owner);
        self.items.insert(id, item);
        self.recount();
        self.events.push(StoreEvent::Added(id));
        Ok(id)
    }

    /// Remove an unlocked item, returning it detached
    pub fn remove(&mut self, id: ItemId) -> InventoryResult<Item> {
        match self.items.get(&id) {
            None => Err(InventoryError::NotFound(id)),
            Some(item) if item.locked => Err(InventoryError::Locked(id)),
            Some(_) => self.take(id),
        }
    }

    /// Remove an item even if a lease holds it. The lock stays set on the
    /// returned item; the lease owner clears it.
    pub fn remove_leased(&mut self, id: ItemId) -> InventoryResult<Item> {
        self.take(id)
    }

    fn take(&mut self, id: ItemId) -> InventoryResult<Item> {
        let mut item = self.items.remove(&id).ok_or(InventoryError::NotFound(id))?;
        item.owner = None;
        self.recount();
        self.events.push(StoreEvent::Removed(id));
        Ok(item)
    }

    /// Find an item
    pub fn find(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Whether the store holds `id`
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Set or clear the lease lock. Returns false if the item is unknown.
    pub fn set_locked(&mut self, id: ItemId, locked: bool) -> bool {
        match self.items.get_mut(&id) {
            Some(item) => {
                item.locked = locked;
                true
            }
            None => false,
        }
    }

    /// Whether the item is locked (unknown items are not)
    pub fn is_locked(&self, id: ItemId) -> bool {
        self.items.get(&id).map(|item| item.locked).unwrap_or(false)
    }

    /// Iterate all items in id order
    pub fn all(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Aggregated mass, volume and cost
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    fn recount(&mut self) {
        self.totals = Totals::sum(self.items.values());
    }
}
