//! Inventory registry
//!
//! Owns every slotted inventory of a session and moves items between them.

use crate::container::ExternalContainer;
use crate::error::{InventoryError, InventoryResult};
use crate::inventory::{ItemContainer, Placement, SlottedInventory};
use crate::item::{InventoryId, Item, ItemId};
use crate::lease::LockTable;
use std::collections::BTreeMap;

/// All inventories of a session, keyed by id
pub struct InventoryRegistry<C: ExternalContainer> {
    inventories: BTreeMap<InventoryId, SlottedInventory<C>>,
}

impl<C: ExternalContainer> Default for InventoryRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ExternalContainer> InventoryRegistry<C> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inventories: BTreeMap::new(),
        }
    }

    /// Add an inventory, returning one previously registered under its id
    pub fn register(&mut self, inventory: SlottedInventory<C>) -> Option<SlottedInventory<C>> {
        log::debug!("Registered inventory {}", inventory.id());
        self.inventories.insert(inventory.id(), inventory)
    }

    /// Remove an inventory
    pub fn unregister(&mut self, id: InventoryId) -> Option<SlottedInventory<C>> {
        self.inventories.remove(&id)
    }

    /// Get an inventory
    pub fn get(&self, id: InventoryId) -> Option<&SlottedInventory<C>> {
        self.inventories.get(&id)
    }

    /// Get an inventory mutably
    pub fn get_mut(&mut self, id: InventoryId) -> Option<&mut SlottedInventory<C>> {
        self.inventories.get_mut(&id)
    }

    /// Get an inventory mutably or fail with `UnknownInventory`
    pub fn inventory_mut(&mut self, id: InventoryId) -> InventoryResult<&mut SlottedInventory<C>> {
        self.inventories
            .get_mut(&id)
            .ok_or(InventoryError::UnknownInventory(id))
    }

    /// Registered ids
    pub fn ids(&self) -> impl Iterator<Item = InventoryId> + '_ {
        self.inventories.keys().copied()
    }

    /// Number of inventories
    pub fn len(&self) -> usize {
        self.inventories.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inventories.is_empty()
    }

    /// Inventory holding an item
    pub fn owner_of(&self, id: ItemId) -> Option<InventoryId> {
        self.inventories
            .iter()
            .find(|(_, inventory)| inventory.store().contains(id))
            .map(|(&owner, _)| owner)
    }

    /// Find an item in any inventory
    pub fn find_item(&self, id: ItemId) -> Option<&Item> {
        self.inventories.values().find_map(|inventory| inventory.store().find(id))
    }

    /// Move items into inventory `to`, optionally into one display slot.
    ///
    /// Items may be leased; they arrive unlocked, since the lease that held
    /// them ends with the move. Either every item moves or, on the first
    /// refusal, everything is put back where it was, locks included.
    pub fn transfer(&mut self, items: &[ItemId], to: InventoryId, display: Option<usize>) -> InventoryResult<()> {
        if !self.inventories.contains_key(&to) {
            return Err(InventoryError::UnknownInventory(to));
        }

        let mut sources = Vec::with_capacity(items.len());
        for &id in items {
            let owner = self.owner_of(id).ok_or(InventoryError::NotFound(id))?;
            sources.push((id, owner));
        }
        if self.already_there(&sources, to, display) {
            return Ok(());
        }

        let mut detached: Vec<Origin> = Vec::with_capacity(sources.len());
        for &(id, owner) in &sources {
            let inventory = self.inventory_mut(owner)?;
            let display_slot = inventory.display().slot_of(id);
            let backing_slot = inventory.backing().slot_of(id);
            match inventory.detach_leased(id) {
                Ok(item) => detached.push(Origin {
                    inventory: owner,
                    display: display_slot,
                    backing: backing_slot,
                    item,
                }),
                Err(err) => {
                    self.put_back(detached);
                    return Err(err);
                }
            }
        }

        let placement = match display {
            Some(slot) => Placement::exactly(slot),
            None => Placement::anywhere(),
        };
        let mut moved: Vec<Origin> = Vec::with_capacity(detached.len());
        let mut pending = detached.into_iter();
        while let Some(origin) = pending.next() {
            let mut arriving = origin.item.clone();
            arriving.locked = false;
            let attached = self
                .inventory_mut(to)
                .and_then(|target| target.attach(arriving, &placement));

            if let Err(err) = attached {
                let mut returning = Vec::with_capacity(moved.len() + 1);
                for origin in moved {
                    let id = origin.item.id;
                    match self.inventory_mut(to).and_then(|target| target.detach(id)) {
                        Ok(_) => returning.push(origin),
                        Err(undo) => log::warn!("Could not take back item {}: {}", id, undo),
                    }
                }
                returning.push(origin);
                returning.extend(pending);
                self.put_back(returning);
                log::debug!("Transfer into {} refused: {}", to, err);
                return Err(err);
            }
            moved.push(origin);
        }

        log::debug!("Transferred {} items into {}", items.len(), to);
        Ok(())
    }

    fn already_there(&self, sources: &[(ItemId, InventoryId)], to: InventoryId, display: Option<usize>) -> bool {
        let Some(target) = self.get(to) else {
            return false;
        };
        sources.iter().all(|&(id, owner)| {
            owner == to
                && match display {
                    Some(slot) => target.display().slot_of(id) == Some(slot),
                    None => true,
                }
        })
    }

    /// Return detached items to the slots they came from.
    ///
    /// Items go back unlocked and in their original order so a locked item
    /// cannot reserve its display slot against the rest of its stack; locks
    /// are restored once every item is in place.
    fn put_back(&mut self, items: Vec<Origin>) {
        let mut relock = Vec::new();
        for origin in items {
            let Origin {
                inventory: owner,
                display,
                backing,
                mut item,
            } = origin;
            let id = item.id;
            if item.locked {
                relock.push((owner, id));
            }
            item.locked = false;

            let near = Placement::near(display.into_iter().collect::<Vec<_>>()).with_overflow();
            let original = Placement {
                backing,
                ..near.clone()
            };
            let restored = self.inventory_mut(owner).and_then(|inventory| {
                match inventory.attach(item.clone(), &original) {
                    Err(err) if backing.is_some() => {
                        log::debug!("Backing slot of item {} no longer fits: {}", id, err);
                        inventory.attach(item, &near)
                    }
                    result => result,
                }
            });
            if let Err(err) = restored {
                log::warn!("Could not return item {} to {}: {}", id, owner, err);
            }
        }

        for (owner, id) in relock {
            if let Some(inventory) = self.inventories.get_mut(&owner) {
                inventory.set_item_locked(id, true);
            }
        }
    }
}

/// Where a detached item came from
struct Origin {
    inventory: InventoryId,
    display: Option<usize>,
    backing: Option<usize>,
    item: Item,
}

impl<C: ExternalContainer> LockTable for InventoryRegistry<C> {
    fn contains_item(&self, id: ItemId) -> bool {
        self.owner_of(id).is_some()
    }

    fn is_item_locked(&self, id: ItemId) -> bool {
        self.find_item(id).map_or(false, Item::is_locked)
    }

    fn set_item_locked(&mut self, id: ItemId, locked: bool) -> bool {
        match self.owner_of(id).and_then(|owner| self.inventories.get_mut(&owner)) {
            Some(inventory) => inventory.set_item_locked(id, locked),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InventoryConfig;
    use crate::container::MemoryContainer;
    use crate::item::ItemPayload;

    fn tank(fuel: f64) -> Item {
        Item::new(ItemPayload::new("tank").with_resource("fuel", fuel, 100.0))
    }

    fn registry() -> InventoryRegistry<MemoryContainer> {
        let mut registry = InventoryRegistry::new();
        for id in [1, 2] {
            let container = MemoryContainer::new(4).with_stack_limit("tank", 10);
            registry.register(SlottedInventory::new(
                InventoryId(id),
                container,
                &InventoryConfig::new(2, 1),
            ));
        }
        registry
    }

    fn attach(registry: &mut InventoryRegistry<MemoryContainer>, inv: u32, item: Item) -> ItemId {
        registry
            .inventory_mut(InventoryId(inv))
            .unwrap()
            .attach(item, &Placement::anywhere())
            .unwrap()
    }

    #[test]
    fn test_transfer_moves_items() {
        let mut registry = registry();
        let a = attach(&mut registry, 1, tank(50.0));
        let b = attach(&mut registry, 1, tank(50.0));

        registry.transfer(&[a, b], InventoryId(2), Some(1)).unwrap();

        assert_eq!(registry.owner_of(a), Some(InventoryId(2)));
        let target = registry.get(InventoryId(2)).unwrap();
        assert_eq!(target.display().slot(1).unwrap().items(), &[a, b]);
        assert!(registry.get(InventoryId(1)).unwrap().store().is_empty());
    }

    #[test]
    fn test_transfer_releases_lock() {
        let mut registry = registry();
        let a = attach(&mut registry, 1, tank(50.0));
        let b = attach(&mut registry, 1, tank(50.0));
        registry.set_item_locked(a, true);
        registry.set_item_locked(b, true);

        registry.transfer(&[a, b], InventoryId(2), Some(0)).unwrap();
        assert!(!registry.is_item_locked(a));
        let target = registry.get(InventoryId(2)).unwrap();
        assert_eq!(target.display().slot(0).unwrap().items(), &[a, b]);
        assert!(!target.display().slot(0).unwrap().is_locked());
    }

    #[test]
    fn test_transfer_rolls_back() {
        let mut registry = registry();
        let a = attach(&mut registry, 1, tank(50.0));
        let b = attach(&mut registry, 1, tank(90.0));
        attach(&mut registry, 2, tank(50.0));
        registry.set_item_locked(a, true);

        // b does not stack with the tank already in slot 0 of inventory 2
        let err = registry.transfer(&[a, b], InventoryId(2), Some(0)).unwrap_err();
        assert!(!err.reasons().is_empty());

        let source = registry.get(InventoryId(1)).unwrap();
        assert_eq!(source.store().len(), 2);
        assert!(source.store().is_locked(a));
        assert!(source.display().slot(0).unwrap().is_locked());
        assert_eq!(source.display().slot_of(a), Some(0));
        assert_eq!(source.display().slot_of(b), Some(1));
        assert_eq!(registry.get(InventoryId(2)).unwrap().store().len(), 1);
    }

    #[test]
    fn test_refused_stack_returns_to_its_slots() {
        let mut registry = registry();
        let stack: Vec<_> = (0..3).map(|_| attach(&mut registry, 1, tank(50.0))).collect();
        attach(&mut registry, 2, tank(90.0));
        for &id in &stack {
            registry.set_item_locked(id, true);
        }
        let backing: Vec<_> = stack
            .iter()
            .map(|&id| registry.get(InventoryId(1)).unwrap().backing().slot_of(id))
            .collect();

        assert!(registry.transfer(&stack, InventoryId(2), Some(0)).is_err());

        let source = registry.get(InventoryId(1)).unwrap();
        assert_eq!(source.display().slot(0).unwrap().items(), stack.as_slice());
        assert_eq!(source.display().slot(0).unwrap().reserved_count(), 3);
        for (&id, slot) in stack.iter().zip(backing) {
            assert!(source.store().is_locked(id));
            assert_eq!(source.backing().slot_of(id), slot);
        }
        assert_eq!(registry.get(InventoryId(2)).unwrap().store().len(), 1);
    }

    #[test]
    fn test_transfer_errors() {
        let mut registry = registry();
        let a = attach(&mut registry, 1, tank(50.0));

        assert!(matches!(
            registry.transfer(&[a], InventoryId(9), None),
            Err(InventoryError::UnknownInventory(_))
        ));
        assert!(matches!(
            registry.transfer(&[ItemId::from_raw(u64::MAX)], InventoryId(2), None),
            Err(InventoryError::NotFound(_))
        ));
        assert_eq!(registry.owner_of(a), Some(InventoryId(1)));
    }

    #[test]
    fn test_drop_on_own_slot_is_noop() {
        let mut registry = registry();
        let a = attach(&mut registry, 1, tank(50.0));
        registry.set_item_locked(a, true);

        registry.transfer(&[a], InventoryId(1), Some(0)).unwrap();
        assert_eq!(registry.get(InventoryId(1)).unwrap().display().slot_of(a), Some(0));
    }
}
