//! Display-slot allocator and grid arranger
//!
//! Display slots group items that look the same to the player. The first
//! `width * height` slots are visible and bound, in row-major order, to the
//! UI cells; slots past the grid are invisible overflow.

use crate::error::{InventoryError, InventoryResult, Reason};
use crate::item::{ItemId, ItemPayload};
use crate::similarity::same_stack;
use crate::store::ItemStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// A group of similar items shown as one stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySlot {
    items: Vec<ItemId>,
    visible: bool,
    /// Items of this slot held by an active lease
    #[serde(skip)]
    reserved: BTreeSet<ItemId>,
}

impl DisplaySlot {
    fn with_visibility(visible: bool) -> Self {
        Self {
            visible,
            ..Self::default()
        }
    }

    /// Items in stack order
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// The item every other item is compared against
    pub fn reference(&self) -> Option<ItemId> {
        self.items.first().copied()
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bound to a UI cell
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// A lease references items of this slot
    pub fn is_locked(&self) -> bool {
        !self.reserved.is_empty()
    }

    /// Number of items held by a lease
    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    /// Whether `id` is in this slot
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains(&id)
    }
}

/// Resizable grid of display slots plus invisible overflow
#[derive(Debug, Clone)]
pub struct DisplayGrid {
    width: usize,
    height: usize,
    max_items_per_slot: usize,
    slots: Vec<DisplaySlot>,
}

impl DisplayGrid {
    /// Create an empty grid
    pub fn new(width: usize, height: usize, max_items_per_slot: usize) -> Self {
        Self {
            width,
            height,
            max_items_per_slot: max_items_per_slot.max(1),
            slots: (0..width * height)
                .map(|_| DisplaySlot::with_visibility(true))
                .collect(),
        }
    }

    /// Grid width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Per-slot item cap
    pub fn max_items_per_slot(&self) -> usize {
        self.max_items_per_slot
    }

    /// Number of visible slots
    pub fn visible_count(&self) -> usize {
        self.width * self.height
    }

    /// All slots, visible first
    pub fn slots(&self) -> &[DisplaySlot] {
        &self.slots
    }

    /// Get a slot
    pub fn slot(&self, index: usize) -> Option<&DisplaySlot> {
        self.slots.get(index)
    }

    /// Invisible overflow slots
    pub fn overflow(&self) -> &[DisplaySlot] {
        &self.slots[self.visible_count().min(self.slots.len())..]
    }

    /// Slot bound to UI cell `(x, y)`
    pub fn cell(&self, x: usize, y: usize) -> Option<&DisplaySlot> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.slots.get(y * self.width + x)
    }

    /// Visible slots with their UI cell index, row-major
    pub fn bindings(&self) -> impl Iterator<Item = (usize, &DisplaySlot)> {
        self.slots.iter().take(self.visible_count()).enumerate()
    }

    /// Display slot of an item
    pub fn slot_of(&self, id: ItemId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.contains(id))
    }

    /// Number of items across all slots
    pub fn item_count(&self) -> usize {
        self.slots.iter().map(DisplaySlot::len).sum()
    }

    /// Check whether `payload` may join slot `index`
    pub fn check_slot(&self, index: usize, payload: &ItemPayload, store: &ItemStore) -> Result<(), Reason> {
        let Some(slot) = self.slots.get(index) else {
            return Err(Reason::NoFreeDisplaySlots);
        };
        if slot.is_locked() {
            return Err(Reason::DisplaySlotLocked { slot: index });
        }
        if slot.len() >= self.max_items_per_slot {
            return Err(Reason::DisplaySlotFull {
                slot: index,
                cap: self.max_items_per_slot,
            });
        }
        match slot.reference().and_then(|id| store.find(id)) {
            Some(reference) if !same_stack(&reference.payload, payload) => Err(Reason::Incompatible {
                item: payload.label(),
                other: reference.payload.label(),
            }),
            _ => Ok(()),
        }
    }

    /// Choose a display slot for `payload`.
    ///
    /// Preference: a listed preferred slot, the first non-empty compatible
    /// slot, the first empty slot, and finally (when `create_overflow`) a new
    /// invisible slot, reported as index `slots().len()`.
    pub fn find_slot_for_item(
        &self,
        payload: &ItemPayload,
        store: &ItemStore,
        preferred: &[usize],
        create_overflow: bool,
    ) -> Option<usize> {
        let fits = |index: usize| self.check_slot(index, payload, store).is_ok();

        if let Some(&index) = preferred.iter().find(|&&index| fits(index)) {
            return Some(index);
        }
        if let Some(index) = (0..self.slots.len()).find(|&index| !self.slots[index].is_empty() && fits(index)) {
            return Some(index);
        }
        if let Some(index) = (0..self.slots.len()).find(|&index| self.slots[index].is_empty() && fits(index)) {
            return Some(index);
        }
        create_overflow.then_some(self.slots.len())
    }

    /// Put an item into slot `index`; `slots().len()` appends an overflow slot
    pub fn place(&mut self, id: ItemId, index: usize, locked: bool) -> InventoryResult<()> {
        if index > self.slots.len() {
            return Err(InventoryError::NoSuchSlot(index));
        }
        if index == self.slots.len() {
            self.slots.push(DisplaySlot::with_visibility(false));
        }
        let slot = &mut self.slots[index];
        slot.items.push(id);
        if locked {
            slot.reserved.insert(id);
        }
        Ok(())
    }

    /// Remove an item from whatever slot holds it
    pub fn remove(&mut self, id: ItemId) -> Option<usize> {
        let index = self.slot_of(id)?;
        let slot = &mut self.slots[index];
        slot.items.retain(|&other| other != id);
        slot.reserved.remove(&id);
        self.prune_overflow();
        Some(index)
    }

    /// Mark an item as held (or released) by a lease
    pub fn set_reserved(&mut self, id: ItemId, reserved: bool) -> bool {
        let Some(index) = self.slot_of(id) else {
            return false;
        };
        let slot = &mut self.slots[index];
        if reserved {
            slot.reserved.insert(id);
        } else {
            slot.reserved.remove(&id);
        }
        true
    }

    /// Up to `count` items of a slot not held by a lease, taken from the top
    /// and returned in stack order
    pub fn pick(&self, index: usize, count: usize) -> Vec<ItemId> {
        let Some(slot) = self.slots.get(index) else {
            return Vec::new();
        };
        let mut picked: Vec<ItemId> = slot
            .items
            .iter()
            .rev()
            .filter(|id| !slot.reserved.contains(id))
            .take(count)
            .copied()
            .collect();
        picked.reverse();
        picked
    }

    /// Swap the contents of two slots; visibility stays with the position
    pub fn swap(&mut self, a: usize, b: usize) -> InventoryResult<()> {
        for index in [a, b] {
            if index >= self.slots.len() {
                return Err(InventoryError::NoSuchSlot(index));
            }
        }
        self.slots.swap(a, b);
        self.refresh_visibility();
        Ok(())
    }

    /// Move unreserved items from `from` into `to` while they stack and the
    /// cap allows. Returns how many moved.
    pub fn merge(&mut self, from: usize, to: usize, store: &ItemStore) -> InventoryResult<usize> {
        for index in [from, to] {
            if index >= self.slots.len() {
                return Err(InventoryError::NoSuchSlot(index));
            }
        }
        if from == to {
            return Ok(0);
        }

        let candidates = self.pick(from, self.slots[from].len());
        let mut moved = 0;
        for id in candidates {
            let Some(item) = store.find(id) else {
                continue;
            };
            if self.check_slot(to, &item.payload, store).is_err() {
                break;
            }
            self.slots[from].items.retain(|&other| other != id);
            self.slots[to].items.push(id);
            moved += 1;
        }
        self.prune_overflow();
        Ok(moved)
    }

    /// Resize the visible grid without losing items.
    ///
    /// Shrinking drops empty cells from the far end of each column (height)
    /// or row (width), shifting the remaining cells toward the origin; cells
    /// that still do not fit move to invisible overflow. Afterwards overflow
    /// slots fill any empty visible cells in row-major order.
    pub fn arrange(&mut self, width: usize, height: usize) {
        let (old_width, old_height) = (self.width, self.height);
        let mut cells = std::mem::take(&mut self.slots);
        let mut pool = cells.split_off((old_width * old_height).min(cells.len()));
        cells.resize_with(old_width * old_height, DisplaySlot::default);

        let mut spilled = Vec::new();

        let mut columns: Vec<Vec<DisplaySlot>> = (0..old_width).map(|_| Vec::with_capacity(old_height)).collect();
        for (i, slot) in cells.into_iter().enumerate() {
            columns[i % old_width].push(slot);
        }
        for column in &mut columns {
            fit_line(column, height, &mut spilled);
        }

        let mut rows: Vec<Vec<DisplaySlot>> = (0..height).map(|_| Vec::with_capacity(old_width)).collect();
        for column in columns {
            for (y, slot) in column.into_iter().enumerate() {
                rows[y].push(slot);
            }
        }
        for row in &mut rows {
            fit_line(row, width, &mut spilled);
        }

        pool.extend(spilled);
        let mut pool: VecDeque<DisplaySlot> = pool
            .into_iter()
            .filter(|slot| !slot.is_empty() || slot.is_locked())
            .collect();

        let mut visible: Vec<DisplaySlot> = rows.into_iter().flatten().collect();
        for cell in &mut visible {
            if cell.is_empty() && !cell.is_locked() {
                if let Some(slot) = pool.pop_front() {
                    *cell = slot;
                }
            }
        }

        log::debug!(
            "Arranged display grid {}x{} -> {}x{} ({} overflow slots)",
            old_width,
            old_height,
            width,
            height,
            pool.len()
        );

        self.width = width;
        self.height = height;
        self.slots = visible;
        self.slots.extend(pool);
        self.refresh_visibility();
    }

    fn refresh_visibility(&mut self) {
        let visible = self.visible_count();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.visible = index < visible;
        }
    }

    /// Drop empty, unreferenced overflow slots
    fn prune_overflow(&mut self) {
        let visible = self.visible_count();
        let mut index = 0;
        self.slots.retain(|slot| {
            let keep = index < visible || !slot.is_empty() || slot.is_locked();
            index += 1;
            keep
        });
    }
}

/// Bring a column or row to `len` cells. Growing appends empty cells;
/// shrinking removes empty cells from the far end first, and moves the
/// far-end cells to `spilled` once no gaps remain.
fn fit_line(line: &mut Vec<DisplaySlot>, len: usize, spilled: &mut Vec<DisplaySlot>) {
    if line.len() <= len {
        line.resize_with(len, DisplaySlot::default);
        return;
    }

    let mut cursor = line.len();
    while line.len() > len && cursor > 0 {
        cursor -= 1;
        if line[cursor].is_empty() && !line[cursor].is_locked() {
            line.remove(cursor);
        }
    }
    if line.len() > len {
        spilled.extend(line.split_off(len));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{InventoryId, Item};

    fn ids(n: u64) -> Vec<ItemId> {
        (1..=n).map(|raw| ItemId::from_raw(1000 + raw)).collect()
    }

    /// Grid with one item per listed cell
    fn grid_with(width: usize, height: usize, cells: &[usize]) -> (DisplayGrid, Vec<ItemId>) {
        let mut grid = DisplayGrid::new(width, height, 10);
        let ids = ids(cells.len() as u64);
        for (&cell, &id) in cells.iter().zip(&ids) {
            grid.place(id, cell, false).unwrap();
        }
        (grid, ids)
    }

    fn tank(store: &mut ItemStore, fuel: f64) -> Item {
        let item = Item::new(ItemPayload::new("tank").with_resource("fuel", fuel, 100.0));
        store.add(item.clone()).unwrap();
        item
    }

    #[test]
    fn test_stacking_scenario() {
        let mut store = ItemStore::new(InventoryId(1));
        let mut grid = DisplayGrid::new(3, 1, 10);

        for (fuel, expected) in [(50.0, 0), (52.0, 0), (80.0, 1)] {
            let item = tank(&mut store, fuel);
            let index = grid.find_slot_for_item(&item.payload, &store, &[], false).unwrap();
            assert_eq!(index, expected);
            grid.place(item.id, index, false).unwrap();
        }

        assert_eq!(grid.slot(0).unwrap().len(), 2);
        assert_eq!(grid.slot(1).unwrap().len(), 1);
    }

    #[test]
    fn test_preferred_and_overflow() {
        let mut store = ItemStore::new(InventoryId(1));
        let mut grid = DisplayGrid::new(2, 1, 1);

        let a = tank(&mut store, 50.0);
        let index = grid.find_slot_for_item(&a.payload, &store, &[1], false).unwrap();
        assert_eq!(index, 1);
        grid.place(a.id, index, false).unwrap();

        // Slot 1 is at the cap; the next tank takes the empty slot 0
        let b = tank(&mut store, 50.0);
        assert_eq!(grid.find_slot_for_item(&b.payload, &store, &[1], false), Some(0));
        grid.place(b.id, 0, false).unwrap();

        let c = tank(&mut store, 50.0);
        assert_eq!(grid.find_slot_for_item(&c.payload, &store, &[], false), None);
        assert_eq!(grid.find_slot_for_item(&c.payload, &store, &[], true), Some(2));
        grid.place(c.id, 2, false).unwrap();
        assert!(!grid.slot(2).unwrap().is_visible());
        assert_eq!(grid.overflow().len(), 1);

        // Removing the overflow item drops its slot
        assert_eq!(grid.remove(c.id), Some(2));
        assert!(grid.overflow().is_empty());
    }

    #[test]
    fn test_locked_slot_refuses_items() {
        let mut store = ItemStore::new(InventoryId(1));
        let mut grid = DisplayGrid::new(2, 1, 10);
        let a = tank(&mut store, 50.0);
        grid.place(a.id, 0, true).unwrap();

        let b = tank(&mut store, 50.0);
        assert_eq!(
            grid.check_slot(0, &b.payload, &store),
            Err(Reason::DisplaySlotLocked { slot: 0 })
        );
        assert_eq!(grid.find_slot_for_item(&b.payload, &store, &[0], false), Some(1));

        grid.set_reserved(a.id, false);
        assert!(grid.check_slot(0, &b.payload, &store).is_ok());
    }

    #[test]
    fn test_shrink_height_shifts_up() {
        // 2x3 grid, column 0 has items at rows 0 and 2, a gap at row 1
        let (mut grid, ids) = grid_with(2, 3, &[0, 4]);
        grid.arrange(2, 2);

        assert_eq!(grid.visible_count(), 4);
        assert_eq!(grid.cell(0, 0).unwrap().items(), &[ids[0]]);
        assert_eq!(grid.cell(0, 1).unwrap().items(), &[ids[1]]);
        assert!(grid.overflow().is_empty());
    }

    #[test]
    fn test_shrink_spills_to_overflow() {
        // Full column 0 of a 1x3 grid shrunk to 1x1
        let (mut grid, ids) = grid_with(1, 3, &[0, 1, 2]);
        grid.arrange(1, 1);

        assert_eq!(grid.cell(0, 0).unwrap().items(), &[ids[0]]);
        let overflow: Vec<_> = grid.overflow().iter().map(|s| s.items()[0]).collect();
        assert_eq!(overflow, vec![ids[1], ids[2]]);
        assert!(grid.overflow().iter().all(|s| !s.is_visible()));
    }

    #[test]
    fn test_shrink_width_shifts_left() {
        // 3x1 row with items at columns 1 and 2
        let (mut grid, ids) = grid_with(3, 1, &[1, 2]);
        grid.arrange(2, 1);

        assert_eq!(grid.cell(0, 0).unwrap().items(), &[ids[0]]);
        assert_eq!(grid.cell(1, 0).unwrap().items(), &[ids[1]]);
    }

    #[test]
    fn test_grow_refills_from_overflow() {
        let (mut grid, ids) = grid_with(1, 3, &[0, 1, 2]);
        grid.arrange(1, 1);
        grid.arrange(2, 2);

        assert_eq!(grid.visible_count(), 4);
        assert!(grid.overflow().is_empty());
        assert_eq!(grid.item_count(), 3);
        for id in ids {
            assert!(grid.slot_of(id).unwrap() < 4);
        }
    }

    #[test]
    fn test_bindings_row_major() {
        let (grid, ids) = grid_with(2, 2, &[3]);
        let bound: Vec<_> = grid.bindings().map(|(cell, slot)| (cell, slot.len())).collect();

        assert_eq!(bound, vec![(0, 0), (1, 0), (2, 0), (3, 1)]);
        assert_eq!(grid.cell(1, 1).unwrap().items(), &[ids[0]]);
        assert!(grid.cell(2, 0).is_none());
    }

    #[test]
    fn test_swap_keeps_visibility() {
        let (mut grid, ids) = grid_with(1, 1, &[0, 1]);
        grid.swap(0, 1).unwrap();

        assert_eq!(grid.slot(0).unwrap().items(), &[ids[1]]);
        assert!(grid.slot(0).unwrap().is_visible());
        assert!(!grid.slot(1).unwrap().is_visible());
        assert!(grid.swap(0, 9).is_err());
    }

    #[test]
    fn test_merge_and_pick() {
        let mut store = ItemStore::new(InventoryId(1));
        let mut grid = DisplayGrid::new(2, 1, 3);
        let a: Vec<_> = (0..2).map(|_| tank(&mut store, 50.0)).collect();
        let b: Vec<_> = (0..2).map(|_| tank(&mut store, 50.0)).collect();
        for item in &a {
            grid.place(item.id, 0, false).unwrap();
        }
        for item in &b {
            grid.place(item.id, 1, false).unwrap();
        }

        assert_eq!(grid.pick(1, 1), vec![b[1].id]);

        // Cap of 3 leaves one item behind
        assert_eq!(grid.merge(1, 0, &store).unwrap(), 1);
        assert_eq!(grid.slot(0).unwrap().len(), 3);
        assert_eq!(grid.slot(1).unwrap().len(), 1);
    }
}
