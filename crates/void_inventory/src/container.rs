//! External container adapter
//!
//! The host owns a fixed-capacity slot array. The inventory only talks to it
//! through [`ExternalContainer`]; [`MemoryContainer`] is a complete in-memory
//! host used by headless setups and tests.

use crate::item::ItemPayload;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Host container errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// Slot already holds items
    #[error("slot {0} is occupied")]
    Occupied(usize),
    /// Slot has no contents
    #[error("slot {0} is empty")]
    Empty(usize),
    /// Host refuses the index
    #[error("slot {0} is out of range")]
    OutOfRange(usize),
}

/// Contents of one host slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotContents {
    /// What is stored
    pub payload: ItemPayload,
    /// How many
    pub quantity: u32,
    /// Stack ceiling
    pub stack_ceiling: u32,
}

impl SlotContents {
    /// Spare room under the ceiling
    pub fn spare(&self) -> u32 {
        self.stack_ceiling.saturating_sub(self.quantity)
    }
}

/// Change notification callback, receives the slot index
pub type SlotChangeListener = Box<dyn FnMut(usize) + Send>;

/// Host container the backing index mirrors onto
pub trait ExternalContainer {
    /// Nominal slot count
    fn capacity(&self) -> usize;

    /// All non-empty slots
    fn stored_slots(&self) -> &BTreeMap<usize, SlotContents>;

    /// Contents of one slot
    fn slot(&self, index: usize) -> Option<&SlotContents> {
        self.stored_slots().get(&index)
    }

    /// First empty slot below the nominal capacity
    fn first_empty_slot(&self) -> Option<usize>;

    /// Whether the host lets one more item of this kind stack at `index`
    fn can_stack(&self, kind: &str, variant: Option<&str>, index: usize) -> bool;

    /// Stack ceiling the host applies to a new slot holding `payload`
    fn stack_ceiling_for(&self, payload: &ItemPayload) -> u32;

    /// Store a single item in an empty slot
    fn store_at(&mut self, index: usize, payload: &ItemPayload, stack_ceiling: u32) -> Result<(), ContainerError>;

    /// Empty a slot
    fn clear_at(&mut self, index: usize) -> Result<(), ContainerError>;

    /// Change the quantity of a non-empty slot
    fn set_quantity_at(&mut self, index: usize, quantity: u32) -> Result<(), ContainerError>;

    /// Change the stack ceiling of a non-empty slot
    fn set_stack_ceiling_at(&mut self, index: usize, ceiling: u32) -> Result<(), ContainerError>;

    /// Register a slot change listener
    fn on_slot_changed(&mut self, listener: SlotChangeListener);
}

/// In-memory host container
pub struct MemoryContainer {
    capacity: usize,
    slots: BTreeMap<usize, SlotContents>,
    /// Stack ceilings per kind (kinds not listed do not stack)
    stack_limits: HashMap<String, u32>,
    /// Highest index accepted (inclusive of overflow), None = unbounded
    index_limit: Option<usize>,
    listeners: Vec<SlotChangeListener>,
}

impl MemoryContainer {
    /// Create an empty container with `capacity` nominal slots
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: BTreeMap::new(),
            stack_limits: HashMap::new(),
            index_limit: None,
            listeners: Vec::new(),
        }
    }

    /// Set the stack ceiling for a kind
    pub fn with_stack_limit(mut self, kind: impl Into<String>, ceiling: u32) -> Self {
        self.stack_limits.insert(kind.into(), ceiling.max(1));
        self
    }

    /// Refuse indices at or past `limit`
    pub fn with_index_limit(mut self, limit: usize) -> Self {
        self.index_limit = Some(limit);
        self
    }

    fn notify(&mut self, index: usize) {
        for listener in &mut self.listeners {
            listener(index);
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ContainerError> {
        match self.index_limit {
            Some(limit) if index >= limit => Err(ContainerError::OutOfRange(index)),
            _ => Ok(()),
        }
    }

    /// Host-side insert: put `quantity` items in a slot, as the game would
    pub fn host_store(&mut self, index: usize, payload: ItemPayload, quantity: u32) {
        let stack_ceiling = self.stack_ceiling_for(&payload).max(quantity);
        self.slots.insert(
            index,
            SlotContents {
                payload,
                quantity,
                stack_ceiling,
            },
        );
        self.notify(index);
    }

    /// Host-side quantity change
    pub fn host_set_quantity(&mut self, index: usize, quantity: u32) {
        if quantity == 0 {
            self.slots.remove(&index);
        } else if let Some(slot) = self.slots.get_mut(&index) {
            slot.quantity = quantity;
        }
        self.notify(index);
    }
}

impl ExternalContainer for MemoryContainer {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn stored_slots(&self) -> &BTreeMap<usize, SlotContents> {
        &self.slots
    }

    fn first_empty_slot(&self) -> Option<usize> {
        (0..self.capacity).find(|index| !self.slots.contains_key(index))
    }

    fn can_stack(&self, kind: &str, variant: Option<&str>, index: usize) -> bool {
        match self.slots.get(&index) {
            None => true,
            Some(slot) => {
                slot.payload.kind == kind
                    && slot.payload.variant.as_deref() == variant
                    && slot.quantity < slot.stack_ceiling
            }
        }
    }

    fn stack_ceiling_for(&self, payload: &ItemPayload) -> u32 {
        self.stack_limits.get(&payload.kind).copied().unwrap_or(1)
    }

    fn store_at(&mut self, index: usize, payload: &ItemPayload, stack_ceiling: u32) -> Result<(), ContainerError> {
        self.check_index(index)?;
        if self.slots.contains_key(&index) {
            return Err(ContainerError::Occupied(index));
        }
        self.slots.insert(
            index,
            SlotContents {
                payload: payload.clone(),
                quantity: 1,
                stack_ceiling: stack_ceiling.max(1),
            },
        );
        self.notify(index);
        Ok(())
    }

    fn clear_at(&mut self, index: usize) -> Result<(), ContainerError> {
        self.slots.remove(&index).ok_or(ContainerError::Empty(index))?;
        self.notify(index);
        Ok(())
    }

    fn set_quantity_at(&mut self, index: usize, quantity: u32) -> Result<(), ContainerError> {
        let slot = self.slots.get_mut(&index).ok_or(ContainerError::Empty(index))?;
        slot.quantity = quantity;
        self.notify(index);
        Ok(())
    }

    fn set_stack_ceiling_at(&mut self, index: usize, ceiling: u32) -> Result<(), ContainerError> {
        let slot = self.slots.get_mut(&index).ok_or(ContainerError::Empty(index))?;
        slot.stack_ceiling = ceiling;
        self.notify(index);
        Ok(())
    }

    fn on_slot_changed(&mut self, listener: SlotChangeListener) {
        self.listeners.push(listener);
    }
}
