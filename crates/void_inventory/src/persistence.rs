//! Saved layouts
//!
//! A layout records which item ids sit in which backing slot and which
//! display slot. Item contents are not saved; on load they are rebuilt from
//! the host container's own state and the ids are matched back per slot.

use crate::item::ItemId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Current layout format version
pub const LAYOUT_VERSION: u32 = 1;

/// Layout save errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Binary encoding or decoding failed
    #[error("Binary error: {0}")]
    Binary(#[from] bincode::Error),
    /// Saved with an unknown format version
    #[error("Version mismatch: layout version {0}, current version {1}")]
    VersionMismatch(u32, u32),
}

/// One `(slot index, item id)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBinding {
    /// Slot index
    pub slot: usize,
    /// Item in that slot
    pub item: ItemId,
}

impl SlotBinding {
    /// Create a binding
    pub fn new(slot: usize, item: ItemId) -> Self {
        Self { slot, item }
    }
}

/// Saved backing and display indices of one inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLayout {
    /// Format version
    pub version: u32,
    /// Visible grid width
    pub width: usize,
    /// Visible grid height
    pub height: usize,
    /// Backing slot of every item, in stack order
    pub backing: Vec<SlotBinding>,
    /// Display slot of every item, in stack order
    pub display: Vec<SlotBinding>,
}

impl SavedLayout {
    /// Create an empty layout for a grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            version: LAYOUT_VERSION,
            width,
            height,
            backing: Vec::new(),
            display: Vec::new(),
        }
    }

    /// Saved ids of one backing slot, in order
    pub fn backing_ids(&self, slot: usize) -> impl Iterator<Item = ItemId> + '_ {
        self.backing
            .iter()
            .filter(move |binding| binding.slot == slot)
            .map(|binding| binding.item)
    }
}

/// Layout file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveFormat {
    /// JSON (human readable)
    Json,
    /// Binary (compact)
    Binary,
}

impl Default for SaveFormat {
    fn default() -> Self {
        Self::Binary
    }
}

impl SaveFormat {
    /// Encode a layout
    pub fn encode(&self, layout: &SavedLayout) -> Result<Vec<u8>, PersistenceError> {
        Ok(match self {
            Self::Json => serde_json::to_vec_pretty(layout)?,
            Self::Binary => bincode::serialize(layout)?,
        })
    }

    /// Decode a layout, rejecting unknown versions
    pub fn decode(&self, bytes: &[u8]) -> Result<SavedLayout, PersistenceError> {
        let layout: SavedLayout = match self {
            Self::Json => serde_json::from_slice(bytes)?,
            Self::Binary => bincode::deserialize(bytes)?,
        };
        if layout.version != LAYOUT_VERSION {
            return Err(PersistenceError::VersionMismatch(layout.version, LAYOUT_VERSION));
        }
        Ok(layout)
    }

    /// Write a layout to a file
    pub fn write(&self, path: impl AsRef<Path>, layout: &SavedLayout) -> Result<(), PersistenceError> {
        let bytes = self.encode(layout)?;
        fs::write(path.as_ref(), bytes)?;
        log::info!("Saved inventory layout to {}", path.as_ref().display());
        Ok(())
    }

    /// Read a layout from a file
    pub fn read(&self, path: impl AsRef<Path>) -> Result<SavedLayout, PersistenceError> {
        let bytes = fs::read(path.as_ref())?;
        self.decode(&bytes)
    }
}
