//! Error types and rejection reasons

use crate::container::ContainerError;
use crate::item::{InventoryId, ItemId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad class of a rejection reason, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReasonKind {
    /// Different kind, variant or resource profile
    Incompatibility,
    /// A slot or the inventory is full
    Capacity,
    /// Self-containment, locked or already attached items
    Consistency,
}

/// An expected, recoverable reason why an item cannot go somewhere.
///
/// Reasons are collected into lists so callers can present all of them at once.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Reason {
    /// Kind, variant or resource set differ
    #[error("{item} cannot stack with {other}")]
    Incompatible { item: String, other: String },
    /// Backing slot has reached its stack ceiling
    #[error("slot {index} is full ({quantity}/{ceiling})")]
    SlotFull {
        index: usize,
        quantity: u32,
        ceiling: u32,
    },
    /// No backing slot available under the current policy
    #[error("no free slots")]
    NoFreeSlots,
    /// Display slot holds the configured maximum of items
    #[error("stack {slot} is full ({cap} items)")]
    DisplaySlotFull { slot: usize, cap: usize },
    /// Display slot is reserved by an active drag
    #[error("stack {slot} is in use")]
    DisplaySlotLocked { slot: usize },
    /// No visible display slot can take the item
    #[error("no free inventory cells")]
    NoFreeDisplaySlots,
    /// Inventory volume limit exceeded
    #[error("not enough volume: need {needed:.1}, {available:.1} available")]
    VolumeExceeded { needed: f64, available: f64 },
    /// Item is locked by an active lease
    #[error("item {0} is in use")]
    Locked(ItemId),
    /// Item already belongs to an inventory
    #[error("item {0} is already stored elsewhere")]
    AlreadyAttached(ItemId),
    /// Container item placed into its own inventory
    #[error("cannot store an item inside itself")]
    SelfContainment,
}

impl Reason {
    /// Get the class of this reason
    pub fn kind(&self) -> ReasonKind {
        match self {
            Self::Incompatible { .. } => ReasonKind::Incompatibility,
            Self::SlotFull { .. }
            | Self::NoFreeSlots
            | Self::DisplaySlotFull { .. }
            | Self::NoFreeDisplaySlots
            | Self::VolumeExceeded { .. } => ReasonKind::Capacity,
            Self::DisplaySlotLocked { .. }
            | Self::Locked(_)
            | Self::AlreadyAttached(_)
            | Self::SelfContainment => ReasonKind::Consistency,
        }
    }
}

/// Pick the most severe reason; the first one wins among equals
pub fn most_severe(reasons: &[Reason]) -> Option<&Reason> {
    reasons.iter().fold(None, |best: Option<&Reason>, reason| match best {
        Some(current) if current.kind() >= reason.kind() => Some(current),
        _ => Some(reason),
    })
}

/// De-duplicated reason classes in order of first appearance
pub fn summarize(reasons: &[Reason]) -> Vec<ReasonKind> {
    let mut kinds = Vec::new();
    for reason in reasons {
        let kind = reason.kind();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

/// Error taxonomy used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Not stackable together
    Incompatibility,
    /// Slot or inventory full
    Capacity,
    /// Invariant would be broken
    Consistency,
    /// A drag is already in progress
    LeaseInProgress,
    /// Unknown item or inventory
    NotFound,
    /// Host container or storage failure
    External,
}

impl From<ReasonKind> for ErrorClass {
    fn from(kind: ReasonKind) -> Self {
        match kind {
            ReasonKind::Incompatibility => Self::Incompatibility,
            ReasonKind::Capacity => Self::Capacity,
            ReasonKind::Consistency => Self::Consistency,
        }
    }
}

/// Inventory errors
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Item id not present
    #[error("Item not found: {0}")]
    NotFound(ItemId),
    /// Item is locked by a lease
    #[error("Item is locked: {0}")]
    Locked(ItemId),
    /// Item already owned by an inventory
    #[error("Item already attached: {0}")]
    AlreadyAttached(ItemId),
    /// Inventory id not registered
    #[error("Unknown inventory: {0}")]
    UnknownInventory(InventoryId),
    /// Display slot index out of range
    #[error("Display slot out of range: {0}")]
    NoSuchSlot(usize),
    /// A lease is already active
    #[error("A drag lease is already in progress")]
    LeaseInProgress,
    /// No lease to consume
    #[error("No drag lease is active")]
    NoActiveLease,
    /// The operation was refused for the listed reasons
    #[error("Rejected: {}", describe(.0))]
    Rejected(Vec<Reason>),
    /// Host container failure
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    /// Save data failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::persistence::PersistenceError),
}

fn describe(reasons: &[Reason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl InventoryError {
    /// Classify this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) | Self::UnknownInventory(_) | Self::NoSuchSlot(_) => {
                ErrorClass::NotFound
            }
            Self::Locked(_) | Self::AlreadyAttached(_) => ErrorClass::Consistency,
            Self::LeaseInProgress | Self::NoActiveLease => ErrorClass::LeaseInProgress,
            Self::Rejected(reasons) => most_severe(reasons)
                .map(|reason| reason.kind().into())
                .unwrap_or(ErrorClass::Consistency),
            Self::Container(_) | Self::Persistence(_) => ErrorClass::External,
        }
    }

    /// Reasons carried by a rejection (empty for other errors)
    pub fn reasons(&self) -> &[Reason] {
        match self {
            Self::Rejected(reasons) => reasons,
            _ => &[],
        }
    }
}

impl From<Reason> for InventoryError {
    fn from(reason: Reason) -> Self {
        Self::Rejected(vec![reason])
    }
}

/// Result type alias
pub type InventoryResult<T> = Result<T, InventoryError>;
