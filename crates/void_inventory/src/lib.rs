//! Void Inventory - Slotted inventory over a host container
//!
//! This crate keeps a player-facing inventory consistent with a fixed-capacity
//! slot container owned by the host game.
//!
//! # Features
//!
//! - Item store with exact mass, volume and cost totals
//! - Fuzzy stacking of items by kind and resource fill bucket
//! - Backing index mirrored onto the host container, with scoped stack
//!   ceiling relaxation and reconciliation of host-side changes
//! - Resizable display grid with invisible overflow
//! - Drag leases that lock items while they are in flight
//! - Input-driven interaction controller
//! - JSON and binary layout saves
//!
//! # Example
//!
//! ```ignore
//! use void_inventory::prelude::*;
//!
//! let container = MemoryContainer::new(9).with_stack_limit("tank", 5);
//! let config = InventoryConfig::new(3, 3).with_policy(CompatibilityPolicy::RelaxCapacity);
//! let mut inventory = SlottedInventory::new(InventoryId(1), container, &config);
//!
//! let tank = Item::new(ItemPayload::new("tank").with_resource("fuel", 50.0, 100.0));
//! inventory.attach(tank, &Placement::anywhere())?;
//! ```

pub mod backing;
pub mod config;
pub mod container;
pub mod controller;
pub mod display;
pub mod error;
pub mod inventory;
pub mod item;
pub mod lease;
pub mod metadata;
pub mod persistence;
pub mod registry;
pub mod similarity;
pub mod store;

pub mod prelude {
    pub use crate::backing::{BackingEvent, BackingSync, ReconcileReport};
    pub use crate::config::{CompatibilityPolicy, InventoryConfig};
    pub use crate::container::{ContainerError, ExternalContainer, MemoryContainer, SlotContents};
    pub use crate::controller::{
        Feedback, InteractionState, InventoryController, InventoryInput, Modifier, MouseButton, SlotRef,
    };
    pub use crate::display::{DisplayGrid, DisplaySlot};
    pub use crate::error::{ErrorClass, InventoryError, InventoryResult, Reason, ReasonKind};
    pub use crate::inventory::{
        BulkReport, InventoryEvent, ItemContainer, Placement, PlainInventory, SlottedInventory,
    };
    pub use crate::item::{InventoryId, Item, ItemId, ItemPayload, ResourceAmount};
    pub use crate::lease::{DragLease, LeaseManager, LeasePayload, LeaseState, LockTable};
    pub use crate::metadata::{IconHandle, ItemMetadata, KindMetadata, MetadataTable};
    pub use crate::persistence::{SaveFormat, SavedLayout, SlotBinding};
    pub use crate::registry::InventoryRegistry;
    pub use crate::similarity::{bucket, same_kind, same_stack};
    pub use crate::store::{ItemStore, StoreEvent, Totals};
}

pub use prelude::*;
