//! Items, item ids and payloads

use crate::metadata::ItemMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Globally unique item identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    /// Wrap a raw id (persistence, tests)
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Allocate a fresh id from the process-wide generator
    pub fn next() -> Self {
        ITEM_IDS.next()
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Thread-safe item id generator
pub struct ItemIdGenerator {
    next: AtomicU64,
}

impl ItemIdGenerator {
    /// Create a new generator; ids start at 1
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Generate the next unique id
    pub fn next(&self) -> ItemId {
        ItemId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Make sure ids handed out later are greater than `id`
    pub fn reserve_through(&self, id: ItemId) {
        self.next.fetch_max(id.0.saturating_add(1), Ordering::Relaxed);
    }
}

impl Default for ItemIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

static ITEM_IDS: ItemIdGenerator = ItemIdGenerator::new();

/// Bump the global generator past a restored id
pub fn reserve_item_id(id: ItemId) {
    ITEM_IDS.reserve_through(id);
}

/// Identifies one inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryId(pub u32);

impl fmt::Display for InventoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inv{}", self.0)
    }
}

/// A resource carried by an item (fuel, charge, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAmount {
    /// Resource name
    pub name: String,
    /// Current amount
    pub amount: f64,
    /// Capacity
    pub max_amount: f64,
}

impl ResourceAmount {
    /// Create a resource entry
    pub fn new(name: impl Into<String>, amount: f64, max_amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            max_amount,
        }
    }

    /// Create a full resource entry
    pub fn full(name: impl Into<String>, max_amount: f64) -> Self {
        Self::new(name, max_amount, max_amount)
    }

    /// Fill fraction in [0, 1]; resources without capacity count as empty
    pub fn fraction(&self) -> f64 {
        if self.max_amount <= 0.0 {
            return 0.0;
        }
        (self.amount / self.max_amount).clamp(0.0, 1.0)
    }
}

/// What an item is, as stored by the host container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    /// Part/kind identity
    pub kind: String,
    /// Optional variant tag
    pub variant: Option<String>,
    /// Resources carried
    pub resources: Vec<ResourceAmount>,
}

impl ItemPayload {
    /// Create a payload without variant or resources
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            variant: None,
            resources: Vec::new(),
        }
    }

    /// Set variant
    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Add a resource
    pub fn with_resource(mut self, name: impl Into<String>, amount: f64, max_amount: f64) -> Self {
        self.resources.push(ResourceAmount::new(name, amount, max_amount));
        self
    }

    /// Get a resource by name
    pub fn resource(&self, name: &str) -> Option<&ResourceAmount> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Short label for messages
    pub fn label(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{} ({})", self.kind, variant),
            None => self.kind.clone(),
        }
    }
}

/// A single item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique id
    pub id: ItemId,
    /// Kind, variant and resources
    pub payload: ItemPayload,
    /// Mass (from metadata)
    pub mass: f64,
    /// Volume (from metadata)
    pub volume: f64,
    /// Cost (from metadata)
    pub cost: f64,
    /// Inventory carried by this item, if it is itself a container
    pub carries: Option<InventoryId>,
    /// Held by an active lease
    #[serde(skip)]
    pub(crate) locked: bool,
    /// Owning inventory (None = detached)
    #[serde(skip)]
    pub(crate) owner: Option<InventoryId>,
}

impl Item {
    /// Create a detached item with a fresh id and zero mass/volume/cost
    pub fn new(payload: ItemPayload) -> Self {
        Self::with_id(ItemId::next(), payload)
    }

    /// Create a detached item with a known id
    pub fn with_id(id: ItemId, payload: ItemPayload) -> Self {
        Self {
            id,
            payload,
            mass: 0.0,
            volume: 0.0,
            cost: 0.0,
            carries: None,
            locked: false,
            owner: None,
        }
    }

    /// Create a detached item with figures from the metadata provider
    pub fn from_metadata(payload: ItemPayload, metadata: &dyn ItemMetadata) -> Self {
        let mut item = Self::new(payload);
        item.refresh_figures(metadata);
        item
    }

    /// Recompute mass, volume and cost
    pub fn refresh_figures(&mut self, metadata: &dyn ItemMetadata) {
        self.mass = metadata.mass(&self.payload);
        self.volume = metadata.volume(&self.payload);
        self.cost = metadata.cost(&self.payload);
    }

    /// Set explicit figures
    pub fn with_figures(mut self, mass: f64, volume: f64, cost: f64) -> Self {
        self.mass = mass;
        self.volume = volume;
        self.cost = cost;
        self
    }

    /// Mark this item as carrying an inventory
    pub fn carrying(mut self, inventory: InventoryId) -> Self {
        self.carries = Some(inventory);
        self
    }

    /// Whether a lease holds this item
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Owning inventory
    pub fn owner(&self) -> Option<InventoryId> {
        self.owner
    }

    /// Whether the item belongs to no inventory
    pub fn is_detached(&self) -> bool {
        self.owner.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = ItemId::next();
        let b = ItemId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_generator_reserve() {
        let generator = ItemIdGenerator::new();
        generator.reserve_through(ItemId::from_raw(41));
        assert_eq!(generator.next(), ItemId::from_raw(42));

        // Never moves backwards
        generator.reserve_through(ItemId::from_raw(5));
        assert_eq!(generator.next(), ItemId::from_raw(43));
    }

    #[test]
    fn test_resource_fraction() {
        assert_eq!(ResourceAmount::new("fuel", 25.0, 100.0).fraction(), 0.25);
        assert_eq!(ResourceAmount::new("fuel", 150.0, 100.0).fraction(), 1.0);
        assert_eq!(ResourceAmount::new("fuel", 5.0, 0.0).fraction(), 0.0);
    }

    #[test]
    fn test_new_item_is_detached() {
        let item = Item::new(ItemPayload::new("tank").with_variant("white"));
        assert!(item.is_detached());
        assert!(!item.is_locked());
        assert_eq!(item.payload.label(), "tank (white)");
    }
}
