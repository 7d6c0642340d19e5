//! Per-inventory configuration

use serde::{Deserialize, Serialize};

/// How strictly the host container's limits are honored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompatibilityPolicy {
    /// Never exceed stack ceilings or the host's slot count
    RespectCapacity,
    /// Allow temporary over-ceiling inserts, keep the host's slot count
    RelaxCapacity,
    /// No external limits: relax ceilings and grow past the slot count
    Custom,
}

impl Default for CompatibilityPolicy {
    fn default() -> Self {
        Self::RespectCapacity
    }
}

impl CompatibilityPolicy {
    /// Whether a full backing slot may be relaxed to take one more item
    pub fn allows_relaxation(&self) -> bool {
        !matches!(self, Self::RespectCapacity)
    }

    /// Whether backing indices past the host's slot count may be used
    pub fn allows_overflow(&self) -> bool {
        matches!(self, Self::Custom)
    }
}

/// Inventory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Host container compatibility policy
    pub policy: CompatibilityPolicy,
    /// Visible grid width
    pub grid_width: usize,
    /// Visible grid height
    pub grid_height: usize,
    /// Maximum items per display slot
    pub max_items_per_slot: usize,
    /// Maximum total volume (None = unlimited)
    pub max_volume: Option<f64>,
    /// Let user-initiated attaches land in invisible overflow slots
    pub allow_display_overflow: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            policy: CompatibilityPolicy::default(),
            grid_width: 3,
            grid_height: 3,
            max_items_per_slot: 100,
            max_volume: None,
            allow_display_overflow: false,
        }
    }
}

impl InventoryConfig {
    /// Create a config with a visible grid of the given size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Self::default()
        }
    }

    /// Set the compatibility policy
    pub fn with_policy(mut self, policy: CompatibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the per-slot item cap
    pub fn with_max_items_per_slot(mut self, cap: usize) -> Self {
        self.max_items_per_slot = cap.max(1);
        self
    }

    /// Set the volume limit
    pub fn with_max_volume(mut self, volume: f64) -> Self {
        self.max_volume = Some(volume);
        self
    }

    /// Allow attaches into invisible overflow
    pub fn with_display_overflow(mut self, allow: bool) -> Self {
        self.allow_display_overflow = allow;
        self
    }

    /// Number of visible cells
    pub fn visible_cells(&self) -> usize {
        self.grid_width * self.grid_height
    }

    /// Parse a config from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
