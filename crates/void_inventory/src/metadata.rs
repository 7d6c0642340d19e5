//! Item metadata provider
//!
//! Mass, volume, cost and default resources come from the host's domain data.
//! The inventory only asks through [`ItemMetadata`].

use crate::item::{ItemPayload, ResourceAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque handle to a renderable icon
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconHandle(pub String);

/// Source of derived item figures
pub trait ItemMetadata {
    /// Mass of an item including its resources
    fn mass(&self, payload: &ItemPayload) -> f64;
    /// Volume occupied in an inventory
    fn volume(&self, payload: &ItemPayload) -> f64;
    /// Cost including resources
    fn cost(&self, payload: &ItemPayload) -> f64;
    /// Resources a fresh item of this kind carries
    fn resources(&self, kind: &str, variant: Option<&str>) -> Vec<ResourceAmount>;
    /// Icon for a kind and variant
    fn icon(&self, kind: &str, variant: Option<&str>) -> Option<IconHandle>;
}

/// Per-unit properties of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    /// Resource name
    pub name: String,
    /// Capacity on a fresh item
    pub max_amount: f64,
    /// Mass per unit
    #[serde(default)]
    pub density: f64,
    /// Cost per unit
    #[serde(default)]
    pub unit_cost: f64,
}

/// Figures for one item kind
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KindMetadata {
    /// Mass without resources
    pub dry_mass: f64,
    /// Volume
    pub volume: f64,
    /// Cost without resources
    pub dry_cost: f64,
    /// Resources carried
    pub resources: Vec<ResourceTemplate>,
    /// Icon path
    pub icon: Option<String>,
}

impl KindMetadata {
    /// Create kind figures
    pub fn new(dry_mass: f64, volume: f64, dry_cost: f64) -> Self {
        Self {
            dry_mass,
            volume,
            dry_cost,
            ..Self::default()
        }
    }

    /// Add a resource template
    pub fn with_resource(mut self, name: impl Into<String>, max_amount: f64, density: f64, unit_cost: f64) -> Self {
        self.resources.push(ResourceTemplate {
            name: name.into(),
            max_amount,
            density,
            unit_cost,
        });
        self
    }

    /// Set icon path
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    fn template(&self, name: &str) -> Option<&ResourceTemplate> {
        self.resources.iter().find(|r| r.name == name)
    }
}

/// Table-driven metadata, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataTable {
    kinds: HashMap<String, KindMetadata>,
}

impl MetadataTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind
    pub fn with_kind(mut self, kind: impl Into<String>, metadata: KindMetadata) -> Self {
        self.insert(kind, metadata);
        self
    }

    /// Register a kind
    pub fn insert(&mut self, kind: impl Into<String>, metadata: KindMetadata) {
        self.kinds.insert(kind.into(), metadata);
    }

    /// Look up a kind
    pub fn get(&self, kind: &str) -> Option<&KindMetadata> {
        self.kinds.get(kind)
    }

    /// Load from JSON (`{ "kinds": { "tank": { ... } } }`)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn resource_sum(&self, payload: &ItemPayload, per_unit: impl Fn(&ResourceTemplate) -> f64) -> f64 {
        let Some(kind) = self.get(&payload.kind) else {
            return 0.0;
        };
        payload
            .resources
            .iter()
            .filter_map(|r| kind.template(&r.name).map(|t| r.amount * per_unit(t)))
            .sum()
    }
}

impl ItemMetadata for MetadataTable {
    fn mass(&self, payload: &ItemPayload) -> f64 {
        let dry = self.get(&payload.kind).map_or(0.0, |k| k.dry_mass);
        dry + self.resource_sum(payload, |t| t.density)
    }

    fn volume(&self, payload: &ItemPayload) -> f64 {
        self.get(&payload.kind).map_or(0.0, |k| k.volume)
    }

    fn cost(&self, payload: &ItemPayload) -> f64 {
        let dry = self.get(&payload.kind).map_or(0.0, |k| k.dry_cost);
        dry + self.resource_sum(payload, |t| t.unit_cost)
    }

    fn resources(&self, kind: &str, _variant: Option<&str>) -> Vec<ResourceAmount> {
        self.get(kind)
            .map(|k| {
                k.resources
                    .iter()
                    .map(|t| ResourceAmount::full(t.name.clone(), t.max_amount))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn icon(&self, kind: &str, variant: Option<&str>) -> Option<IconHandle> {
        let icon = self.get(kind)?.icon.as_ref()?;
        Some(IconHandle(match variant {
            Some(variant) => format!("{icon}#{variant}"),
            None => icon.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MetadataTable {
        MetadataTable::new().with_kind(
            "tank",
            KindMetadata::new(0.5, 2.0, 100.0)
                .with_resource("fuel", 40.0, 0.005, 0.8)
                .with_icon("icons/tank"),
        )
    }

    #[test]
    fn test_figures_include_resources() {
        let table = table();
        let payload = ItemPayload::new("tank").with_resource("fuel", 20.0, 40.0);

        assert!((table.mass(&payload) - 0.6).abs() < 1e-9);
        assert!((table.cost(&payload) - 116.0).abs() < 1e-9);
        assert_eq!(table.volume(&payload), 2.0);
    }

    #[test]
    fn test_unknown_kind() {
        let table = table();
        let payload = ItemPayload::new("mystery");

        assert_eq!(table.mass(&payload), 0.0);
        assert!(table.resources("mystery", None).is_empty());
        assert_eq!(table.icon("mystery", None), None);
    }

    #[test]
    fn test_default_resources_are_full() {
        let resources = table().resources("tank", None);
        assert_eq!(resources, vec![ResourceAmount::full("fuel", 40.0)]);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{ "kinds": { "battery": { "dry_mass": 0.1, "volume": 1.5,
            "resources": [ { "name": "charge", "max_amount": 100.0 } ] } } }"#;
        let table = MetadataTable::from_json(json).unwrap();

        let kind = table.get("battery").unwrap();
        assert_eq!(kind.volume, 1.5);
        assert_eq!(kind.resources[0].density, 0.0);
        assert_eq!(table.icon("tank", Some("white")), None);
    }
}
