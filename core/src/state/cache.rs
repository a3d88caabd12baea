use std::collections::BTreeMap;

use crate::journal::{CargoEvent, DiscoveryScanEvent, FileHeaderEvent, MaterialsEvent, RankEvent};
use crate::system::SystemMapBuilder;

use super::commander::CommanderInfo;
use super::info::LocationInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoEntry {
    pub name: String,
    pub display_name: String,
    pub count: u32,
    pub stolen: u32,
}

/// Pure storage for one game session.
/// Routing logic lives in EventProcessor.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Header of the first file of the session.
    pub header: Option<FileHeaderEvent>,
    pub commander: CommanderInfo,
    pub location: LocationInfo,

    // Current system
    pub map: SystemMapBuilder,
    /// Result of the last discovery scan in the current system.
    pub discovery: Option<DiscoveryScanEvent>,
    pub all_bodies_found: bool,

    // Careers, keyed by career name
    pub ranks: BTreeMap<&'static str, u32>,
    /// Percent towards the next rank.
    pub progress: BTreeMap<&'static str, u32>,

    // Inventory
    pub cargo: Vec<CargoEntry>,
    pub cargo_count: u32,
    /// Keyed by category (`Raw`, `Manufactured`, `Encoded`), then material.
    pub materials: BTreeMap<&'static str, BTreeMap<String, u32>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; a new game session is starting.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Per-system state is dropped on every arrival.
    pub fn clear_system(&mut self) {
        self.discovery = None;
        self.all_bodies_found = false;
    }

    pub fn apply_ranks(&mut self, ranks: &RankEvent) {
        self.ranks.extend(ranks.entries());
    }

    pub fn apply_progress(&mut self, progress: &RankEvent) {
        self.progress.extend(progress.entries());
    }

    /// Replace the manifest. A record without an inventory only updates the
    /// total.
    pub fn apply_cargo(&mut self, cargo: &CargoEvent) {
        if cargo.vessel.as_deref().is_some_and(|v| v != "Ship") {
            return;
        }
        self.cargo_count = cargo.count;
        if let Some(inventory) = &cargo.inventory {
            self.cargo = inventory
                .iter()
                .map(|item| CargoEntry {
                    name: item.name.clone(),
                    display_name: item
                        .name_localised
                        .clone()
                        .unwrap_or_else(|| item.name.clone()),
                    count: item.count,
                    stolen: item.stolen,
                })
                .collect();
        }
    }

    pub fn apply_materials(&mut self, materials: &MaterialsEvent) {
        self.materials.clear();
        for (category, list) in [
            ("Raw", &materials.raw),
            ("Manufactured", &materials.manufactured),
            ("Encoded", &materials.encoded),
        ] {
            let counts = list
                .iter()
                .map(|m| (m.name.to_ascii_lowercase(), m.count))
                .collect();
            self.materials.insert(category, counts);
        }
    }

    pub fn material_count(&self) -> u32 {
        self.materials.values().flat_map(|m| m.values()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{CargoItem, MaterialCount};

    fn item(name: &str, count: u32) -> CargoItem {
        CargoItem {
            name: name.to_string(),
            name_localised: None,
            count,
            stolen: 0,
        }
    }

    #[test]
    fn test_cargo_snapshot_replaces_manifest() {
        let mut state = SessionState::new();
        state.apply_cargo(&CargoEvent {
            vessel: Some("Ship".into()),
            count: 12,
            inventory: Some(vec![item("gold", 8), item("silver", 4)]),
        });
        assert_eq!(state.cargo.len(), 2);

        // Count only: manifest untouched
        state.apply_cargo(&CargoEvent {
            vessel: Some("Ship".into()),
            count: 8,
            inventory: None,
        });
        assert_eq!(state.cargo_count, 8);
        assert_eq!(state.cargo.len(), 2);

        state.apply_cargo(&CargoEvent {
            vessel: Some("Ship".into()),
            count: 3,
            inventory: Some(vec![item("tea", 3)]),
        });
        assert_eq!(state.cargo.len(), 1);
        assert_eq!(state.cargo[0].display_name, "tea");

        // SRV cargo is tracked elsewhere
        state.apply_cargo(&CargoEvent {
            vessel: Some("SRV".into()),
            count: 1,
            inventory: Some(vec![]),
        });
        assert_eq!(state.cargo_count, 3);
    }

    #[test]
    fn test_ranks_merge_and_reset() {
        let mut state = SessionState::new();
        state.apply_ranks(&RankEvent {
            combat: Some(3),
            explore: Some(5),
            ..RankEvent::default()
        });
        state.apply_ranks(&RankEvent {
            combat: Some(4),
            ..RankEvent::default()
        });
        assert_eq!(state.ranks.get("Combat"), Some(&4));
        assert_eq!(state.ranks.get("Explore"), Some(&5));

        state.apply_materials(&MaterialsEvent {
            raw: vec![MaterialCount {
                name: "Iron".into(),
                name_localised: None,
                count: 40,
            }],
            ..MaterialsEvent::default()
        });
        assert_eq!(state.material_count(), 40);
        assert_eq!(state.materials["Raw"].get("iron"), Some(&40));

        state.reset();
        assert!(state.ranks.is_empty());
        assert_eq!(state.material_count(), 0);
    }
}
