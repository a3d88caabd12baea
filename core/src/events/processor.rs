use chrono::{DateTime, Utc};

use crate::journal::{EventPayload, JournalEvent};
use crate::state::SessionState;
use crate::system::{ScanOutcome, SignalOutcome};

use super::JournalSignal;

/// Routes journal events into [`SessionState`] and reports what changed.
/// Stateless; everything it touches lives in the session state.
#[derive(Debug, Default)]
pub struct EventProcessor;

impl EventProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn process_event(
        &self,
        event: JournalEvent,
        state: &mut SessionState,
    ) -> Vec<JournalSignal> {
        let timestamp = event.timestamp;
        let kind = event.kind();
        let mut signals = Vec::new();

        match event.payload {
            EventPayload::FileHeader(header) => {
                signals.push(JournalSignal::SessionStarted {
                    timestamp,
                    part: header.part,
                    game_version: header.game_version.clone(),
                });
                // Continuation parts keep the header of the first file
                if state.header.is_none() || header.part.is_none_or(|p| p <= 1) {
                    state.header = Some(header);
                }
            }
            EventPayload::Commander(commander) => {
                if state
                    .commander
                    .set_name(&commander.name, commander.fid.as_deref())
                {
                    signals.push(JournalSignal::CommanderChanged {
                        timestamp,
                        name: commander.name,
                    });
                }
            }
            EventPayload::LoadGame(load) => {
                if state
                    .commander
                    .set_name(&load.commander, load.fid.as_deref())
                {
                    signals.push(JournalSignal::CommanderChanged {
                        timestamp,
                        name: load.commander.clone(),
                    });
                }
                let commander = &mut state.commander;
                commander.ship = load.ship.clone();
                commander.ship_name = load.ship_name;
                commander.game_mode = load.game_mode;
                commander.credits = load.credits;
                signals.push(JournalSignal::GameLoaded {
                    timestamp,
                    commander: load.commander,
                    ship: load.ship,
                });
            }
            EventPayload::Location(location)
            | EventPayload::FsdJump(location)
            | EventPayload::CarrierJump(location) => {
                state.location.update(&location, kind, timestamp);
                state.clear_system();
                state
                    .map
                    .establish_root(&location.star_system, location.system_address);
                signals.push(JournalSignal::SystemEntered {
                    timestamp,
                    system_name: location.star_system,
                    system_address: location.system_address,
                    via: kind,
                });
            }
            EventPayload::Scan(scan) => {
                let body_id = scan.body_id;
                let body_name = scan.body_name.clone();
                if let ScanOutcome::Accepted(class) = state.map.add_scan(scan) {
                    signals.push(JournalSignal::BodyScanned {
                        timestamp,
                        body_id,
                        body_name,
                        class,
                    });
                }
            }
            EventPayload::FssSignalDiscovered(signal) => {
                if let SignalOutcome::Accepted(bucket) = state.map.add_signal(&signal) {
                    signals.push(JournalSignal::SignalDiscovered {
                        timestamp,
                        name: signal.display_name().to_string(),
                        bucket,
                    });
                }
            }
            EventPayload::FssDiscoveryScan(discovery) => {
                signals.push(JournalSignal::DiscoveryScanned {
                    timestamp,
                    body_count: discovery.body_count,
                    non_body_count: discovery.non_body_count,
                });
                state.discovery = Some(discovery);
            }
            EventPayload::FssAllBodiesFound(found) => {
                state.all_bodies_found = true;
                signals.push(JournalSignal::AllBodiesFound {
                    timestamp,
                    count: found.count,
                });
                signals.extend(self.rebuild_if_dirty(state, timestamp));
            }
            EventPayload::Rank(ranks) => {
                state.apply_ranks(&ranks);
                signals.push(JournalSignal::RanksUpdated { timestamp });
            }
            EventPayload::Progress(progress) => {
                state.apply_progress(&progress);
                signals.push(JournalSignal::ProgressUpdated { timestamp });
            }
            EventPayload::Cargo(cargo) => {
                state.apply_cargo(&cargo);
                signals.push(JournalSignal::CargoUpdated {
                    timestamp,
                    count: state.cargo_count,
                });
            }
            EventPayload::Materials(materials) => {
                state.apply_materials(&materials);
                signals.push(JournalSignal::MaterialsUpdated {
                    timestamp,
                    total: state.material_count(),
                });
            }
            EventPayload::Shutdown => {
                signals.push(JournalSignal::GameShutdown { timestamp });
            }
            EventPayload::Unknown { event, .. } => {
                tracing::trace!(event = %event, "Unrouted journal event");
            }
        }

        signals
    }

    /// Rebuild the system map when scans or signals were accepted since the
    /// last rebuild.
    pub fn rebuild_if_dirty(
        &self,
        state: &mut SessionState,
        timestamp: DateTime<Utc>,
    ) -> Option<JournalSignal> {
        if !state.map.is_dirty() {
            return None;
        }
        let tree = state.map.rebuild_hierarchy()?;
        tracing::debug!(
            system = %tree.root.name,
            bodies = tree.body_count(),
            "System map rebuilt"
        );
        Some(JournalSignal::SystemMapRebuilt { timestamp, tree })
    }
}
