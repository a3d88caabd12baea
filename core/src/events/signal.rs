use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::journal::EventKind;
use crate::system::{ScanClass, SignalBucket, SystemTree};

/// Signals emitted by the EventProcessor.
/// These represent "interesting things that happened" at a higher level
/// than raw journal events.
#[derive(Debug, Clone)]
pub enum JournalSignal {
    // Session lifecycle
    SessionStarted {
        timestamp: DateTime<Utc>,
        part: Option<u32>,
        game_version: Option<String>,
    },
    CommanderChanged {
        timestamp: DateTime<Utc>,
        name: String,
    },
    GameLoaded {
        timestamp: DateTime<Utc>,
        commander: String,
        ship: Option<String>,
    },
    GameShutdown {
        timestamp: DateTime<Utc>,
    },

    // Navigation
    SystemEntered {
        timestamp: DateTime<Utc>,
        system_name: String,
        system_address: u64,
        via: EventKind,
    },

    // Exploration
    BodyScanned {
        timestamp: DateTime<Utc>,
        body_id: i64,
        body_name: String,
        class: ScanClass,
    },
    SignalDiscovered {
        timestamp: DateTime<Utc>,
        name: String,
        bucket: SignalBucket,
    },
    DiscoveryScanned {
        timestamp: DateTime<Utc>,
        body_count: u32,
        non_body_count: u32,
    },
    AllBodiesFound {
        timestamp: DateTime<Utc>,
        count: u32,
    },
    SystemMapRebuilt {
        timestamp: DateTime<Utc>,
        tree: Arc<SystemTree>,
    },

    // Commander accumulators
    RanksUpdated {
        timestamp: DateTime<Utc>,
    },
    ProgressUpdated {
        timestamp: DateTime<Utc>,
    },
    CargoUpdated {
        timestamp: DateTime<Utc>,
        count: u32,
    },
    MaterialsUpdated {
        timestamp: DateTime<Utc>,
        total: u32,
    },
}

impl JournalSignal {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            JournalSignal::SessionStarted { timestamp, .. }
            | JournalSignal::CommanderChanged { timestamp, .. }
            | JournalSignal::GameLoaded { timestamp, .. }
            | JournalSignal::GameShutdown { timestamp }
            | JournalSignal::SystemEntered { timestamp, .. }
            | JournalSignal::BodyScanned { timestamp, .. }
            | JournalSignal::SignalDiscovered { timestamp, .. }
            | JournalSignal::DiscoveryScanned { timestamp, .. }
            | JournalSignal::AllBodiesFound { timestamp, .. }
            | JournalSignal::SystemMapRebuilt { timestamp, .. }
            | JournalSignal::RanksUpdated { timestamp }
            | JournalSignal::ProgressUpdated { timestamp }
            | JournalSignal::CargoUpdated { timestamp, .. }
            | JournalSignal::MaterialsUpdated { timestamp, .. } => *timestamp,
        }
    }
}
