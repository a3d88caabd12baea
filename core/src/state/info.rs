use chrono::{DateTime, Utc};

use crate::journal::{EventKind, LocationEvent};

/// Where the commander currently is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationInfo {
    pub system_name: String,
    pub system_address: u64,
    pub star_pos: Option<[f64; 3]>,
    /// Body the ship is at or near, when the game reports one.
    pub body: Option<String>,
    pub station: Option<String>,
    pub docked: bool,
    pub arrived_at: Option<DateTime<Utc>>,
    /// `Location`, `FSDJump` or `CarrierJump`.
    pub arrived_via: Option<EventKind>,
    /// Monotonic counter incremented on every arrival, including re-arrivals
    /// in the same system.
    pub generation: u64,
}

impl LocationInfo {
    pub fn is_known(&self) -> bool {
        self.arrived_at.is_some()
    }

    pub fn update(&mut self, location: &LocationEvent, kind: EventKind, at: DateTime<Utc>) {
        self.system_name = location.star_system.clone();
        self.system_address = location.system_address;
        self.star_pos = location.star_pos;
        self.body = location.body.clone();
        self.station = location.station_name.clone();
        self.docked = location.docked.unwrap_or(false);
        self.arrived_at = Some(at);
        self.arrived_via = Some(kind);
        self.generation += 1;
    }
}
