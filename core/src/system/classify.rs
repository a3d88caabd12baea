//! Classification of scans and signals into scene-graph kinds.

use crate::journal::{ScanEvent, SignalEvent};

use super::body::{BodyKind, SignalKind, StationKind};

/// Kind of a scanned body as decided by its own record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanClass {
    Star,
    Planet,
    Ring,
    BeltCluster,
}

impl ScanClass {
    pub fn body_kind(self) -> BodyKind {
        match self {
            ScanClass::Star => BodyKind::Star,
            ScanClass::Planet => BodyKind::Planet,
            ScanClass::Ring => BodyKind::Ring,
            ScanClass::BeltCluster => BodyKind::BeltCluster,
        }
    }
}

/// Which table an accepted signal lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalBucket {
    Station(StationKind),
    Signal(SignalKind),
    Generic,
}

impl SignalBucket {
    pub fn body_kind(self) -> BodyKind {
        match self {
            SignalBucket::Station(kind) => BodyKind::Station(kind),
            SignalBucket::Signal(kind) => BodyKind::Signal(kind),
            SignalBucket::Generic => BodyKind::Generic,
        }
    }
}

/// A star-type field wins; otherwise the body name decides between belt
/// cluster, ring and planet.
pub fn classify_scan(scan: &ScanEvent) -> ScanClass {
    if scan.star_type.is_some() {
        return ScanClass::Star;
    }
    let name = scan.body_name.to_ascii_lowercase();
    if name.contains("belt cluster") {
        ScanClass::BeltCluster
    } else if name.split_whitespace().any(|word| word == "ring") {
        ScanClass::Ring
    } else {
        ScanClass::Planet
    }
}

pub fn classify_signal(signal: &SignalEvent) -> SignalBucket {
    let flagged_station = signal.is_station == Some(true);
    let Some(signal_type) = signal.signal_type.as_deref() else {
        return if flagged_station {
            SignalBucket::Station(StationKind::Unknown)
        } else {
            SignalBucket::Generic
        };
    };

    if let Some(kind) = station_kind(signal_type) {
        return SignalBucket::Station(kind);
    }
    if flagged_station {
        return SignalBucket::Station(StationKind::Unknown);
    }
    match signal_kind(signal_type) {
        Some(kind) => SignalBucket::Signal(kind),
        None => SignalBucket::Generic,
    }
}

fn station_kind(signal_type: &str) -> Option<StationKind> {
    let kind = match signal_type {
        "StationCoriolis" => StationKind::Coriolis,
        "StationONeilOrbis" => StationKind::Orbis,
        "StationONeilCylinder" => StationKind::Cylinder,
        "StationBernalSphere" => StationKind::Ocellus,
        "StationAsteroid" => StationKind::AsteroidBase,
        "Outpost" => StationKind::Outpost,
        "Settlement" | "OnFootSettlement" | "SurfaceStation" => StationKind::Settlement,
        "Megaship" | "StationMegaShip" => StationKind::Megaship,
        "FleetCarrier" | "SquadronCarrier" => StationKind::FleetCarrier,
        other if other.starts_with("Station") => StationKind::Unknown,
        _ => return None,
    };
    Some(kind)
}

fn signal_kind(signal_type: &str) -> Option<SignalKind> {
    let kind = match signal_type {
        "Combat" => SignalKind::ConflictZone,
        "ResourceExtraction" => SignalKind::ResourceExtraction,
        "NavBeacon" => SignalKind::NavBeacon,
        "TouristBeacon" => SignalKind::TouristBeacon,
        "Installation" => SignalKind::Installation,
        "USS" => SignalKind::UnknownSignal,
        "Titan" => SignalKind::Titan,
        "Generic" | "Codex" => SignalKind::PointOfInterest,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_named(name: &str, star_type: Option<&str>) -> ScanEvent {
        let star = star_type
            .map(|t| format!(r#","StarType":"{}""#, t))
            .unwrap_or_default();
        let line = format!(
            r#"{{"BodyName":"{}","BodyID":1{}}}"#,
            name, star
        );
        serde_json::from_str(&line).unwrap()
    }

    fn signal(signal_type: Option<&str>, is_station: Option<bool>) -> SignalEvent {
        SignalEvent {
            system_address: Some(1),
            signal_name: "X".to_string(),
            signal_name_localised: None,
            signal_type: signal_type.map(str::to_string),
            is_station,
            uss_type_localised: None,
            threat_level: None,
            time_remaining: None,
        }
    }

    #[test]
    fn test_classify_scan() {
        assert_eq!(classify_scan(&scan_named("Sol", Some("G"))), ScanClass::Star);
        assert_eq!(classify_scan(&scan_named("Sol 5", None)), ScanClass::Planet);
        assert_eq!(classify_scan(&scan_named("Sol 5 A Ring", None)), ScanClass::Ring);
        assert_eq!(
            classify_scan(&scan_named("Sol A Belt Cluster 4", None)),
            ScanClass::BeltCluster
        );
        // "ring" must be a whole word
        assert_eq!(classify_scan(&scan_named("Bering 3", None)), ScanClass::Planet);
        // Star type beats any name marker
        assert_eq!(
            classify_scan(&scan_named("Ring Nebula Star", Some("M"))),
            ScanClass::Star
        );
    }

    #[test]
    fn test_classify_signal() {
        assert_eq!(
            classify_signal(&signal(Some("StationCoriolis"), None)),
            SignalBucket::Station(StationKind::Coriolis)
        );
        assert_eq!(
            classify_signal(&signal(Some("FleetCarrier"), Some(true))),
            SignalBucket::Station(StationKind::FleetCarrier)
        );
        assert_eq!(
            classify_signal(&signal(Some("StationSomethingNew"), None)),
            SignalBucket::Station(StationKind::Unknown)
        );
        assert_eq!(
            classify_signal(&signal(Some("NavBeacon"), None)),
            SignalBucket::Signal(SignalKind::NavBeacon)
        );
        assert_eq!(
            classify_signal(&signal(Some("USS"), None)),
            SignalBucket::Signal(SignalKind::UnknownSignal)
        );
        assert_eq!(
            classify_signal(&signal(Some("Brand new type"), None)),
            SignalBucket::Generic
        );
        assert_eq!(
            classify_signal(&signal(Some("Brand new type"), Some(true))),
            SignalBucket::Station(StationKind::Unknown)
        );
        assert_eq!(classify_signal(&signal(None, None)), SignalBucket::Generic);
        assert_eq!(
            classify_signal(&signal(None, Some(true))),
            SignalBucket::Station(StationKind::Unknown)
        );
    }
}
