//! Tests for event routing
//!
//! Feeds decoded journal lines through the processor and checks both the
//! emitted signals and the resulting session state.

use super::{EventProcessor, JournalSignal};
use crate::journal::{EventKind, decode};
use crate::state::SessionState;
use crate::system::{BodyKind, ScanClass, SignalBucket, StationKind};

const SOL: u64 = 10477373803;

fn run(state: &mut SessionState, lines: &[&str]) -> Vec<JournalSignal> {
    let processor = EventProcessor::new();
    lines
        .iter()
        .flat_map(|line| processor.process_event(decode(line).unwrap(), state))
        .collect()
}

fn arrive(system: &str, address: u64) -> String {
    format!(
        r#"{{"timestamp":"2024-01-15T10:00:00Z","event":"FSDJump","StarSystem":"{system}","SystemAddress":{address},"StarPos":[0.0,0.0,0.0],"JumpDist":8.5}}"#
    )
}

const SCAN_STAR: &str = r#"{"timestamp":"2024-01-15T10:01:00Z","event":"Scan","BodyName":"Sol","BodyID":0,"StarSystem":"Sol","SystemAddress":10477373803,"StarType":"G","DistanceFromArrivalLS":0.0}"#;
const SCAN_PLANET: &str = r#"{"timestamp":"2024-01-15T10:02:00Z","event":"Scan","BodyName":"Earth","BodyID":3,"StarSystem":"Sol","SystemAddress":10477373803,"PlanetClass":"Earthlike body","Parents":[{"Star":0}],"DistanceFromArrivalLS":499.0}"#;
const STATION: &str = r#"{"timestamp":"2024-01-15T10:03:00Z","event":"FSSSignalDiscovered","SystemAddress":10477373803,"SignalName":"Abraham Lincoln","SignalType":"StationONeilOrbis","IsStation":true}"#;
const ALL_FOUND: &str = r#"{"timestamp":"2024-01-15T10:04:00Z","event":"FSSAllBodiesFound","SystemName":"Sol","SystemAddress":10477373803,"Count":2}"#;

#[test]
fn test_arrival_establishes_root() {
    let mut state = SessionState::new();
    let signals = run(&mut state, &[&arrive("Sol", SOL)]);

    assert!(matches!(
        &signals[..],
        [JournalSignal::SystemEntered { system_name, system_address: SOL, via: EventKind::FsdJump, .. }]
            if system_name == "Sol"
    ));
    assert_eq!(state.location.system_name, "Sol");
    assert_eq!(state.location.generation, 1);
    assert_eq!(state.map.system_address(), Some(SOL));
}

#[test]
fn test_scans_and_signals_are_routed_to_the_map() {
    let mut state = SessionState::new();
    let signals = run(&mut state, &[&arrive("Sol", SOL), SCAN_STAR, SCAN_PLANET, STATION]);

    let scanned: Vec<(i64, ScanClass)> = signals
        .iter()
        .filter_map(|s| match s {
            JournalSignal::BodyScanned { body_id, class, .. } => Some((*body_id, *class)),
            _ => None,
        })
        .collect();
    assert_eq!(scanned, vec![(0, ScanClass::Star), (3, ScanClass::Planet)]);
    assert!(signals.iter().any(|s| matches!(
        s,
        JournalSignal::SignalDiscovered { bucket: SignalBucket::Station(StationKind::Orbis), .. }
    )));
    assert_eq!(state.map.scan_count(), 2);
    assert!(state.map.is_dirty());

    // Repeated scan of a known body
    let again = run(&mut state, &[SCAN_PLANET]);
    assert!(again.is_empty());
}

#[test]
fn test_all_bodies_found_rebuilds_immediately() {
    let mut state = SessionState::new();
    let signals = run(
        &mut state,
        &[&arrive("Sol", SOL), SCAN_STAR, SCAN_PLANET, ALL_FOUND],
    );

    let tree = signals
        .iter()
        .find_map(|s| match s {
            JournalSignal::SystemMapRebuilt { tree, .. } => Some(tree.clone()),
            _ => None,
        })
        .expect("rebuild signal");
    assert_eq!(tree.body_count(), 2);
    assert_eq!(tree.root.children[0].kind, BodyKind::Star);
    assert_eq!(tree.root.children[0].children[0].name, "Earth");
    assert!(state.all_bodies_found);
    assert!(!state.map.is_dirty());

    // Nothing new: no second rebuild
    let processor = EventProcessor::new();
    assert!(processor.rebuild_if_dirty(&mut state, tree_time()).is_none());
}

fn tree_time() -> chrono::DateTime<chrono::Utc> {
    "2024-01-15T10:05:00Z".parse().unwrap()
}

#[test]
fn test_new_arrival_clears_system_state() {
    let mut state = SessionState::new();
    run(
        &mut state,
        &[
            &arrive("Sol", SOL),
            SCAN_STAR,
            r#"{"timestamp":"2024-01-15T10:01:30Z","event":"FSSDiscoveryScan","Progress":0.5,"BodyCount":10,"NonBodyCount":3,"SystemName":"Sol","SystemAddress":10477373803}"#,
            ALL_FOUND,
        ],
    );
    assert!(state.discovery.is_some());

    run(&mut state, &[&arrive("Alpha Centauri", 1_458_376_315_610)]);
    assert!(state.discovery.is_none());
    assert!(!state.all_bodies_found);
    assert_eq!(state.map.scan_count(), 0);
    assert_eq!(state.location.generation, 2);

    // A scan from the old system no longer fits
    assert!(run(&mut state, &[SCAN_PLANET]).is_empty());
}

#[test]
fn test_commander_and_inventory() {
    let mut state = SessionState::new();
    let signals = run(
        &mut state,
        &[
            r#"{"timestamp":"2024-01-15T09:59:00Z","event":"Fileheader","part":1,"gameversion":"4.0.0.1904"}"#,
            r#"{"timestamp":"2024-01-15T09:59:01Z","event":"Commander","FID":"F123","Name":"Jameson"}"#,
            r#"{"timestamp":"2024-01-15T09:59:02Z","event":"LoadGame","FID":"F123","Commander":"Jameson","Ship":"cobramkiii","Credits":1000}"#,
            r#"{"timestamp":"2024-01-15T09:59:03Z","event":"Rank","Combat":2,"Trade":1}"#,
            r#"{"timestamp":"2024-01-15T09:59:04Z","event":"Cargo","Vessel":"Ship","Count":4,"Inventory":[{"Name":"gold","Count":4,"Stolen":0}]}"#,
            r#"{"timestamp":"2024-01-15T09:59:05Z","event":"Music","MusicTrack":"MainMenu"}"#,
        ],
    );

    let commander_changes = signals
        .iter()
        .filter(|s| matches!(s, JournalSignal::CommanderChanged { .. }))
        .count();
    assert_eq!(commander_changes, 1);
    assert!(matches!(signals[0], JournalSignal::SessionStarted { part: Some(1), .. }));
    assert_eq!(state.commander.name.as_deref(), Some("Jameson"));
    assert_eq!(state.commander.ship.as_deref(), Some("cobramkiii"));
    assert_eq!(state.commander.credits, Some(1000));
    assert_eq!(state.ranks.get("Combat"), Some(&2));
    assert_eq!(state.cargo_count, 4);
    assert_eq!(state.cargo[0].name, "gold");
    // Unknown events produce nothing
    assert!(matches!(signals.last(), Some(JournalSignal::CargoUpdated { count: 4, .. })));
}
