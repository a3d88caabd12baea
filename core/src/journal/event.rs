use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::records::{
    AllBodiesFoundEvent, CargoEvent, CommanderEvent, DiscoveryScanEvent, FileHeaderEvent,
    LoadGameEvent, LocationEvent, MaterialsEvent, RankEvent, ScanEvent, SignalEvent,
};

/// Discriminator of a journal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FileHeader,
    Commander,
    LoadGame,
    Location,
    FsdJump,
    CarrierJump,
    Scan,
    FssDiscoveryScan,
    FssSignalDiscovered,
    FssAllBodiesFound,
    Rank,
    Progress,
    Cargo,
    Materials,
    Shutdown,
    Unknown,
}

/// Known `event` values, matched case-sensitively.
pub(crate) static EVENT_KINDS: phf::Map<&'static str, EventKind> = phf::phf_map! {
    "Fileheader" => EventKind::FileHeader,
    "Commander" => EventKind::Commander,
    "LoadGame" => EventKind::LoadGame,
    "Location" => EventKind::Location,
    "FSDJump" => EventKind::FsdJump,
    "CarrierJump" => EventKind::CarrierJump,
    "Scan" => EventKind::Scan,
    "FSSDiscoveryScan" => EventKind::FssDiscoveryScan,
    "FSSSignalDiscovered" => EventKind::FssSignalDiscovered,
    "FSSAllBodiesFound" => EventKind::FssAllBodiesFound,
    "Rank" => EventKind::Rank,
    "Progress" => EventKind::Progress,
    "Cargo" => EventKind::Cargo,
    "Materials" => EventKind::Materials,
    "Shutdown" => EventKind::Shutdown,
};

impl EventKind {
    pub fn from_name(name: &str) -> EventKind {
        EVENT_KINDS.get(name).copied().unwrap_or(EventKind::Unknown)
    }

    /// Kinds that move the player to a (possibly) different star system.
    pub fn is_location(self) -> bool {
        matches!(
            self,
            EventKind::Location | EventKind::FsdJump | EventKind::CarrierJump
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    FileHeader(FileHeaderEvent),
    Commander(CommanderEvent),
    LoadGame(LoadGameEvent),
    Location(LocationEvent),
    FsdJump(LocationEvent),
    CarrierJump(LocationEvent),
    Scan(ScanEvent),
    FssDiscoveryScan(DiscoveryScanEvent),
    FssSignalDiscovered(SignalEvent),
    FssAllBodiesFound(AllBodiesFoundEvent),
    Rank(RankEvent),
    Progress(RankEvent),
    Cargo(CargoEvent),
    Materials(MaterialsEvent),
    Shutdown,
    /// Any record whose `event` is not in the known table. The complete field
    /// bag is kept so nothing is lost.
    Unknown {
        event: String,
        fields: Map<String, Value>,
    },
}

/// One decoded journal line. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEvent {
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl JournalEvent {
    pub fn kind(&self) -> EventKind {
        match &self.payload {
            EventPayload::FileHeader(_) => EventKind::FileHeader,
            EventPayload::Commander(_) => EventKind::Commander,
            EventPayload::LoadGame(_) => EventKind::LoadGame,
            EventPayload::Location(_) => EventKind::Location,
            EventPayload::FsdJump(_) => EventKind::FsdJump,
            EventPayload::CarrierJump(_) => EventKind::CarrierJump,
            EventPayload::Scan(_) => EventKind::Scan,
            EventPayload::FssDiscoveryScan(_) => EventKind::FssDiscoveryScan,
            EventPayload::FssSignalDiscovered(_) => EventKind::FssSignalDiscovered,
            EventPayload::FssAllBodiesFound(_) => EventKind::FssAllBodiesFound,
            EventPayload::Rank(_) => EventKind::Rank,
            EventPayload::Progress(_) => EventKind::Progress,
            EventPayload::Cargo(_) => EventKind::Cargo,
            EventPayload::Materials(_) => EventKind::Materials,
            EventPayload::Shutdown => EventKind::Shutdown,
            EventPayload::Unknown { .. } => EventKind::Unknown,
        }
    }

    /// The raw discriminator as written by the game.
    pub fn name(&self) -> &str {
        match &self.payload {
            EventPayload::Unknown { event, .. } => event,
            _ => EVENT_KINDS
                .entries()
                .find(|(_, kind)| **kind == self.kind())
                .map(|(name, _)| *name)
                .unwrap_or_default(),
        }
    }

    /// Location payload for any of the three arrival kinds.
    pub fn location(&self) -> Option<&LocationEvent> {
        match &self.payload {
            EventPayload::Location(loc)
            | EventPayload::FsdJump(loc)
            | EventPayload::CarrierJump(loc) => Some(loc),
            _ => None,
        }
    }
}

/// A type that can be extracted from a decoded event. Used by the historical
/// reader to filter a time-ordered stream down to one record type.
pub trait JournalRecord: Sized {
    fn from_event(event: &JournalEvent) -> Option<Self>;
}

impl JournalRecord for JournalEvent {
    fn from_event(event: &JournalEvent) -> Option<Self> {
        Some(event.clone())
    }
}

macro_rules! impl_journal_record {
    ($ty:ty => $($variant:ident)|+) => {
        impl JournalRecord for $ty {
            fn from_event(event: &JournalEvent) -> Option<Self> {
                match &event.payload {
                    $(EventPayload::$variant(record))|+ => Some(record.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_journal_record!(FileHeaderEvent => FileHeader);
impl_journal_record!(CommanderEvent => Commander);
impl_journal_record!(LoadGameEvent => LoadGame);
impl_journal_record!(LocationEvent => Location | FsdJump | CarrierJump);
impl_journal_record!(ScanEvent => Scan);
impl_journal_record!(DiscoveryScanEvent => FssDiscoveryScan);
impl_journal_record!(SignalEvent => FssSignalDiscovered);
impl_journal_record!(AllBodiesFoundEvent => FssAllBodiesFound);
impl_journal_record!(RankEvent => Rank);
impl_journal_record!(CargoEvent => Cargo);
impl_journal_record!(MaterialsEvent => Materials);
