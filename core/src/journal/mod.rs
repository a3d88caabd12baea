//! Journal event model and decoder
//!
//! Each journal line is one JSON object with a `timestamp` and an `event`
//! discriminator. [`decode`] maps a raw line to a [`JournalEvent`] whose
//! payload is one of the typed records in [`records`], or a field-preserving
//! `Unknown` variant for kinds the core does not model.

mod decoder;
mod event;
pub mod records;

pub use decoder::{DecodeError, decode, excerpt};
pub use event::{EventKind, EventPayload, JournalEvent, JournalRecord};
pub use records::{
    AllBodiesFoundEvent, CargoEvent, CargoItem, CommanderEvent, DiscoveryScanEvent,
    FileHeaderEvent, LoadGameEvent, LocationEvent, MaterialCount, MaterialsEvent, ParentRef,
    RankEvent, ScanEvent, SignalEvent,
};
