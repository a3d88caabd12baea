//! Star-system scene graph
//!
//! [`SystemMapBuilder`] collects the scans and signals of the current system
//! and derives a tree from them:
//!
//! ```text
//! SystemRoot (address)
//! ├── Star (ascending body id)
//! │   ├── Planet (acceptance order)
//! │   │   └── Moon
//! │   └── Planet
//! └── Star
//! ```
//!
//! Rings and belt clusters get a resolved parent but stay outside the tree
//! ([`SystemTree::detached`]). Stations and signals stay in their own tables.

mod body;
mod builder;
mod classify;


pub use body::{
    BodyAttributes, BodyKind, CelestialBody, DetachedBody, SYNTHETIC_BODY_ID, SignalKind,
    StationKind, SystemTree,
};
pub use builder::{MapState, ScanOutcome, SignalOutcome, SystemMapBuilder};
pub use classify::{ScanClass, SignalBucket, classify_scan, classify_signal};
