pub mod context;
pub mod events;
pub mod history;
pub mod journal;
pub mod state;
pub mod system;
pub mod tailer;

// Re-exports for convenience
pub use context::{JournalSession, SettingsStore};
pub use events::{EventProcessor, JournalSignal, SignalHandler};
pub use history::{HistoryError, JournalHistory};
pub use journal::{DecodeError, EventKind, EventPayload, JournalEvent, JournalRecord, decode};
pub use state::SessionState;
pub use system::{CelestialBody, SystemMapBuilder, SystemTree};
pub use tailer::{LogTailer, TailerError, TailerMessage, TailerState};
