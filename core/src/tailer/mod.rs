//! Live journal tailer
//!
//! Watches one directory for journal files and streams every newly appended
//! complete line, decoded, through a single channel:
//!
//! ```text
//! notify ──► monitor task ──► debounce ──► spawn_blocking read ──► TailerMessage
//!                 │                              │
//!                 └──── CursorTable (mutex) ◄────┘
//! ```
//!
//! Files present at start are tracked from their current length, so history
//! is never replayed; use the history reader for that.

mod cursor;
mod log_tailer;
mod reader;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::context::ConfigError;
use crate::journal::{DecodeError, JournalEvent};

pub use cursor::CursorTable;
pub use log_tailer::LogTailer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailerState {
    Idle,
    Monitoring,
    /// The watch failed; recovery is pending or `start` may be retried.
    Error,
    Stopped,
}

/// One complete line as read from a journal file.
#[derive(Debug)]
pub struct DecodedLine {
    pub file_name: String,
    pub raw: String,
    pub result: Result<JournalEvent, DecodeError>,
}

#[derive(Debug)]
pub enum TailerMessage {
    Line(DecodedLine),
    /// A journal file appeared, or an existing one was truncated.
    NewSessionFile(PathBuf),
    PathChanged {
        old: Option<PathBuf>,
        new: PathBuf,
        at: DateTime<Utc>,
    },
    StateChanged(TailerState),
    Error(String),
}

pub type TailerReceiver = mpsc::UnboundedReceiver<TailerMessage>;

#[derive(Debug, Error)]
pub enum TailerError {
    #[error("journal directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("journal directory path is empty")]
    EmptyPath,
    #[error("no journal directory configured")]
    NotConfigured,
    #[error("failed to watch journal directory: {0}")]
    Watch(#[from] notify::Error),
    #[error(transparent)]
    Settings(#[from] ConfigError),
    #[error(
        "switching to {} failed and rolling back to {} failed too: {source}",
        .attempted.display(),
        .previous.display()
    )]
    RollbackFailed {
        attempted: PathBuf,
        previous: PathBuf,
        #[source]
        source: Box<TailerError>,
    },
}
