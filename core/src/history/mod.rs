//! Historical journal reader
//!
//! Lists the journal directory, groups the files of each game session and
//! answers typed queries over the decoded events. Sessions are decoded on the
//! blocking pool (mmap + rayon) and cached until one of their files changes.

mod reader;
mod session_group;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use reader::JournalHistory;
pub use session_group::{JournalFile, JournalName, SessionGroup, group_files, parse_journal_name};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("journal directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("failed to list journal directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("journal decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
