mod app_config;
mod folders;
mod journal_session;

pub use app_config::{AppConfig, ConfigError, ConfyStore, MemorySettings, SettingsStore};
pub use folders::{FixedFolder, FolderProvider, JournalFolder};
pub use journal_session::JournalSession;
