use std::path::{Path, PathBuf};

use starlog_core::context::{AppConfig, ConfyStore, FolderProvider, JournalFolder, SettingsStore};
use starlog_core::{JournalHistory, JournalSession};
use starlog_types::{DisplayContext, JOURNAL_DIRECTORY_KEY};

/// Flags shared by every subcommand.
pub struct Options {
    pub directory: Option<PathBuf>,
    pub european: bool,
}

impl Options {
    pub fn display(&self, config: &AppConfig) -> DisplayContext {
        DisplayContext {
            european: self.european || config.display.european,
        }
    }
}

/// `--dir`, then the stored directory, then the game's default location.
pub fn journal_directory(store: &ConfyStore, options: &Options) -> Result<PathBuf, String> {
    options
        .directory
        .clone()
        .or_else(|| {
            store
                .get(JOURNAL_DIRECTORY_KEY)
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
        })
        .or_else(|| JournalFolder.try_default_path())
        .ok_or_else(|| "No journal directory found; pass --dir or run set-directory".to_string())
}

pub fn history(config: &AppConfig, directory: &Path) -> JournalHistory {
    JournalHistory::new(directory, config.history.clone(), config.tailer.clone())
}

pub async fn show_system(store: &ConfyStore, options: &Options) -> Result<(), String> {
    let config = store.config();
    let directory = journal_directory(store, options)?;
    let history = history(&config, &directory);

    let mut session = JournalSession::new(config.tailer.clone());
    session
        .seed_from_history(&history)
        .await
        .map_err(|e| e.to_string())?;

    let Some(tree) = session.system_tree() else {
        println!("No scanned system in the latest session");
        return Ok(());
    };
    print!("{}", tree.outline(&options.display(&config)));

    let map = &session.state().map;
    for station in map.stations() {
        println!("  {} [{}]", station.name, station.type_label());
    }
    for signal in map.signals().into_iter().chain(map.generic_signals()) {
        println!("  {} [{}]", signal.name, signal.type_label());
    }
    Ok(())
}

pub async fn list_sessions(store: &ConfyStore, options: &Options) -> Result<(), String> {
    let config = store.config();
    let directory = journal_directory(store, options)?;
    let groups = history(&config, &directory)
        .session_groups()
        .await
        .map_err(|e| e.to_string())?;

    if groups.is_empty() {
        println!("No journals in {}", directory.display());
        return Ok(());
    }
    for group in &groups {
        let started = group
            .started
            .map(|s| s.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{}  {:>2} part(s)  {}", started, group.files.len(), group.key);
    }
    println!("{} session(s)", groups.len());
    Ok(())
}

pub fn show_config(store: &ConfyStore) -> Result<(), String> {
    let config = store.config();
    println!(
        "journal_directory: {}",
        config.journal_directory.as_deref().unwrap_or("(not set)")
    );
    println!(
        "journal files:     {}*.{}",
        config.tailer.file_prefix, config.tailer.file_extension
    );
    println!("debounce:          {} ms", config.tailer.debounce_ms);
    println!("decode chunk:      {} lines", config.history.decode_chunk_lines);
    println!("european numbers:  {}", config.display.european);
    for (key, value) in &config.values {
        println!("{key}: {value}");
    }
    Ok(())
}

pub fn set_directory(store: &ConfyStore, path: &Path) -> Result<(), String> {
    if !path.is_dir() {
        return Err(format!("Not a directory: {}", path.display()));
    }
    store
        .set(JOURNAL_DIRECTORY_KEY, &path.to_string_lossy())
        .map_err(|e| e.to_string())?;
    println!("Journal directory set to {}", path.display());
    Ok(())
}
