use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use starlog_types::{JOURNAL_DIRECTORY_KEY, TailerSettings};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::context::{FolderProvider, SettingsStore};

use super::cursor::CursorTable;
use super::reader::{AppendedLines, read_appended};
use super::{TailerError, TailerMessage, TailerReceiver, TailerState};

/// Consecutive failed reads of one file before waiting for its next change.
const READ_ATTEMPTS: u32 = 3;

type WatchEvents = mpsc::UnboundedReceiver<notify::Result<Event>>;

// ─────────────────────────────────────────────────────────────────────────────
// Shared state
// ─────────────────────────────────────────────────────────────────────────────

/// State shared by the handle, the monitor task and the read tasks.
struct Shared {
    config: TailerSettings,
    tx: mpsc::UnboundedSender<TailerMessage>,
    cursors: Mutex<CursorTable>,
    state: Mutex<TailerState>,
    /// Bumped by every start and stop. Work carrying an older value is stale.
    generation: AtomicU64,
}

impl Shared {
    fn cursors(&self) -> MutexGuard<'_, CursorTable> {
        self.cursors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn send(&self, message: TailerMessage) {
        // A dropped receiver only means nobody is listening
        let _ = self.tx.send(message);
    }

    fn state(&self) -> TailerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: TailerState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            *state = next;
            self.send(TailerMessage::StateChanged(next));
        }
    }

    fn set_state_if_current(&self, generation: u64, next: TailerState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_current(generation) && *state != next {
            *state = next;
            self.send(TailerMessage::StateChanged(next));
        }
    }

    fn is_journal(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.config.matches_file_name(n))
    }

    fn debounce(&self) -> Duration {
        Duration::from_millis(self.config.debounce_ms)
    }

    fn new_file_delay(&self) -> Duration {
        Duration::from_millis(self.config.new_file_delay_ms)
    }

    fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.config.restart_delay_ms)
    }

    /// Journal files currently in `directory` with their lengths.
    fn list_journals(&self, directory: &Path) -> Vec<(PathBuf, u64)> {
        let entries = match std::fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, directory = %directory.display(), "Failed to list journal directory");
                return Vec::new();
            }
        };
        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| self.is_journal(path))
            .filter_map(|path| {
                let len = std::fs::metadata(&path).ok().filter(|m| m.is_file())?.len();
                Some((path, len))
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Tails the journal files of one directory.
///
/// `start` and `restart` spawn onto the current Tokio runtime.
pub struct LogTailer {
    shared: Arc<Shared>,
    settings: Arc<dyn SettingsStore>,
    folders: Arc<dyn FolderProvider>,
    directory: Option<PathBuf>,
    monitor: Option<JoinHandle<()>>,
}

impl LogTailer {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        folders: Arc<dyn FolderProvider>,
        config: TailerSettings,
    ) -> (Self, TailerReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            config,
            tx,
            cursors: Mutex::new(CursorTable::new()),
            state: Mutex::new(TailerState::Idle),
            generation: AtomicU64::new(0),
        });
        let tailer = Self {
            shared,
            settings,
            folders,
            directory: None,
            monitor: None,
        };
        (tailer, rx)
    }

    pub fn state(&self) -> TailerState {
        self.shared.state()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Current read offset of a tracked file.
    pub fn cursor(&self, path: &Path) -> Option<u64> {
        self.shared.cursors().offset(path)
    }

    pub fn tracked_files(&self) -> Vec<PathBuf> {
        self.shared.cursors().paths()
    }

    /// The persisted directory, else the platform default.
    pub fn resolve_directory(&self) -> Option<PathBuf> {
        self.settings
            .get(JOURNAL_DIRECTORY_KEY)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| self.folders.try_default_path())
    }

    /// Set the directory used by the next `start`.
    pub fn configure(&mut self, directory: impl AsRef<Path>) -> Result<(), TailerError> {
        self.directory = Some(validate_directory(directory.as_ref())?);
        Ok(())
    }

    /// Track existing journals from their current length and begin watching.
    /// No-op while already monitoring.
    pub fn start(&mut self) -> Result<(), TailerError> {
        if self.state() == TailerState::Monitoring {
            return Ok(());
        }
        let directory = self.directory.clone().ok_or(TailerError::NotConfigured)?;
        let directory = validate_directory(&directory)?;

        if let Some(previous) = self.monitor.take() {
            previous.abort();
        }
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (watcher, events) = watch(&directory)?;

        let existing = self.shared.list_journals(&directory);
        {
            let mut cursors = self.shared.cursors();
            for (path, len) in &existing {
                cursors.track(path.clone(), *len);
            }
        }

        self.monitor = Some(tokio::spawn(monitor(
            self.shared.clone(),
            directory.clone(),
            watcher,
            events,
            generation,
        )));
        self.shared
            .set_state_if_current(generation, TailerState::Monitoring);
        tracing::info!(
            directory = %directory.display(),
            files = existing.len(),
            "Journal tailer started"
        );
        Ok(())
    }

    /// Stop watching. In-flight reads finish without effect. Cursors are kept.
    pub fn stop(&mut self) {
        {
            // Serialize with read commits so nothing is emitted after this
            let _cursors = self.shared.cursors();
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
        }
        let was_running = self.monitor.is_some();
        if let Some(handle) = self.monitor.take() {
            handle.abort();
        }
        if was_running || self.state() == TailerState::Error {
            self.shared.set_state(TailerState::Stopped);
            tracing::info!("Journal tailer stopped");
        }
    }

    /// Move to another directory: stop, forget all cursors, persist the new
    /// path and start again. On failure the previous directory is watched
    /// again; if that fails too the tailer is left stopped.
    pub fn restart(&mut self, directory: impl AsRef<Path>) -> Result<(), TailerError> {
        let attempted = validate_directory(directory.as_ref())?;
        let previous = self.directory.clone();

        self.stop();
        self.shared.cursors().clear();

        let outcome = match self.persist(&attempted) {
            Err(error) => Err((error, false)),
            Ok(()) => {
                self.directory = Some(attempted.clone());
                self.start().map_err(|error| (error, true))
            }
        };
        let (error, persisted) = match outcome {
            Ok(()) => {
                self.shared.send(TailerMessage::PathChanged {
                    old: previous,
                    new: attempted,
                    at: Utc::now(),
                });
                return Ok(());
            }
            Err(failure) => failure,
        };

        tracing::warn!(
            error = %error,
            directory = %attempted.display(),
            "Switching journal directory failed, rolling back"
        );
        self.stop();

        let Some(previous) = previous else {
            self.directory = None;
            self.shared.set_state(TailerState::Stopped);
            return Err(error);
        };

        // Only undo a write that actually happened
        if persisted {
            if let Err(restore) = self.persist(&previous) {
                tracing::warn!(
                    error = %restore,
                    directory = %previous.display(),
                    "Failed to restore stored journal directory"
                );
            }
        }
        self.directory = Some(previous.clone());

        match self.start() {
            Ok(()) => Err(error),
            Err(rollback) => {
                tracing::error!(
                    error = %rollback,
                    directory = %previous.display(),
                    "Rolling back journal directory failed"
                );
                self.stop();
                self.shared.set_state(TailerState::Stopped);
                Err(TailerError::RollbackFailed {
                    attempted,
                    previous,
                    source: Box::new(error),
                })
            }
        }
    }

    fn persist(&self, directory: &Path) -> Result<(), TailerError> {
        self.settings
            .set(JOURNAL_DIRECTORY_KEY, &directory.to_string_lossy())?;
        Ok(())
    }
}

impl Drop for LogTailer {
    fn drop(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.monitor.take() {
            handle.abort();
        }
    }
}

fn validate_directory(directory: &Path) -> Result<PathBuf, TailerError> {
    if directory.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(TailerError::EmptyPath);
    }
    if !directory.is_dir() {
        return Err(TailerError::DirectoryNotFound(directory.to_path_buf()));
    }
    Ok(directory.to_path_buf())
}

fn watch(directory: &Path) -> Result<(RecommendedWatcher, WatchEvents), TailerError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })?;
    watcher.watch(directory, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

// ─────────────────────────────────────────────────────────────────────────────
// Monitor task
// ─────────────────────────────────────────────────────────────────────────────

async fn monitor(
    shared: Arc<Shared>,
    directory: PathBuf,
    watcher: RecommendedWatcher,
    mut events: WatchEvents,
    generation: u64,
) {
    // Dropping the watcher detaches the notification handler
    let mut _watcher = watcher;

    while let Some(result) = events.recv().await {
        if !shared.is_current(generation) {
            return;
        }
        match result {
            Ok(event) => handle_fs_event(&shared, &event, generation),
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    directory = %directory.display(),
                    "Journal watch failed"
                );
                shared.send(TailerMessage::Error(error.to_string()));
                shared.set_state_if_current(generation, TailerState::Error);

                tokio::time::sleep(shared.restart_delay()).await;
                if !shared.is_current(generation) {
                    return;
                }

                match watch(&directory) {
                    Ok((watcher, rx)) => {
                        _watcher = watcher;
                        events = rx;
                        catch_up(&shared, &directory, generation);
                        shared.set_state_if_current(generation, TailerState::Monitoring);
                        tracing::info!(directory = %directory.display(), "Journal watch re-established");
                    }
                    Err(error) => {
                        tracing::error!(
                            error = %error,
                            directory = %directory.display(),
                            "Failed to re-establish journal watch"
                        );
                        shared.send(TailerMessage::Error(error.to_string()));
                        return;
                    }
                }
            }
        }
    }
}

fn handle_fs_event(shared: &Arc<Shared>, event: &Event, generation: u64) {
    let created = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(_) => false,
        _ => return,
    };
    for path in event.paths.iter().filter(|p| shared.is_journal(p)) {
        if created {
            register_new_file(shared, path, generation);
        } else if shared.cursors().contains(path) {
            schedule_read(shared, path, shared.debounce(), generation);
        } else {
            // Growth of a file whose creation we never saw
            register_new_file(shared, path, generation);
        }
    }
}

/// Pick up anything that happened while the watch was down.
fn catch_up(shared: &Arc<Shared>, directory: &Path, generation: u64) {
    for (path, _) in shared.list_journals(directory) {
        if shared.cursors().contains(&path) {
            schedule_read(shared, &path, shared.debounce(), generation);
        } else {
            register_new_file(shared, &path, generation);
        }
    }
}

fn register_new_file(shared: &Arc<Shared>, path: &Path, generation: u64) {
    {
        let mut cursors = shared.cursors();
        if !shared.is_current(generation) {
            return;
        }
        // Repeated create notifications for a file still at zero are noise
        if cursors.offset(path) != Some(0) {
            cursors.track(path.to_path_buf(), 0);
            tracing::info!(path = %path.display(), "New journal file");
            shared.send(TailerMessage::NewSessionFile(path.to_path_buf()));
        }
    }
    schedule_read(shared, path, shared.new_file_delay(), generation);
}

fn schedule_read(shared: &Arc<Shared>, path: &Path, delay: Duration, generation: u64) {
    {
        let mut cursors = shared.cursors();
        if !shared.is_current(generation) || !cursors.schedule(path) {
            return;
        }
    }
    let shared = shared.clone();
    let path = path.to_path_buf();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        read_file(shared, path, generation).await;
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Incremental reads
// ─────────────────────────────────────────────────────────────────────────────

enum NextStep {
    Continue(u64),
    Retry,
    Done,
}

async fn read_file(shared: Arc<Shared>, path: PathBuf, generation: u64) {
    let mut failures = 0;
    'claim: loop {
        let claimed = {
            let mut cursors = shared.cursors();
            if !shared.is_current(generation) {
                return;
            }
            cursors.begin_read(&path)
        };
        let Some(mut offset) = claimed else {
            return;
        };

        loop {
            let result = read_blocking(&path, offset).await;

            let next = {
                let mut cursors = shared.cursors();
                if !shared.is_current(generation) {
                    // Stale: leave the table to whoever owns it now
                    return;
                }
                match result {
                    Ok(appended) => {
                        failures = 0;
                        let next_offset = appended.next_offset;
                        if appended.truncated {
                            tracing::info!(path = %path.display(), "Journal file shrank, reading from start");
                            shared.send(TailerMessage::NewSessionFile(path.clone()));
                        }
                        for line in appended.lines {
                            if let Err(e) = &line.result {
                                tracing::warn!(error = %e, file = %line.file_name, "Skipping malformed journal line");
                            }
                            shared.send(TailerMessage::Line(line));
                        }
                        if cursors.finish_read(&path, Some(next_offset)) {
                            NextStep::Continue(next_offset)
                        } else {
                            NextStep::Done
                        }
                    }
                    Err(error) => {
                        failures += 1;
                        let gone = error.kind() == io::ErrorKind::NotFound;
                        tracing::warn!(
                            error = %error,
                            path = %path.display(),
                            attempt = failures,
                            "Journal read failed"
                        );
                        if cursors.finish_read(&path, None) {
                            NextStep::Continue(offset)
                        } else if !gone && failures < READ_ATTEMPTS {
                            NextStep::Retry
                        } else {
                            NextStep::Done
                        }
                    }
                }
            };

            match next {
                NextStep::Continue(next_offset) => offset = next_offset,
                NextStep::Retry => {
                    tokio::time::sleep(shared.restart_delay()).await;
                    continue 'claim;
                }
                NextStep::Done => return,
            }
        }
    }
}

async fn read_blocking(path: &Path, offset: u64) -> io::Result<AppendedLines> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_appended(&path, offset))
        .await
        .map_err(io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ConfigError, FixedFolder, MemorySettings};
    use crate::tailer::DecodedLine;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tokio::time::{Instant, timeout, timeout_at};

    const JOURNAL: &str = "Journal.2024-01-15T100000.01.log";
    const SCAN: &str = r#"{"timestamp":"2024-01-15T10:00:00Z","event":"Scan","BodyName":"Sol","BodyID":0,"StarType":"G"}"#;
    const MUSIC: &str = r#"{"timestamp":"2024-01-15T10:00:01Z","event":"Music","MusicTrack":"NoTrack"}"#;

    fn fast_settings() -> TailerSettings {
        TailerSettings {
            debounce_ms: 10,
            new_file_delay_ms: 20,
            restart_delay_ms: 20,
            ..TailerSettings::default()
        }
    }

    fn tailer_with(settings: Arc<dyn SettingsStore>) -> (LogTailer, TailerReceiver) {
        LogTailer::new(settings, Arc::new(FixedFolder(None)), fast_settings())
    }

    fn tailer() -> (LogTailer, TailerReceiver) {
        tailer_with(Arc::new(MemorySettings::new()))
    }

    fn append(path: &Path, text: &str) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }

    async fn next_message(rx: &mut TailerReceiver) -> TailerMessage {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for tailer")
            .expect("tailer channel closed")
    }

    async fn next_line(rx: &mut TailerReceiver) -> DecodedLine {
        loop {
            if let TailerMessage::Line(line) = next_message(rx).await {
                return line;
            }
        }
    }

    async fn assert_no_line(rx: &mut TailerReceiver, wait: Duration) {
        let deadline = Instant::now() + wait;
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Err(_) | Ok(None) => return,
                Ok(Some(TailerMessage::Line(line))) => panic!("unexpected line: {}", line.raw),
                Ok(Some(_)) => continue,
            }
        }
    }

    /// Every write fails with a real confy error (unparseable config file).
    struct FailingSettings {
        broken_file: tempfile::NamedTempFile,
    }

    impl FailingSettings {
        fn new() -> Self {
            let mut broken_file = tempfile::NamedTempFile::new().unwrap();
            broken_file.write_all(b"journal_directory = = nope").unwrap();
            Self { broken_file }
        }
    }

    impl SettingsStore for FailingSettings {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), ConfigError> {
            crate::context::AppConfig::load_from(self.broken_file.path())
                .map(|_| ())
                .map_err(|e| match e {
                    ConfigError::Load(source) => ConfigError::Store(source),
                    other => other,
                })
        }
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_paths() {
        let (mut tailer, _rx) = tailer();
        assert!(matches!(tailer.start(), Err(TailerError::NotConfigured)));
        assert!(matches!(tailer.configure(""), Err(TailerError::EmptyPath)));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            tailer.configure(&missing),
            Err(TailerError::DirectoryNotFound(p)) if p == missing
        ));
        assert_eq!(tailer.state(), TailerState::Idle);
    }

    #[tokio::test]
    async fn test_appended_lines_emitted_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JOURNAL);
        append(&path, &format!("{}\n", SCAN));
        let initial_len = std::fs::metadata(&path).unwrap().len();

        let (mut tailer, mut rx) = tailer();
        tailer.configure(dir.path()).unwrap();
        tailer.start().unwrap();
        assert_eq!(tailer.state(), TailerState::Monitoring);
        // Existing content is not replayed
        assert_eq!(tailer.cursor(&path), Some(initial_len));

        append(&path, &format!("{}\n{}\n{{\"timestamp\":", MUSIC, SCAN));
        let first = next_line(&mut rx).await;
        let second = next_line(&mut rx).await;
        assert_eq!(first.raw, MUSIC);
        assert_eq!(second.raw, SCAN);
        assert_eq!(first.file_name, JOURNAL);
        assert_no_line(&mut rx, Duration::from_millis(300)).await;
        assert_eq!(
            tailer.cursor(&path),
            Some(initial_len + (MUSIC.len() + SCAN.len() + 2) as u64)
        );

        // The partial line is emitted in full once completed
        append(&path, "\"2024-01-15T10:00:02Z\",\"event\":\"Shutdown\"}\n");
        let completed = next_line(&mut rx).await;
        assert_eq!(
            completed.raw,
            r#"{"timestamp":"2024-01-15T10:00:02Z","event":"Shutdown"}"#
        );
        assert!(completed.result.is_ok());
        assert_eq!(
            tailer.cursor(&path),
            Some(std::fs::metadata(&path).unwrap().len())
        );

        tailer.stop();
    }

    #[tokio::test]
    async fn test_new_file_and_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let (mut tailer, mut rx) = tailer();
        tailer.configure(dir.path()).unwrap();
        tailer.start().unwrap();

        let path = dir.path().join("Journal.2024-01-15T140000.01.log");
        append(&path, &format!("{}\nnot json at all\n{}\n", SCAN, MUSIC));
        // Unrelated files are ignored
        append(&dir.path().join("Status.json"), "{}\n");

        loop {
            match next_message(&mut rx).await {
                TailerMessage::NewSessionFile(p) => {
                    assert_eq!(p, path);
                    break;
                }
                TailerMessage::Line(line) => panic!("line before new file: {}", line.raw),
                _ => continue,
            }
        }
        let lines = [
            next_line(&mut rx).await,
            next_line(&mut rx).await,
            next_line(&mut rx).await,
        ];
        assert!(lines[0].result.is_ok());
        assert!(lines[1].result.is_err());
        assert_eq!(lines[1].raw, "not json at all");
        assert!(lines[2].result.is_ok());
        assert_no_line(&mut rx, Duration::from_millis(200)).await;

        tailer.stop();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_silences_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JOURNAL);
        append(&path, "");

        let (mut tailer, mut rx) = tailer();
        tailer.configure(dir.path()).unwrap();
        tailer.start().unwrap();
        tailer.stop();
        tailer.stop();
        assert_eq!(tailer.state(), TailerState::Stopped);

        append(&path, &format!("{}\n", SCAN));
        assert_no_line(&mut rx, Duration::from_millis(300)).await;

        // Cursors survive a plain stop
        assert_eq!(tailer.cursor(&path), Some(0));
        tailer.start().unwrap();
        assert_eq!(tailer.state(), TailerState::Monitoring);
        tailer.stop();
    }

    #[tokio::test]
    async fn test_restart_switches_directory_and_persists() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        append(&first.path().join(JOURNAL), &format!("{}\n", SCAN));

        let settings = Arc::new(MemorySettings::new());
        let (mut tailer, mut rx) = tailer_with(settings.clone());
        tailer.configure(first.path()).unwrap();
        tailer.start().unwrap();
        assert_eq!(tailer.tracked_files().len(), 1);

        // Validation fails before anything is torn down
        let missing = second.path().join("missing");
        assert!(matches!(
            tailer.restart(&missing),
            Err(TailerError::DirectoryNotFound(_))
        ));
        assert_eq!(tailer.state(), TailerState::Monitoring);
        assert_eq!(tailer.directory(), Some(first.path()));

        tailer.restart(second.path()).unwrap();
        assert_eq!(tailer.state(), TailerState::Monitoring);
        assert_eq!(tailer.directory(), Some(second.path()));
        assert!(tailer.tracked_files().is_empty());
        assert_eq!(
            settings.get(JOURNAL_DIRECTORY_KEY).map(PathBuf::from),
            Some(second.path().to_path_buf())
        );
        assert_eq!(
            tailer.resolve_directory(),
            Some(second.path().to_path_buf())
        );

        loop {
            if let TailerMessage::PathChanged { old, new, .. } = next_message(&mut rx).await {
                assert_eq!(old.as_deref(), Some(first.path()));
                assert_eq!(new, second.path());
                break;
            }
        }
        tailer.stop();
    }

    #[tokio::test]
    async fn test_failed_restart_rolls_back_to_previous_directory() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let path = first.path().join(JOURNAL);
        append(&path, "");

        let (mut tailer, mut rx) = tailer_with(Arc::new(FailingSettings::new()));
        tailer.configure(first.path()).unwrap();
        tailer.start().unwrap();

        let error = tailer.restart(second.path()).unwrap_err();
        assert!(matches!(error, TailerError::Settings(_)));
        assert_eq!(tailer.state(), TailerState::Monitoring);
        assert_eq!(tailer.directory(), Some(first.path()));

        // The previous directory is followed again
        append(&path, &format!("{}\n", SCAN));
        let line = next_line(&mut rx).await;
        assert!(line.result.is_ok());
        tailer.stop();
    }

    #[tokio::test]
    async fn test_failed_restart_and_rollback_leaves_stopped() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        let (mut tailer, _rx) = tailer_with(Arc::new(FailingSettings::new()));
        tailer.configure(first.path()).unwrap();
        tailer.start().unwrap();

        let previous_dir = first.path().to_path_buf();
        first.close().unwrap();

        let error = tailer.restart(second.path()).unwrap_err();
        match error {
            TailerError::RollbackFailed {
                attempted,
                previous,
                source,
            } => {
                assert_eq!(attempted, second.path());
                assert_eq!(previous, previous_dir);
                assert!(matches!(*source, TailerError::Settings(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(tailer.state(), TailerState::Stopped);
    }

    #[tokio::test]
    async fn test_resolve_directory_falls_back_to_folder_default() {
        let dir = tempfile::tempdir().unwrap();
        let (tailer, _rx) = LogTailer::new(
            Arc::new(MemorySettings::new().with(JOURNAL_DIRECTORY_KEY, "  ")),
            Arc::new(FixedFolder(Some(dir.path().to_path_buf()))),
            fast_settings(),
        );
        assert_eq!(tailer.resolve_directory(), Some(dir.path().to_path_buf()));
    }
}
