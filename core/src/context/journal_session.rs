use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use starlog_types::TailerSettings;

use crate::events::{EventProcessor, JournalSignal, SignalHandler};
use crate::history::{HistoryError, JournalHistory, parse_journal_name};
use crate::journal::JournalEvent;
use crate::state::SessionState;
use crate::system::SystemTree;
use crate::tailer::TailerMessage;

/// Live state of one game session, fed from the history reader and the
/// tailer.
pub struct JournalSession {
    active_file: Option<PathBuf>,
    files: TailerSettings,
    state: SessionState,
    processor: EventProcessor,
    signal_handlers: Vec<Box<dyn SignalHandler + Send + Sync>>,
}

impl Default for JournalSession {
    fn default() -> Self {
        Self::new(TailerSettings::default())
    }
}

impl JournalSession {
    /// `files` describes the journal naming scheme, used to tell a new
    /// session from a continuation part.
    pub fn new(files: TailerSettings) -> Self {
        Self {
            active_file: None,
            files,
            state: SessionState::new(),
            processor: EventProcessor::new(),
            signal_handlers: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active_file(&self) -> Option<&Path> {
        self.active_file.as_deref()
    }

    /// Tree from the last rebuild, if any.
    pub fn system_tree(&self) -> Option<Arc<SystemTree>> {
        self.state.map.tree()
    }

    /// Register a signal handler to receive journal signals
    pub fn add_signal_handler(&mut self, handler: Box<dyn SignalHandler + Send + Sync>) {
        self.signal_handlers.push(handler);
    }

    /// Process a single event, rebuild the map if it changed, and dispatch
    pub fn process_event(&mut self, event: JournalEvent) {
        let timestamp = event.timestamp;
        let mut signals = self.processor.process_event(event, &mut self.state);
        signals.extend(self.processor.rebuild_if_dirty(&mut self.state, timestamp));
        self.dispatch_signals(&signals);
    }

    /// Process multiple events with a single trailing rebuild
    pub fn process_events(&mut self, events: Vec<JournalEvent>) {
        let Some(last) = events.last().map(|e| e.timestamp) else {
            return;
        };
        let mut all_signals = Vec::new();
        for event in events {
            let signals = self.processor.process_event(event, &mut self.state);
            all_signals.extend(signals);
        }
        all_signals.extend(self.processor.rebuild_if_dirty(&mut self.state, last));

        self.dispatch_signals(&all_signals);
    }

    pub fn handle_tailer_message(&mut self, message: TailerMessage) {
        match message {
            TailerMessage::Line(line) => match line.result {
                Ok(event) => self.process_event(event),
                Err(e) => {
                    tracing::warn!(
                        file = %line.file_name,
                        error = %e,
                        line = %e.excerpt(),
                        "Skipping undecodable journal line"
                    );
                }
            },
            TailerMessage::NewSessionFile(path) => self.enter_file(path),
            TailerMessage::PathChanged { old, new, .. } => {
                tracing::info!(
                    old = ?old.as_deref().map(Path::display),
                    new = %new.display(),
                    "Journal directory changed, session reset"
                );
                self.active_file = None;
                self.state.reset();
            }
            TailerMessage::StateChanged(state) => {
                tracing::debug!(state = ?state, "Tailer state changed");
            }
            TailerMessage::Error(message) => {
                tracing::warn!(error = %message, "Tailer reported an error");
            }
        }
    }

    /// Replay the most recent session from disk.
    pub async fn seed_from_history(
        &mut self,
        history: &JournalHistory,
    ) -> Result<usize, HistoryError> {
        self.seed_from_history_on(history, Local::now().date_naive())
            .await
    }

    /// [`seed_from_history`](Self::seed_from_history) with an explicit local
    /// date for "today". Returns the number of replayed events.
    pub async fn seed_from_history_on(
        &mut self,
        history: &JournalHistory,
        today: NaiveDate,
    ) -> Result<usize, HistoryError> {
        let events: Vec<JournalEvent> = history.latest_session_events_on(today).await?;
        let latest_file = history
            .session_groups()
            .await?
            .last()
            .and_then(|group| group.files.last())
            .map(|file| file.path.clone());

        let count = events.len();
        self.state.reset();
        self.process_events(events);
        self.active_file = latest_file;
        tracing::info!(events = count, file = ?self.active_file, "Session seeded from history");
        Ok(count)
    }

    /// A continuation part keeps the session; any other file starts over.
    fn enter_file(&mut self, path: PathBuf) {
        let stamp_of = |p: &Path| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| parse_journal_name(n, &self.files))
                .map(|name| name.stamp)
        };
        let continues = match (&self.active_file, stamp_of(&path)) {
            (Some(active), Some(stamp)) => stamp_of(active).is_some_and(|s| s == stamp),
            _ => false,
        };
        // A truncated file is announced again under the same path
        let same_file = self.active_file.as_deref() == Some(path.as_path());

        if same_file || !continues {
            tracing::info!(file = %path.display(), "New journal session");
            self.state.reset();
        } else {
            tracing::debug!(file = %path.display(), "Journal continues in next part");
        }
        self.active_file = Some(path);
    }

    fn dispatch_signals(&mut self, signals: &[JournalSignal]) {
        if signals.is_empty() {
            return;
        }
        for handler in &mut self.signal_handlers {
            handler.handle_signals(signals);
        }
    }
}
