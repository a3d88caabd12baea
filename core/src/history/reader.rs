use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate, Utc};
use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::prelude::*;
use starlog_types::{HistorySettings, TailerSettings};
use tokio::sync::{Mutex, Semaphore};

use crate::journal::{JournalEvent, JournalRecord, decode};

use super::HistoryError;
use super::session_group::{SessionGroup, discover_groups};

#[derive(Debug)]
struct CachedGroup {
    group: SessionGroup,
    /// Time-sorted.
    events: Arc<Vec<JournalEvent>>,
}

#[derive(Debug, Default)]
struct Snapshot {
    /// Taken when the rebuild started, so writes racing it invalidate it.
    built_at: Option<SystemTime>,
    groups: Arc<Vec<CachedGroup>>,
}

impl Snapshot {
    fn covers(&self, listing: &[SessionGroup]) -> bool {
        let Some(built_at) = self.built_at else {
            return false;
        };
        let newest = listing.iter().filter_map(SessionGroup::modified).max();
        let same_files = self.groups.len() == listing.len()
            && self
                .groups
                .iter()
                .zip(listing)
                .all(|(cached, listed)| cached.group.paths() == listed.paths());
        same_files && newest.is_none_or(|newest| newest < built_at)
    }

    fn reusable(&self, group: &SessionGroup) -> Option<Arc<Vec<JournalEvent>>> {
        let built_at = self.built_at?;
        let cached = self.groups.iter().find(|c| c.group.key == group.key)?;
        let unchanged = cached.group.paths() == group.paths()
            && group.modified().is_none_or(|m| m < built_at);
        unchanged.then(|| Arc::clone(&cached.events))
    }
}

/// Clears the rebuilding flag however the rebuild ends.
struct RebuildFlag<'a>(&'a AtomicBool);

impl<'a> RebuildFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RebuildFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Typed queries over every journal in a directory.
///
/// Decoded sessions are cached per group and only re-read once a file in the
/// group changes. Concurrent callers share a single rebuild.
pub struct JournalHistory {
    directory: PathBuf,
    settings: HistorySettings,
    files: TailerSettings,
    snapshot: RwLock<Snapshot>,
    gate: Mutex<()>,
    rebuilding: AtomicBool,
}

impl JournalHistory {
    pub fn new(
        directory: impl Into<PathBuf>,
        settings: HistorySettings,
        files: TailerSettings,
    ) -> Self {
        Self {
            directory: directory.into(),
            settings,
            files,
            snapshot: RwLock::new(Snapshot::default()),
            gate: Mutex::new(()),
            rebuilding: AtomicBool::new(false),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding.load(Ordering::SeqCst)
    }

    /// Current session groups, oldest first. Lists the directory without
    /// decoding anything.
    pub async fn session_groups(&self) -> Result<Vec<SessionGroup>, HistoryError> {
        self.list().await
    }

    /// Records from today's sessions, or from the most recent session when
    /// today has none of type `T`.
    pub async fn latest_session_events<T: JournalRecord>(&self) -> Result<Vec<T>, HistoryError> {
        self.latest_session_events_on(Local::now().date_naive())
            .await
    }

    /// [`latest_session_events`](Self::latest_session_events) with an explicit
    /// notion of "today" (local date).
    pub async fn latest_session_events_on<T: JournalRecord>(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<T>, HistoryError> {
        let groups = self.cached_groups().await?;

        let todays = groups
            .iter()
            .filter(|cached| cached.group.started.is_some_and(|s| s.date() == today));
        let records = extract(&merged(todays, |_| true));
        if !records.is_empty() {
            return Ok(records);
        }

        Ok(groups
            .last()
            .map(|latest| extract(&latest.events))
            .unwrap_or_default())
    }

    /// Every record of type `T` across all sessions, time-sorted.
    pub async fn all_events<T: JournalRecord>(&self) -> Result<Vec<T>, HistoryError> {
        let groups = self.cached_groups().await?;
        Ok(extract(&merged(groups.iter(), |_| true)))
    }

    /// Records with `from <= timestamp <= to`; an absent `to` is open-ended.
    pub async fn events_in_range<T: JournalRecord>(
        &self,
        from: DateTime<Utc>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<T>, HistoryError> {
        let groups = self.cached_groups().await?;
        let in_range = |event: &JournalEvent| {
            event.timestamp >= from && to.is_none_or(|to| event.timestamp <= to)
        };
        Ok(extract(&merged(groups.iter(), in_range)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cache
    // ─────────────────────────────────────────────────────────────────────────

    async fn list(&self) -> Result<Vec<SessionGroup>, HistoryError> {
        let directory = self.directory.clone();
        let files = self.files.clone();
        tokio::task::spawn_blocking(move || discover_groups(&directory, &files)).await?
    }

    fn fresh(&self, listing: &[SessionGroup]) -> Option<Arc<Vec<CachedGroup>>> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        snapshot
            .covers(listing)
            .then(|| Arc::clone(&snapshot.groups))
    }

    async fn cached_groups(&self) -> Result<Arc<Vec<CachedGroup>>, HistoryError> {
        let listing = self.list().await?;
        if let Some(groups) = self.fresh(&listing) {
            return Ok(groups);
        }

        let _gate = self.gate.lock().await;
        // Whoever held the gate may already have rebuilt
        let listing = self.list().await?;
        if let Some(groups) = self.fresh(&listing) {
            return Ok(groups);
        }

        let _flag = RebuildFlag::raise(&self.rebuilding);
        self.rebuild(listing).await
    }

    async fn rebuild(
        &self,
        listing: Vec<SessionGroup>,
    ) -> Result<Arc<Vec<CachedGroup>>, HistoryError> {
        let built_at = SystemTime::now();
        let permits = Arc::new(Semaphore::new(self.parallelism()));
        let chunk_lines = self.settings.decode_chunk_lines.max(1);

        let mut pending = Vec::with_capacity(listing.len());
        let mut reused = 0usize;
        for group in listing {
            let cached = self
                .snapshot
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .reusable(&group);
            if let Some(events) = cached {
                reused += 1;
                pending.push((group, Pending::Ready(events)));
                continue;
            }

            // The semaphore is local and never closed
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let paths: Vec<PathBuf> = group.files.iter().map(|f| f.path.clone()).collect();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                decode_group(&paths, chunk_lines)
            });
            pending.push((group, Pending::Decoding(handle)));
        }

        let mut groups = Vec::with_capacity(pending.len());
        for (group, events) in pending {
            let events = match events {
                Pending::Ready(events) => events,
                Pending::Decoding(handle) => Arc::new(handle.await?),
            };
            groups.push(CachedGroup { group, events });
        }

        let groups = Arc::new(groups);
        tracing::debug!(
            directory = %self.directory.display(),
            groups = groups.len(),
            reused,
            "Journal history rebuilt"
        );

        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *snapshot = Snapshot {
            built_at: Some(built_at),
            groups: Arc::clone(&groups),
        };
        Ok(groups)
    }

    fn parallelism(&self) -> usize {
        match self.settings.max_parallel_groups {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }
}

enum Pending {
    Ready(Arc<Vec<JournalEvent>>),
    Decoding(tokio::task::JoinHandle<Vec<JournalEvent>>),
}

/// Events of the selected groups passing `keep`, time-sorted.
fn merged<'a>(
    groups: impl Iterator<Item = &'a CachedGroup>,
    keep: impl Fn(&JournalEvent) -> bool,
) -> Vec<JournalEvent> {
    let mut events: Vec<JournalEvent> = groups
        .flat_map(|cached| cached.events.iter())
        .filter(|event| keep(event))
        .cloned()
        .collect();
    events.sort_by_key(|event| event.timestamp);
    events
}

fn extract<T: JournalRecord>(events: &[JournalEvent]) -> Vec<T> {
    events.iter().filter_map(T::from_event).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decode every part of one session in order. Unreadable files and malformed
/// lines are logged and skipped.
fn decode_group(paths: &[PathBuf], chunk_lines: usize) -> Vec<JournalEvent> {
    let mut events = Vec::new();
    for path in paths {
        match read_journal_file(path, chunk_lines) {
            Ok(mut decoded) => events.append(&mut decoded),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable journal file");
            }
        }
    }
    events.sort_by_key(|event| event.timestamp);
    events
}

fn read_journal_file(path: &Path, chunk_lines: usize) -> io::Result<Vec<JournalEvent>> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    // SAFETY: the game only ever appends; a concurrent append past the mapped
    // length is not observed.
    let mmap = unsafe { Mmap::map(&file)? };
    let bytes = mmap.as_ref();

    let line_ranges = line_ranges(bytes);

    let mut events = Vec::with_capacity(line_ranges.len());
    for chunk in line_ranges.chunks(chunk_lines) {
        let decoded: Vec<JournalEvent> = chunk
            .par_iter()
            .filter_map(|&(number, start, end)| {
                let line = &bytes[start..end];
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                if line.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
                let text = String::from_utf8_lossy(line);
                match decode(&text) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            line = number,
                            error = %e,
                            "Skipping malformed journal line"
                        );
                        None
                    }
                }
            })
            .collect();
        events.extend(decoded);
    }
    Ok(events)
}

/// Non-empty lines as `(line number, start, end)`, numbered from 1 and
/// counting the empty lines skipped in between.
fn line_ranges(bytes: &[u8]) -> Vec<(usize, usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut number = 0;
    for end in memchr_iter(b'\n', bytes) {
        number += 1;
        if end > start {
            ranges.push((number, start, end));
        }
        start = end + 1;
    }
    if start < bytes.len() {
        ranges.push((number + 1, start, bytes.len()));
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{EventKind, ScanEvent};
    use chrono::TimeZone;

    fn line(ts: &str, event: &str, extra: &str) -> String {
        format!(r#"{{"timestamp":"{ts}","event":"{event}"{extra}}}"#)
    }

    fn scan(ts: &str, name: &str, id: i64) -> String {
        line(
            ts,
            "Scan",
            &format!(r#","BodyName":"{name}","BodyID":{id},"StarSystem":"Sol","StarType":"G""#),
        )
    }

    fn write_journal(dir: &Path, name: &str, lines: &[String]) {
        let mut body = lines.join("\n");
        body.push('\n');
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn history(dir: &Path) -> JournalHistory {
        JournalHistory::new(dir, HistorySettings::default(), TailerSettings::default())
    }

    fn names(scans: &[ScanEvent]) -> Vec<&str> {
        scans.iter().map(|s| s.body_name.as_str()).collect()
    }

    #[test]
    fn test_line_numbers_count_blank_lines() {
        let bytes = b"{\"a\":1}\n\n\r\n{\"b\":2}\n\n{\"c\":3}";
        let numbers: Vec<usize> = line_ranges(bytes).iter().map(|r| r.0).collect();
        // The "\r" line is kept here and dropped at decode time
        assert_eq!(numbers, vec![1, 3, 4, 6]);
        let (_, start, end) = line_ranges(bytes)[3];
        assert_eq!(&bytes[start..end], b"{\"c\":3}");
    }

    #[tokio::test]
    async fn test_latest_falls_back_to_most_recent_group() {
        let dir = tempfile::tempdir().unwrap();
        write_journal(
            dir.path(),
            "Journal.2024-01-14T090000.01.log",
            &[scan("2024-01-14T09:00:00Z", "Old", 0)],
        );
        write_journal(
            dir.path(),
            "Journal.2024-01-15T100000.01.log",
            &[scan("2024-01-15T10:00:00Z", "Newer", 0)],
        );

        let today = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let scans: Vec<ScanEvent> = history(dir.path())
            .latest_session_events_on(today)
            .await
            .unwrap();
        assert_eq!(names(&scans), vec!["Newer"]);
    }

    #[tokio::test]
    async fn test_latest_merges_todays_groups_in_time_order() {
        let dir = tempfile::tempdir().unwrap();
        write_journal(
            dir.path(),
            "Journal.2024-01-14T090000.01.log",
            &[scan("2024-01-14T09:00:00Z", "Yesterday", 0)],
        );
        write_journal(
            dir.path(),
            "Journal.2024-01-15T100000.01.log",
            &[scan("2024-01-15T10:00:05Z", "Morning", 0)],
        );
        write_journal(
            dir.path(),
            "Journal.2024-01-15T100000.02.log",
            &[scan("2024-01-15T10:30:00Z", "Morning part two", 1)],
        );
        write_journal(
            dir.path(),
            "Journal.2024-01-15T200000.01.log",
            &[scan("2024-01-15T20:00:00Z", "Evening", 0)],
        );

        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let scans: Vec<ScanEvent> = history(dir.path())
            .latest_session_events_on(today)
            .await
            .unwrap();
        assert_eq!(names(&scans), vec!["Morning", "Morning part two", "Evening"]);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_journal(
            dir.path(),
            "Journal.2024-01-15T100000.01.log",
            &[
                line("2024-01-15T10:00:00Z", "Fileheader", r#","part":1"#),
                "{not json".to_string(),
                String::new(),
                scan("2024-01-15T10:00:01Z", "Sol", 0),
            ],
        );

        let events: Vec<JournalEvent> = history(dir.path()).all_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), EventKind::FileHeader);
        assert_eq!(events[1].kind(), EventKind::Scan);
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_spans_groups() {
        let dir = tempfile::tempdir().unwrap();
        write_journal(
            dir.path(),
            "Journal.2024-01-14T090000.01.log",
            &[
                scan("2024-01-14T09:00:00Z", "A", 0),
                scan("2024-01-14T12:00:00Z", "B", 1),
            ],
        );
        write_journal(
            dir.path(),
            "Journal.2024-01-15T100000.01.log",
            &[
                scan("2024-01-15T10:00:00Z", "C", 0),
                scan("2024-01-15T11:00:00Z", "D", 1),
            ],
        );
        let history = history(dir.path());

        let from = Utc.with_ymd_and_hms(2024, 1, 14, 12, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let bounded: Vec<ScanEvent> = history.events_in_range(from, Some(to)).await.unwrap();
        assert_eq!(names(&bounded), vec!["B", "C"]);

        let open: Vec<ScanEvent> = history.events_in_range(from, None).await.unwrap();
        assert_eq!(names(&open), vec!["B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_new_session_file_invalidates_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_journal(
            dir.path(),
            "Journal.2024-01-14T090000.01.log",
            &[scan("2024-01-14T09:00:00Z", "First", 0)],
        );
        let history = history(dir.path());

        let (a, b) = tokio::join!(
            history.all_events::<ScanEvent>(),
            history.all_events::<ScanEvent>()
        );
        assert_eq!(names(&a.unwrap()), vec!["First"]);
        assert_eq!(names(&b.unwrap()), vec!["First"]);
        assert!(!history.is_rebuilding());

        write_journal(
            dir.path(),
            "Journal.2024-01-15T100000.01.log",
            &[scan("2024-01-15T10:00:00Z", "Second", 0)],
        );
        let scans: Vec<ScanEvent> = history.all_events().await.unwrap();
        assert_eq!(names(&scans), vec!["First", "Second"]);
        assert_eq!(history.session_groups().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let history = history(&dir.path().join("gone"));
        let err = history.all_events::<JournalEvent>().await.unwrap_err();
        assert!(matches!(err, HistoryError::DirectoryNotFound(_)));
    }
}
