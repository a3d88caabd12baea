use std::path::{Path, PathBuf};

use hashbrown::HashMap;

#[derive(Debug, Default, Clone)]
struct FileCursor {
    offset: u64,
    /// A debounced read is pending.
    scheduled: bool,
    /// A read is in flight; other readers back off.
    reading: bool,
    /// Data arrived during the in-flight read; the reader goes again.
    rerun: bool,
}

/// Per-file read offsets plus the flags that keep reads of one file
/// sequential. Only ever mutated under the tailer's mutex, never across I/O.
#[derive(Debug, Default)]
pub struct CursorTable {
    files: HashMap<PathBuf, FileCursor>,
}

impl CursorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn offset(&self, path: &Path) -> Option<u64> {
        self.files.get(path).map(|c| c.offset)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Track `path` from `offset`, replacing any previous entry.
    pub fn track(&mut self, path: PathBuf, offset: u64) {
        self.files.insert(
            path,
            FileCursor {
                offset,
                ..FileCursor::default()
            },
        );
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Mark a debounced read as pending. Returns `false` when one already is,
    /// in which case the caller's notification is coalesced into it.
    pub fn schedule(&mut self, path: &Path) -> bool {
        match self.files.get_mut(path) {
            Some(cursor) if cursor.scheduled => false,
            Some(cursor) => {
                cursor.scheduled = true;
                true
            }
            None => false,
        }
    }

    /// Claim the file for reading and return the offset to read from. When a
    /// read is already in flight it is asked to run again instead.
    pub fn begin_read(&mut self, path: &Path) -> Option<u64> {
        let cursor = self.files.get_mut(path)?;
        cursor.scheduled = false;
        if cursor.reading {
            cursor.rerun = true;
            return None;
        }
        cursor.reading = true;
        cursor.rerun = false;
        Some(cursor.offset)
    }

    /// Release the claim, moving the cursor to `next_offset` when given.
    /// Returns whether another pass was requested meanwhile.
    pub fn finish_read(&mut self, path: &Path, next_offset: Option<u64>) -> bool {
        let Some(cursor) = self.files.get_mut(path) else {
            return false;
        };
        if let Some(offset) = next_offset {
            cursor.offset = offset;
        }
        cursor.reading = false;
        let rerun = cursor.rerun;
        if rerun {
            // The next pass claims the file straight away
            cursor.reading = true;
            cursor.rerun = false;
        }
        rerun
    }
}
