use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDateTime;
use starlog_types::TailerSettings;

use super::HistoryError;

/// Embedded stamp formats, current first.
const STAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H%M%S", "%y%m%d%H%M%S"];

/// Components of a journal file name such as `Journal.2024-01-15T100000.01.log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalName {
    /// Raw stamp text; files sharing it belong to one session.
    pub stamp: String,
    /// Parsed stamp (local time). `None` when the text matches no known format.
    pub started: Option<NaiveDateTime>,
    pub part: u32,
}

/// Split a bare file name. Returns `None` for names outside the journal
/// pattern; an unparseable stamp is not an error.
pub fn parse_journal_name(name: &str, files: &TailerSettings) -> Option<JournalName> {
    if !files.matches_file_name(name) {
        return None;
    }
    let stem = name
        .strip_prefix(files.file_prefix.as_str())?
        .strip_suffix(files.file_extension.as_str())?
        .strip_suffix('.')?;

    let (stamp, part) = match stem.rsplit_once('.') {
        Some((stamp, part)) if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) => {
            (stamp, part.parse().unwrap_or(1))
        }
        _ => (stem, 1),
    };

    let started = STAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(stamp, format).ok());

    Some(JournalName {
        stamp: stamp.to_string(),
        started,
        part,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalFile {
    pub path: PathBuf,
    pub part: u32,
    pub modified: Option<SystemTime>,
}

/// All parts of one game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGroup {
    /// Group identity: the shared stamp text.
    pub key: String,
    /// Identity timestamp. `None` sorts before every parsed stamp.
    pub started: Option<NaiveDateTime>,
    /// Files in read order (ascending part).
    pub files: Vec<JournalFile>,
}

impl SessionGroup {
    /// Latest modification time of any part.
    pub fn modified(&self) -> Option<SystemTime> {
        self.files.iter().filter_map(|f| f.modified).max()
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.files.iter().map(|f| f.path.as_path()).collect()
    }
}

/// Group `(path, modified)` pairs into sessions ordered oldest first.
pub fn group_files(
    entries: impl IntoIterator<Item = (PathBuf, Option<SystemTime>)>,
    files: &TailerSettings,
) -> Vec<SessionGroup> {
    let mut groups: Vec<SessionGroup> = Vec::new();
    for (path, modified) in entries {
        let Some(name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| parse_journal_name(n, files))
        else {
            continue;
        };
        let file = JournalFile {
            path,
            part: name.part,
            modified,
        };
        match groups.iter_mut().find(|g| g.key == name.stamp) {
            Some(group) => group.files.push(file),
            None => groups.push(SessionGroup {
                key: name.stamp,
                started: name.started,
                files: vec![file],
            }),
        }
    }

    for group in &mut groups {
        group
            .files
            .sort_by(|a, b| a.part.cmp(&b.part).then_with(|| a.path.cmp(&b.path)));
    }
    groups.sort_by(|a, b| a.started.cmp(&b.started).then_with(|| a.key.cmp(&b.key)));
    groups
}

/// List and group the journal files of `directory`. Blocking.
pub(crate) fn discover_groups(
    directory: &Path,
    files: &TailerSettings,
) -> Result<Vec<SessionGroup>, HistoryError> {
    if !directory.is_dir() {
        return Err(HistoryError::DirectoryNotFound(directory.to_path_buf()));
    }
    let entries = std::fs::read_dir(directory).map_err(|source| HistoryError::Io {
        path: directory.to_path_buf(),
        source,
    })?;

    let listed = entries.filter_map(Result::ok).filter_map(|entry| {
        let metadata = entry.metadata().ok().filter(|m| m.is_file())?;
        Some((entry.path(), metadata.modified().ok()))
    });
    Ok(group_files(listed, files))
}
