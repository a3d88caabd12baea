use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use memchr::{memchr_iter, memrchr};

use crate::journal::decode;

use super::DecodedLine;

/// Complete lines appended since a cursor.
#[derive(Debug)]
pub(crate) struct AppendedLines {
    pub lines: Vec<DecodedLine>,
    /// Offset just past the last consumed newline.
    pub next_offset: u64,
    /// The file was shorter than the cursor and was read from the start.
    pub truncated: bool,
}

/// Read whole lines from `cursor` to the current end of file.
///
/// A trailing line without its newline is left for the next call. Blank
/// lines are consumed without producing output. Blocking; run it on the
/// blocking pool.
pub(crate) fn read_appended(path: &Path, cursor: u64) -> io::Result<AppendedLines> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let (start, truncated) = if len < cursor {
        (0, true)
    } else {
        (cursor, false)
    };

    let mut buf = Vec::with_capacity(usize::try_from(len - start).unwrap_or(0));
    if len > start {
        file.seek(SeekFrom::Start(start))?;
        (&mut file).take(len - start).read_to_end(&mut buf)?;
    }

    let Some(last_newline) = memrchr(b'\n', &buf) else {
        return Ok(AppendedLines {
            lines: Vec::new(),
            next_offset: start,
            truncated,
        });
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let complete = &buf[..=last_newline];
    let mut lines = Vec::new();
    let mut line_start = 0;
    for end in memchr_iter(b'\n', complete) {
        let bytes = &complete[line_start..end];
        line_start = end + 1;
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let raw = String::from_utf8_lossy(bytes).into_owned();
        let result = decode(&raw);
        lines.push(DecodedLine {
            file_name: file_name.clone(),
            raw,
            result,
        });
    }

    Ok(AppendedLines {
        lines,
        next_offset: start + last_newline as u64 + 1,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCAN: &str = r#"{"timestamp":"2024-01-15T10:00:00Z","event":"Scan","BodyName":"Sol","BodyID":0,"StarType":"G"}"#;
    const MUSIC: &str = r#"{"timestamp":"2024-01-15T10:00:01Z","event":"Music","MusicTrack":"NoTrack"}"#;

    #[test]
    fn test_partial_line_is_left_unconsumed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.2024-01-15T100000.01.log");
        let mut file = File::create(&path).unwrap();
        write!(file, "{}\r\n{}\n{{\"timestamp\":", SCAN, MUSIC).unwrap();

        let read = read_appended(&path, 0).unwrap();
        assert_eq!(read.lines.len(), 2);
        assert_eq!(read.lines[0].raw, SCAN);
        assert_eq!(read.lines[0].file_name, "Journal.2024-01-15T100000.01.log");
        assert!(read.lines[1].result.is_ok());
        let consumed = (SCAN.len() + 2 + MUSIC.len() + 1) as u64;
        assert_eq!(read.next_offset, consumed);
        assert!(!read.truncated);

        // Nothing new until the line completes
        let again = read_appended(&path, consumed).unwrap();
        assert!(again.lines.is_empty());
        assert_eq!(again.next_offset, consumed);

        writeln!(file, "\"2024-01-15T10:00:02Z\",\"event\":\"Shutdown\"}}").unwrap();
        let completed = read_appended(&path, consumed).unwrap();
        assert_eq!(completed.lines.len(), 1);
        assert!(completed.lines[0].raw.starts_with("{\"timestamp\":"));
        assert_eq!(completed.next_offset, file.metadata().unwrap().len());
    }

    #[test]
    fn test_malformed_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.2024-01-15T100000.01.log");
        std::fs::write(&path, format!("{}\n\nnot json\n{}\n", SCAN, MUSIC)).unwrap();

        let read = read_appended(&path, 0).unwrap();
        assert_eq!(read.lines.len(), 3);
        assert!(read.lines[1].result.is_err());
        assert_eq!(read.lines[1].raw, "not json");
    }

    #[test]
    fn test_shrunk_file_reads_from_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.2024-01-15T100000.01.log");
        std::fs::write(&path, format!("{}\n", MUSIC)).unwrap();

        let read = read_appended(&path, 10_000).unwrap();
        assert!(read.truncated);
        assert_eq!(read.lines.len(), 1);
        assert_eq!(read.next_offset, (MUSIC.len() + 1) as u64);
    }
}
