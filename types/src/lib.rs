//! Shared configuration types for starlog.
//!
//! These are plain serde structs so they can be embedded in the persisted
//! application config and in any presentation layer without pulling in the
//! core's runtime dependencies.

pub mod formatting;

use serde::{Deserialize, Serialize};

/// Settings key under which the journal directory is persisted.
pub const JOURNAL_DIRECTORY_KEY: &str = "journal_directory";

/// Tuning for the live journal tailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailerSettings {
    /// Filename prefix of journal files (`Journal.` in `Journal.<stamp>.<part>.log`).
    pub file_prefix: String,
    /// Filename extension, without the dot.
    pub file_extension: String,
    /// Window in which change notifications for one file are coalesced.
    pub debounce_ms: u64,
    /// Delay before the first read of a freshly created file.
    pub new_file_delay_ms: u64,
    /// Delay before re-establishing monitoring after a watch error.
    pub restart_delay_ms: u64,
}

impl Default for TailerSettings {
    fn default() -> Self {
        Self {
            file_prefix: "Journal.".to_string(),
            file_extension: "log".to_string(),
            debounce_ms: 50,
            new_file_delay_ms: 250,
            restart_delay_ms: 1_000,
        }
    }
}

impl TailerSettings {
    /// Whether a bare file name matches the configured journal pattern
    /// (`<prefix>*.<extension>`).
    pub fn matches_file_name(&self, name: &str) -> bool {
        let Some(rest) = name.strip_prefix(self.file_prefix.as_str()) else {
            return false;
        };
        rest.strip_suffix(self.file_extension.as_str())
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty())
    }
}

/// Tuning for historical (catch-up) reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Lines decoded per slice before the decoder moves on to the next one.
    pub decode_chunk_lines: usize,
    /// Upper bound on concurrently decoded session groups. `0` means
    /// "number of available processors".
    pub max_parallel_groups: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            decode_chunk_lines: 1_000,
            max_parallel_groups: 0,
        }
    }
}

/// Presentation hints passed explicitly to display helpers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayContext {
    /// Swap `.` and `,` in formatted numbers.
    pub european: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_journal_file_names() {
        let settings = TailerSettings::default();
        assert!(settings.matches_file_name("Journal.2024-01-15T100000.01.log"));
        assert!(settings.matches_file_name("Journal.170101120000.01.log"));
        assert!(!settings.matches_file_name("Journal..log"));
        assert!(!settings.matches_file_name("Status.json"));
        assert!(!settings.matches_file_name("Journal.2024-01-15T100000.01.log.bak"));
        assert!(!settings.matches_file_name("journal.2024-01-15T100000.01.log"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: TailerSettings = toml::from_str("debounce_ms = 120").unwrap();
        assert_eq!(settings.debounce_ms, 120);
        assert_eq!(settings.file_prefix, "Journal.");
        assert_eq!(settings.restart_delay_ms, 1_000);

        let history: HistorySettings = toml::from_str("").unwrap();
        assert_eq!(history, HistorySettings::default());
    }

    #[test]
    fn test_settings_toml_roundtrip() {
        let settings = TailerSettings {
            file_prefix: "Log.".to_string(),
            ..TailerSettings::default()
        };
        let text = toml::to_string(&settings).unwrap();
        let back: TailerSettings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
}
