use std::path::{Path, PathBuf};

/// Supplies a platform default journal directory.
pub trait FolderProvider: Send + Sync {
    fn try_default_path(&self) -> Option<PathBuf>;
}

/// Game journal location relative to the user's home directory.
const SAVED_GAMES_SUBDIR: &str = "Saved Games/Frontier Developments/Elite Dangerous";

/// Steam Proton prefix holding the Windows user profile on Linux.
#[cfg(target_os = "linux")]
const PROTON_PROFILE: &str =
    ".local/share/Steam/steamapps/compatdata/359320/pfx/drive_c/users/steamuser";

/// Well-known journal directory for the current platform. Only existing
/// directories are returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct JournalFolder;

impl JournalFolder {
    fn candidates(home: &Path) -> Vec<PathBuf> {
        #[allow(unused_mut)]
        let mut paths = vec![home.join(SAVED_GAMES_SUBDIR)];
        #[cfg(target_os = "linux")]
        paths.push(home.join(PROTON_PROFILE).join(SAVED_GAMES_SUBDIR));
        paths
    }
}

impl FolderProvider for JournalFolder {
    fn try_default_path(&self) -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Self::candidates(&home).into_iter().find(|p| p.is_dir())
    }
}

/// Fixed directory, for embedders with their own folder selection and for
/// tests.
#[derive(Debug, Clone, Default)]
pub struct FixedFolder(pub Option<PathBuf>);

impl FolderProvider for FixedFolder {
    fn try_default_path(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_start_with_saved_games() {
        let home = Path::new("/home/cmdr");
        let candidates = JournalFolder::candidates(home);
        assert_eq!(
            candidates[0],
            home.join("Saved Games/Frontier Developments/Elite Dangerous")
        );
    }

    #[test]
    fn test_fixed_folder() {
        assert_eq!(FixedFolder(None).try_default_path(), None);
        let dir = PathBuf::from("/journals");
        assert_eq!(FixedFolder(Some(dir.clone())).try_default_path(), Some(dir));
    }
}
