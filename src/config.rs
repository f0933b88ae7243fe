use std::path::{Path, PathBuf};
use anyhow::Result;

pub const DOTENV_FILE: &str = ".env";

pub fn find_dotenv() -> Result<Option<PathBuf>> {
    let mut candidates = Vec::new();

    // 1. Directory where the executable is located
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(exe_dir) = current_exe.parent() {
            candidates.push(exe_dir.to_path_buf());
        }
    }

    // 2. Current working directory
    candidates.push(std::env::current_dir()?);

    Ok(find_dotenv_in(&candidates))
}

pub fn find_dotenv_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(DOTENV_FILE))
        .find(|path| path.is_file())
}

/// Loads `YTMAX_*` defaults from a `.env` file, if one exists.
/// Variables already set in the environment are left untouched.
///
/// Runs before the logger is up, so the loaded path is returned for the caller to report.
pub fn load_environment() -> Result<Option<PathBuf>> {
    match find_dotenv()? {
        Some(path) => {
            load_from(&path)?;
            Ok(Some(path))
        },
        None => Ok(None),
    }
}

fn load_from(path: &Path) -> Result<()> {
    dotenv::from_path(path)
        .map_err(|e| anyhow::anyhow!("Failed to load environment from {:?}: {}", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_dotenv_prefers_first_directory() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join(DOTENV_FILE), "YTMAX_OUT=second\n").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_dotenv_in(&dirs), Some(second.path().join(DOTENV_FILE)));

        std::fs::write(first.path().join(DOTENV_FILE), "YTMAX_OUT=first\n").unwrap();
        assert_eq!(find_dotenv_in(&dirs), Some(first.path().join(DOTENV_FILE)));
    }

    #[test]
    fn test_find_dotenv_none() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(DOTENV_FILE)).unwrap();
        assert_eq!(find_dotenv_in(&[dir.path().to_path_buf()]), None);
    }
}
