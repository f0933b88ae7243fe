use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::yt_dlp_interface::utils::{ffmpeg_executable_name, is_executable_present, yt_dlp_executable_name};

/// Conventional FFmpeg install locations on Windows, probed in order.
pub const WINDOWS_FFMPEG_DIRS: &[&str] = &[
    r"C:\ffmpeg\bin",
    r"C:\Program Files\ffmpeg\bin",
    r"C:\Program Files (x86)\ffmpeg\bin",
];

/// A directory verified to contain the ffmpeg executable.
///
/// Only the locator functions in this module can produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolchainLocation(PathBuf);

impl ToolchainLocation {
    pub fn dir(&self) -> &Path {
        &self.0
    }
}

fn has_ffmpeg(dir: &Path) -> bool {
    dir.is_dir() && is_executable_present(&dir.join(ffmpeg_executable_name()))
}

/// Finds the directory holding ffmpeg.
///
/// An explicit `custom_dir` is authoritative: when it does not hold ffmpeg
/// the search stops there instead of falling back to `PATH`.
pub fn locate_ffmpeg(custom_dir: Option<&Path>) -> Option<ToolchainLocation> {
    let search_path = std::env::var_os("PATH");
    let fallback_dirs: Vec<&Path> = if cfg!(target_os = "windows") {
        WINDOWS_FFMPEG_DIRS.iter().map(Path::new).collect()
    } else {
        Vec::new()
    };
    locate_ffmpeg_in(custom_dir, search_path.as_deref(), &fallback_dirs)
}

pub fn locate_ffmpeg_in(
    custom_dir: Option<&Path>,
    search_path: Option<&OsStr>,
    fallback_dirs: &[&Path],
) -> Option<ToolchainLocation> {
    // 1) User supplied directory
    if let Some(dir) = custom_dir {
        if has_ffmpeg(dir) {
            log::debug!("ffmpeg found in custom directory {:?}", dir);
            return Some(ToolchainLocation(dir.to_path_buf()));
        }
        log::debug!("custom directory {:?} does not contain {}", dir, ffmpeg_executable_name());
        return None;
    }

    // 2) Executable search path
    if let Some(paths) = search_path {
        if let Ok(found) = which::which_in(ffmpeg_executable_name(), Some(paths), Path::new(".")) {
            if let Some(parent) = found.parent() {
                log::debug!("ffmpeg resolved on PATH at {:?}", found);
                return Some(ToolchainLocation(parent.to_path_buf()));
            }
        }
    }

    // 3) Well-known install locations, first match wins
    first_dir_with_ffmpeg(fallback_dirs)
}

fn first_dir_with_ffmpeg(candidates: &[&Path]) -> Option<ToolchainLocation> {
    candidates
        .iter()
        .find(|dir| has_ffmpeg(dir))
        .map(|dir| {
            log::debug!("ffmpeg found in conventional location {:?}", dir);
            ToolchainLocation(dir.to_path_buf())
        })
}

/// Resolves the yt-dlp executable, either the explicit path or the first hit on `PATH`.
pub fn locate_yt_dlp(explicit: Option<&Path>) -> Option<PathBuf> {
    let search_path = std::env::var_os("PATH");
    locate_yt_dlp_in(explicit, search_path.as_deref())
}

pub fn locate_yt_dlp_in(explicit: Option<&Path>, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return is_executable_present(path).then(|| path.to_path_buf());
    }
    let paths = search_path?;
    which::which_in(yt_dlp_executable_name(), Some(paths), Path::new(".")).ok()
}
