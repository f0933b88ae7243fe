use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("no URLs provided")]
    NoTargets,

    #[error("URL file not found: {}", .0.display())]
    InputFileMissing(PathBuf),

    #[error("could not read URL file {}: {source}", .path.display())]
    InputFileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cookies file not found: {}", .0.display())]
    CredentialFileMissing(PathBuf),

    #[error("could not create output directory {}: {source}", .path.display())]
    OutputDirError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("FFmpeg not found")]
    ToolchainMissing { custom_dir: Option<PathBuf> },

    #[error("yt-dlp not found")]
    EngineMissing { explicit: Option<PathBuf> },

    #[error("could not start yt-dlp: {0}")]
    EngineSpawn(#[source] io::Error),

    #[error("could not print the yt-dlp configuration: {0}")]
    ReportOutput(#[source] io::Error),

    #[error("download failed ({failed} error(s), yt-dlp exit code {})", exit_code_label(.exit_code))]
    EngineFailure { failed: usize, exit_code: Option<i32> },

    #[error("{failed} item(s) failed, {completed} completed")]
    PartialFailure { completed: usize, failed: usize },
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

impl JobError {
    /// Remediation text shown under the error, when there is something the user can do.
    pub fn hint(&self) -> Option<String> {
        match self {
            JobError::NoTargets => Some(
                "usage: ytmax <URL> [URL2 ...]  |  ytmax --file urls.txt".to_string(),
            ),
            JobError::ToolchainMissing { custom_dir: Some(dir) } => Some(format!(
                "{} does not contain {}; pass the folder that holds the FFmpeg executable, e.g. --ffmpeg \"C:\\ffmpeg\\bin\"",
                dir.display(),
                crate::yt_dlp_interface::utils::ffmpeg_executable_name()
            )),
            JobError::ToolchainMissing { custom_dir: None } => Some(
                "install FFmpeg and add its 'bin' folder to PATH, or pass --ffmpeg \"C:\\ffmpeg\\bin\".\n\
                 Recommended Windows builds: https://www.gyan.dev/ffmpeg/builds/"
                    .to_string(),
            ),
            JobError::EngineMissing { explicit: Some(path) } => Some(format!(
                "{} is not an executable file; pass the full path to yt-dlp with --yt-dlp",
                path.display()
            )),
            JobError::EngineMissing { explicit: None } => Some(
                "install yt-dlp (https://github.com/yt-dlp/yt-dlp#installation) and add it to PATH, or pass --yt-dlp <path>"
                    .to_string(),
            ),
            JobError::CredentialFileMissing(_) => Some(
                "export the browser cookies in Netscape format (cookies.txt) and pass the file with --cookies"
                    .to_string(),
            ),
            JobError::PartialFailure { .. } => Some(
                "run the same command again to retry; files that already exist are skipped".to_string(),
            ),
            _ => None,
        }
    }
}
