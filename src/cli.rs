use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::yt_dlp_interface::Profile;

#[derive(Parser, Debug)]
#[command(
    name = "ytmax",
    version,
    about = "Download videos and playlists at maximum quality, merging video and audio with FFmpeg",
    after_help = "Examples:\n  ytmax URL [URL2 ...]\n  ytmax --file urls.txt\n  ytmax --out downloads URL\n  ytmax --cookies cookies.txt URL\n  ytmax --ffmpeg \"C:\\ffmpeg\\bin\" URL"
)]
pub struct Cli {
    /// Video or playlist URLs
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Text file with one URL per line, appended after the positional URLs
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Output folder, created if missing
    #[arg(long, value_name = "DIR", default_value = "downloads", env = "YTMAX_OUT")]
    pub out: PathBuf,

    /// cookies.txt for restricted videos
    #[arg(long, value_name = "PATH", env = "YTMAX_COOKIES")]
    pub cookies: Option<PathBuf>,

    /// Folder containing the ffmpeg executable, e.g. C:\ffmpeg\bin
    #[arg(long, value_name = "DIR", env = "YTMAX_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Download audio only, as M4A
    #[arg(long)]
    pub audio_only: bool,

    /// Path to the yt-dlp executable [default: looked up on PATH]
    #[arg(long = "yt-dlp", value_name = "PATH", env = "YTMAX_YT_DLP")]
    pub yt_dlp: Option<PathBuf>,

    /// Print the yt-dlp configuration and command line instead of downloading
    #[arg(long)]
    pub print_config: bool,

    /// More log output (-v = debug, -vv = trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors and hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn profile(&self) -> Profile {
        if self.audio_only { Profile::AudioOnly } else { Profile::VideoAudio }
    }

    pub fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.print_config
    }
}
