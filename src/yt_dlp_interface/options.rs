use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::yt_dlp_interface::ensure::ToolchainLocation;

/// Prefix printed by yt-dlp once an item has been fully post-processed and moved into place.
pub const COMPLETION_MARKER: &str = "[ytmax-done]";

const RETRIES: u32 = 10;
const FRAGMENT_RETRIES: u32 = 10;
const HTTP_CHUNK_SIZE: u64 = 10 * 1024 * 1024; // 10 MiB
const CONCURRENT_FRAGMENTS: u32 = 5;

// Titles are capped at 200 bytes to stay clear of path length limits.
const AUDIO_TEMPLATE: &str = "%(title).200B [%(id)s].%(ext)s";
const VIDEO_TEMPLATE: &str = "%(title).200B [%(id)s] [%(resolution)s] [%(fps)sfps].%(ext)s";

const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio/best";
const VIDEO_FORMAT: &str = "((bestvideo[ext=mp4]/bestvideo)+bestaudio[ext=m4a]/(bestvideo+bestaudio)/best)";

// Highest resolution first, then frame rate, then AV1 > VP9 > H.264.
const VIDEO_FORMAT_SORT: &[&str] = &[
    "res:4320", "res:2160", "res:1440", "res:1080", "res",
    "fps", "vcodec:av01", "vcodec:vp9", "vcodec:h264",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    VideoAudio,
    AudioOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "key")]
pub enum PostProcessor {
    /// Transcode the downloaded stream into an audio-only file.
    ExtractAudio { preferred_codec: String, preferred_quality: u8 },
    /// Remux into another container when the streams allow it.
    VideoRemuxer { preferred_format: String },
}

/// Everything yt-dlp needs for one run.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfiguration {
    pub profile: Profile,
    pub output_template: PathBuf,
    pub format: String,
    pub format_sort: Vec<String>,
    pub merge_output_format: Option<String>,
    pub postprocessors: Vec<PostProcessor>,
    pub concurrent_fragments: Option<u32>,
    pub retries: u32,
    pub fragment_retries: u32,
    pub http_chunk_size: u64,
    pub yes_playlist: bool,
    pub continue_on_error: bool,
    pub ffmpeg_location: ToolchainLocation,
    pub cookie_file: Option<PathBuf>,
}

impl EngineConfiguration {
    pub fn for_profile(
        profile: Profile,
        output_dir: &Path,
        ffmpeg_location: ToolchainLocation,
        cookie_file: Option<PathBuf>,
    ) -> Self {
        match profile {
            Profile::AudioOnly => EngineConfiguration {
                profile,
                output_template: output_dir.join(AUDIO_TEMPLATE),
                format: AUDIO_FORMAT.to_string(),
                format_sort: Vec::new(),
                merge_output_format: None,
                postprocessors: vec![PostProcessor::ExtractAudio {
                    preferred_codec: "m4a".to_string(),
                    preferred_quality: 0,
                }],
                concurrent_fragments: None,
                retries: RETRIES,
                fragment_retries: FRAGMENT_RETRIES,
                http_chunk_size: HTTP_CHUNK_SIZE,
                yes_playlist: true,
                continue_on_error: true,
                ffmpeg_location,
                cookie_file,
            },
            Profile::VideoAudio => EngineConfiguration {
                profile,
                output_template: output_dir.join(VIDEO_TEMPLATE),
                format: VIDEO_FORMAT.to_string(),
                format_sort: VIDEO_FORMAT_SORT.iter().map(|s| s.to_string()).collect(),
                merge_output_format: Some("mp4".to_string()),
                postprocessors: vec![PostProcessor::VideoRemuxer {
                    preferred_format: "mp4".to_string(),
                }],
                concurrent_fragments: Some(CONCURRENT_FRAGMENTS),
                retries: RETRIES,
                fragment_retries: FRAGMENT_RETRIES,
                http_chunk_size: HTTP_CHUNK_SIZE,
                yes_playlist: true,
                continue_on_error: true,
                ffmpeg_location,
                cookie_file,
            },
        }
    }

    /// Full yt-dlp argument vector for this configuration. URLs are passed after `--`, verbatim.
    pub fn command_args(&self, urls: &[String]) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        push_flag(&mut args, "--output", &self.output_template);
        push_flag(&mut args, "--format", &self.format);
        if !self.format_sort.is_empty() {
            push_flag(&mut args, "--format-sort", self.format_sort.join(","));
        }
        if let Some(container) = &self.merge_output_format {
            push_flag(&mut args, "--merge-output-format", container);
        }
        for postprocessor in &self.postprocessors {
            match postprocessor {
                PostProcessor::ExtractAudio { preferred_codec, preferred_quality } => {
                    args.push("--extract-audio".into());
                    push_flag(&mut args, "--audio-format", preferred_codec);
                    push_flag(&mut args, "--audio-quality", preferred_quality.to_string());
                }
                PostProcessor::VideoRemuxer { preferred_format } => {
                    push_flag(&mut args, "--remux-video", preferred_format);
                }
            }
        }

        if let Some(fragments) = self.concurrent_fragments {
            push_flag(&mut args, "--concurrent-fragments", fragments.to_string());
        }
        push_flag(&mut args, "--retries", self.retries.to_string());
        push_flag(&mut args, "--fragment-retries", self.fragment_retries.to_string());
        push_flag(&mut args, "--http-chunk-size", self.http_chunk_size.to_string());
        push_flag(&mut args, "--ffmpeg-location", self.ffmpeg_location.dir());
        if let Some(cookies) = &self.cookie_file {
            push_flag(&mut args, "--cookies", cookies);
        }

        let playlist = if self.yes_playlist { "--yes-playlist" } else { "--no-playlist" };
        let on_error = if self.continue_on_error { "--no-abort-on-error" } else { "--abort-on-error" };
        args.push(playlist.into());
        args.push(on_error.into());

        // Machine readable progress plus one marker line per finished item.
        args.push("--newline".into());
        args.push("--progress".into());
        args.push("--no-simulate".into());
        push_flag(&mut args, "--print", format!("after_move:{} %(filepath)s", COMPLETION_MARKER));
        // --print implies --quiet; keep yt-dlp's normal output
        args.push("--no-quiet".into());

        args.push("--".into());
        args.extend(urls.iter().map(OsString::from));
        args
    }
}

fn push_flag(args: &mut Vec<OsString>, flag: &str, value: impl AsRef<OsStr>) {
    args.push(flag.into());
    args.push(value.as_ref().to_os_string());
}
