use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::error::JobError;
use crate::utils::progress_bar::ProgressBar;
use crate::yt_dlp_interface::ensure::locate_yt_dlp;
use crate::yt_dlp_interface::options::{COMPLETION_MARKER, EngineConfiguration};

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").expect("valid ANSI regex"));

static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%(?:\s+of\s+~?\s*(\d+(?:\.\d+)?\s*[KMGT]?i?B))?")
        .expect("valid progress regex")
});

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\] Downloading (?:item|video) (\d+) of (\d+)").expect("valid item regex")
});

/// Aggregate result of one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    Success { completed: usize },
    PartialFailure { completed: usize, failed: usize },
    Failure { failed: usize, exit_code: Option<i32> },
}

#[allow(async_fn_in_trait)]
pub trait DownloadEngine {
    async fn download(&self, config: &EngineConfiguration, urls: &[String]) -> Result<EngineOutcome, JobError>;
}

/// Runs the yt-dlp executable as a child process.
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    explicit_path: Option<PathBuf>,
    show_progress: bool,
}

impl YtDlpEngine {
    pub fn new(explicit_path: Option<PathBuf>, show_progress: bool) -> Self {
        YtDlpEngine { explicit_path, show_progress }
    }

    pub fn resolve_binary(&self) -> Result<PathBuf, JobError> {
        locate_yt_dlp(self.explicit_path.as_deref()).ok_or_else(|| JobError::EngineMissing {
            explicit: self.explicit_path.clone(),
        })
    }
}

impl DownloadEngine for YtDlpEngine {
    async fn download(&self, config: &EngineConfiguration, urls: &[String]) -> Result<EngineOutcome, JobError> {
        let yt_dlp_path = self.resolve_binary()?;
        log::info!("yt-dlp at {:?}", yt_dlp_path);

        let mut cmd = Command::new(&yt_dlp_path);
        cmd.args(config.command_args(urls))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(JobError::EngineSpawn)?;
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(JobError::EngineSpawn(std::io::Error::other("yt-dlp output was not captured")));
        };

        let mut progress_bar = if self.show_progress { ProgressBar::new() } else { ProgressBar::new_silent() };
        let mut tally = OutputTally::default();
        pump_output(stdout, stderr, &mut tally, &mut progress_bar).await;

        let status = child.wait().await.map_err(JobError::EngineSpawn)?;
        progress_bar.finish();

        log::debug!("yt-dlp exited with {}", status);
        Ok(tally.outcome(status.success(), status.code()))
    }
}

/// Feeds every line of both streams to `tally` until each one reaches EOF.
///
/// Lines are decoded lossily; yt-dlp prints titles in the console codepage.
async fn pump_output<O, E>(stdout: O, stderr: E, tally: &mut OutputTally, progress_bar: &mut ProgressBar)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            read = stdout_reader.read_until(b'\n', &mut stdout_buf), if stdout_open => {
                match read {
                    Ok(0) => stdout_open = false,
                    Ok(_) => {
                        tally.observe(&String::from_utf8_lossy(&stdout_buf), progress_bar);
                        stdout_buf.clear();
                    }
                    Err(e) => {
                        log::warn!("Stopped reading yt-dlp stdout: {}", e);
                        stdout_open = false;
                    }
                }
            },
            read = stderr_reader.read_until(b'\n', &mut stderr_buf), if stderr_open => {
                match read {
                    Ok(0) => stderr_open = false,
                    Ok(_) => {
                        tally.observe(&String::from_utf8_lossy(&stderr_buf), progress_bar);
                        stderr_buf.clear();
                    }
                    Err(e) => {
                        log::warn!("Stopped reading yt-dlp stderr: {}", e);
                        stderr_open = false;
                    }
                }
            }
        }
    }
}

/// Prints the configuration and the yt-dlp command line instead of running anything.
pub struct DryRunEngine;

impl DownloadEngine for DryRunEngine {
    async fn download(&self, config: &EngineConfiguration, urls: &[String]) -> Result<EngineOutcome, JobError> {
        let mut stdout = std::io::stdout().lock();
        write_report(&mut stdout, config, urls).map_err(JobError::ReportOutput)?;
        Ok(EngineOutcome::Success { completed: 0 })
    }
}

fn write_report<W: Write>(out: &mut W, config: &EngineConfiguration, urls: &[String]) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    let args: Vec<String> = config
        .command_args(urls)
        .iter()
        .map(|arg| shell_quote(&arg.to_string_lossy()).into_owned())
        .collect();

    writeln!(out, "{}", json)?;
    writeln!(out, "yt-dlp {}", args.join(" "))
}

/// Single-quotes `arg` for a POSIX shell unless it is made only of safe characters.
fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./:=,@%+".contains(c);
    if !arg.is_empty() && arg.chars().all(safe) {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

#[derive(Debug, Default)]
struct OutputTally {
    completed: usize,
    failed: usize,
    last_percentage: f64,
}

impl OutputTally {
    fn observe(&mut self, raw: &str, progress_bar: &mut ProgressBar) {
        let line = remove_ansi_codes(raw);
        let line = line.trim_end();

        if let Some(path) = line.strip_prefix(COMPLETION_MARKER) {
            self.completed += 1;
            self.last_percentage = 0.0;
            progress_bar.update(100.0, Some("done"));
            progress_bar.suspend(|| log::info!("Saved {}", path.trim()));
            progress_bar.start("");
        } else if line.starts_with("ERROR:") {
            self.failed += 1;
            progress_bar.suspend(|| log::error!("{}", line));
        } else if line.starts_with("WARNING:") {
            progress_bar.suspend(|| log::warn!("{}", line));
        } else if let Some((current, total)) = parse_item_line(line) {
            progress_bar.suspend(|| log::info!("Item {} of {}", current, total));
        } else if let Some((percentage, total_size)) = parse_progress_line(line) {
            if percentage != self.last_percentage {
                self.last_percentage = percentage;
                let info = match total_size {
                    Some(bytes) => format!("{:.1} MiB", bytes as f64 / 1_048_576.0),
                    None => String::new(),
                };
                progress_bar.update(percentage, Some(&info));
            }
        } else if !line.is_empty() {
            log::trace!("yt-dlp: {}", line);
        }
    }

    fn outcome(&self, success: bool, exit_code: Option<i32>) -> EngineOutcome {
        match (success, self.completed) {
            (true, completed) => EngineOutcome::Success { completed },
            (false, 0) => EngineOutcome::Failure { failed: self.failed, exit_code },
            (false, completed) => EngineOutcome::PartialFailure {
                completed,
                // yt-dlp can exit non-zero without printing an ERROR line
                failed: self.failed.max(1),
            },
        }
    }
}

fn parse_item_line(line: &str) -> Option<(usize, usize)> {
    let caps = ITEM_RE.captures(line)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn parse_progress_line(line: &str) -> Option<(f64, Option<u64>)> {
    let caps = PROGRESS_RE.captures(line)?;
    let percentage = caps[1].parse::<f64>().ok()?;
    let total_size = caps.get(2).and_then(|m| parse_size_string(m.as_str()));
    Some((percentage, total_size))
}

fn remove_ansi_codes(text: &str) -> String {
    ANSI_RE.replace_all(text, "").to_string()
}

fn parse_size_string(s: &str) -> Option<u64> {
    let s_clean = s.trim().to_lowercase();
    let number_end = s_clean
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s_clean.len());
    let (number_str, unit) = s_clean.split_at(number_end);
    let multiplier: f64 = match unit.trim() {
        "b" => 1.0,
        "kib" => 1024.0,
        "kb" => 1000.0,
        "mib" => 1024.0 * 1024.0,
        "mb" => 1000.0 * 1000.0,
        "gib" => 1024.0 * 1024.0 * 1024.0,
        "gb" => 1000.0 * 1000.0 * 1000.0,
        "tib" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "tb" => 1000.0 * 1000.0 * 1000.0 * 1000.0,
        _ => return None,
    };
    let number = number_str.parse::<f64>().ok()?;
    Some((number * multiplier) as u64)
}
