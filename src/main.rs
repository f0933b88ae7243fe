use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use crate::cli::Cli;
use crate::error::JobError;
use crate::job::DownloadRequest;
use crate::yt_dlp_interface::{collect_urls, DryRunEngine, YtDlpEngine};

mod cli;
mod config;
mod error;
mod job;
mod utils;
mod yt_dlp_interface;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads the YTMAX_* defaults
    let dotenv = config::load_environment();

    let cli = Cli::parse();
    init_logging(cli.level_filter());

    match dotenv {
        Ok(Some(path)) => log::debug!("Loaded environment variables from {:?}", path),
        Ok(None) => {}
        Err(e) => log::warn!("{}", e),
    }

    let start_time = std::time::Instant::now();
    match run(&cli).await {
        Ok(completed) => {
            if !cli.print_config {
                log::info!("Finished {} item(s) in {:.2?}", completed, start_time.elapsed());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            if let Some(hint) = e.hint() {
                log::error!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<usize, JobError> {
    let urls = collect_urls(&cli.urls, cli.file.as_deref())?;
    let request = DownloadRequest::new(urls, cli.out.clone(), cli.cookies.clone(), cli.profile())?;

    if cli.print_config {
        return job::run(&request, cli.ffmpeg.as_deref(), &DryRunEngine).await;
    }
    let engine = YtDlpEngine::new(cli.yt_dlp.clone(), cli.show_progress());
    job::run(&request, cli.ffmpeg.as_deref(), &engine).await
}

fn init_logging(level: LevelFilter) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, level);

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    // Only fails when a logger is already installed
    let _ = builder.try_init();
}
