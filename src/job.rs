use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::JobError;
use crate::yt_dlp_interface::{locate_ffmpeg, DownloadEngine, EngineConfiguration, EngineOutcome, Profile};

/// Stages a job walks through, strictly in this order. Every stage but `Done` can fail the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    PreparingOutput,
    LocatingToolchain,
    BuildingConfig,
    Delegating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::PreparingOutput => "preparing output",
            Stage::LocatingToolchain => "locating toolchain",
            Stage::BuildingConfig => "building config",
            Stage::Delegating => "delegating",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What one invocation asked for. Always holds at least one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    urls: Vec<String>,
    output_dir: PathBuf,
    cookie_file: Option<PathBuf>,
    profile: Profile,
}

impl DownloadRequest {
    pub fn new(
        urls: Vec<String>,
        output_dir: PathBuf,
        cookie_file: Option<PathBuf>,
        profile: Profile,
    ) -> Result<Self, JobError> {
        log::debug!("stage: {}", Stage::Validating);
        if urls.is_empty() {
            return Err(JobError::NoTargets);
        }
        Ok(DownloadRequest { urls, output_dir, cookie_file, profile })
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn cookie_file(&self) -> Option<&Path> {
        self.cookie_file.as_deref()
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }
}

/// Prepares the output folder, resolves FFmpeg, builds the engine configuration and
/// hands everything to `engine` in one call. Returns the number of finished items.
pub async fn run<E: DownloadEngine>(
    request: &DownloadRequest,
    ffmpeg_dir: Option<&Path>,
    engine: &E,
) -> Result<usize, JobError> {
    log::debug!("stage: {}", Stage::PreparingOutput);
    let output_dir = request.output_dir();
    std::fs::create_dir_all(output_dir).map_err(|source| JobError::OutputDirError {
        path: output_dir.to_path_buf(),
        source,
    })?;

    log::debug!("stage: {}", Stage::LocatingToolchain);
    let toolchain = locate_ffmpeg(ffmpeg_dir).ok_or_else(|| JobError::ToolchainMissing {
        custom_dir: ffmpeg_dir.map(Path::to_path_buf),
    })?;

    log::debug!("stage: {}", Stage::BuildingConfig);
    if let Some(cookies) = request.cookie_file() {
        if !cookies.exists() {
            return Err(JobError::CredentialFileMissing(cookies.to_path_buf()));
        }
    }

    let resolved_output = output_dir.canonicalize().unwrap_or_else(|_| output_dir.to_path_buf());
    log::info!("Output: {:?}", resolved_output);
    if let Some(cookies) = request.cookie_file() {
        log::info!("Using cookies: {:?}", cookies);
    }
    log::info!("FFmpeg in: {:?}", toolchain.dir());
    log::info!("URLs/playlists: {}", request.urls().len());
    if request.profile() == Profile::AudioOnly {
        log::info!("Mode: audio only (M4A)");
    }

    let config = EngineConfiguration::for_profile(
        request.profile(),
        output_dir,
        toolchain,
        request.cookie_file().map(Path::to_path_buf),
    );

    log::debug!("stage: {}", Stage::Delegating);
    let outcome = engine.download(&config, request.urls()).await?;
    log::debug!("stage: {} ({:?})", Stage::Done, outcome);

    match outcome {
        EngineOutcome::Success { completed } => Ok(completed),
        EngineOutcome::PartialFailure { completed, failed } => Err(JobError::PartialFailure { completed, failed }),
        EngineOutcome::Failure { failed, exit_code } => Err(JobError::EngineFailure { failed, exit_code }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yt_dlp_interface::utils::{fake_executable, ffmpeg_executable_name};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingEngine {
        calls: Mutex<Vec<(EngineConfiguration, Vec<String>)>>,
        outcome: EngineOutcome,
    }

    impl RecordingEngine {
        fn returning(outcome: EngineOutcome) -> Self {
            RecordingEngine { calls: Mutex::new(Vec::new()), outcome }
        }

        fn calls(&self) -> Vec<(EngineConfiguration, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DownloadEngine for RecordingEngine {
        async fn download(&self, config: &EngineConfiguration, urls: &[String]) -> Result<EngineOutcome, JobError> {
            self.calls.lock().unwrap().push((config.clone(), urls.to_vec()));
            Ok(self.outcome)
        }
    }

    fn ffmpeg_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fake_executable(dir.path(), ffmpeg_executable_name());
        dir
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_request_requires_urls() {
        let err = DownloadRequest::new(Vec::new(), PathBuf::from("downloads"), None, Profile::VideoAudio)
            .unwrap_err();
        assert!(matches!(err, JobError::NoTargets));
    }

    #[tokio::test]
    async fn test_video_job_creates_output_and_delegates_once() {
        let work = TempDir::new().unwrap();
        let ffmpeg = ffmpeg_dir();
        let out = work.path().join("nested").join("out1");
        let request = DownloadRequest::new(urls(&["https://example/video1"]), out.clone(), None, Profile::VideoAudio)
            .unwrap();
        let engine = RecordingEngine::returning(EngineOutcome::Success { completed: 1 });

        let completed = run(&request, Some(ffmpeg.path()), &engine).await.unwrap();

        assert_eq!(completed, 1);
        assert!(out.is_dir());
        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        let (config, passed_urls) = &calls[0];
        assert_eq!(passed_urls, &urls(&["https://example/video1"]));
        assert_eq!(config.profile, Profile::VideoAudio);
        assert_eq!(config.ffmpeg_location.dir(), ffmpeg.path());
        assert!(config.output_template.starts_with(&out));
    }

    #[tokio::test]
    async fn test_audio_job_uses_audio_profile_and_cookies() {
        let work = TempDir::new().unwrap();
        let ffmpeg = ffmpeg_dir();
        let cookies = work.path().join("cookies.txt");
        std::fs::write(&cookies, "# Netscape HTTP Cookie File\n").unwrap();
        let request = DownloadRequest::new(
            urls(&["https://example/a", "https://example/b"]),
            work.path().join("out"),
            Some(cookies.clone()),
            Profile::AudioOnly,
        )
        .unwrap();
        let engine = RecordingEngine::returning(EngineOutcome::Success { completed: 2 });

        run(&request, Some(ffmpeg.path()), &engine).await.unwrap();

        let (config, passed_urls) = &engine.calls()[0];
        assert_eq!(passed_urls.len(), 2);
        assert_eq!(config.profile, Profile::AudioOnly);
        assert!(config.format.starts_with("bestaudio"));
        assert_eq!(config.cookie_file.as_deref(), Some(cookies.as_path()));
    }

    #[tokio::test]
    async fn test_missing_cookies_prevents_delegation() {
        let work = TempDir::new().unwrap();
        let ffmpeg = ffmpeg_dir();
        let cookies = work.path().join("cookies.txt");
        let request = DownloadRequest::new(
            urls(&["https://example/a"]),
            work.path().join("out"),
            Some(cookies.clone()),
            Profile::VideoAudio,
        )
        .unwrap();
        let engine = RecordingEngine::returning(EngineOutcome::Success { completed: 1 });

        let err = run(&request, Some(ffmpeg.path()), &engine).await.unwrap_err();

        assert!(matches!(err, JobError::CredentialFileMissing(path) if path == cookies));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_custom_ffmpeg_dir_without_ffmpeg() {
        let work = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        let request = DownloadRequest::new(urls(&["https://example/a"]), work.path().join("out"), None, Profile::VideoAudio)
            .unwrap();
        let engine = RecordingEngine::returning(EngineOutcome::Success { completed: 1 });

        let err = run(&request, Some(empty.path()), &engine).await.unwrap_err();

        assert!(matches!(err, JobError::ToolchainMissing { custom_dir: Some(_) }));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_output_dir_error() {
        let work = TempDir::new().unwrap();
        let ffmpeg = ffmpeg_dir();
        let blocker = work.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();
        let request = DownloadRequest::new(urls(&["https://example/a"]), blocker.join("out"), None, Profile::VideoAudio)
            .unwrap();
        let engine = RecordingEngine::returning(EngineOutcome::Success { completed: 1 });

        let err = run(&request, Some(ffmpeg.path()), &engine).await.unwrap_err();
        assert!(matches!(err, JobError::OutputDirError { .. }));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_engine_outcomes_map_to_errors() {
        let work = TempDir::new().unwrap();
        let ffmpeg = ffmpeg_dir();
        let request = DownloadRequest::new(urls(&["https://example/list"]), work.path().join("out"), None, Profile::VideoAudio)
            .unwrap();

        let partial = RecordingEngine::returning(EngineOutcome::PartialFailure { completed: 4, failed: 1 });
        let err = run(&request, Some(ffmpeg.path()), &partial).await.unwrap_err();
        assert!(matches!(err, JobError::PartialFailure { completed: 4, failed: 1 }));

        let failure = RecordingEngine::returning(EngineOutcome::Failure { failed: 1, exit_code: Some(1) });
        let err = run(&request, Some(ffmpeg.path()), &failure).await.unwrap_err();
        assert!(matches!(err, JobError::EngineFailure { failed: 1, exit_code: Some(1) }));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::LocatingToolchain.to_string(), "locating toolchain");
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
