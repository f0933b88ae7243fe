pub mod fetcher;
pub mod utils;
pub mod urls;
pub mod options;
pub mod ensure;

pub use fetcher::{DownloadEngine, DryRunEngine, EngineOutcome, YtDlpEngine};
pub use ensure::locate_ffmpeg;
pub use options::{EngineConfiguration, Profile};
pub use urls::collect_urls;
