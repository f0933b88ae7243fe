use std::time::{Duration, Instant};

use indicatif::{ProgressBar as Bar, ProgressDrawTarget, ProgressStyle};

// Minimum time between redraws; 100% is always drawn.
const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(1000);

const TEMPLATE: &str = "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}";

pub struct ProgressBar {
    bar: Bar,
    last_update: Option<Instant>,
}

impl ProgressBar {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    pub fn new_silent() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█░░")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        let bar = Bar::with_draw_target(Some(100), target);
        bar.set_style(style);
        Self { bar, last_update: None }
    }

    pub fn start(&mut self, initial_text: &str) {
        self.bar.set_position(0);
        self.bar.set_message(initial_text.to_string());
        self.last_update = Some(Instant::now());
    }

    pub fn update(&mut self, percentage: f64, extra_info: Option<&str>) {
        let percentage = percentage.clamp(0.0, 100.0);
        let now = Instant::now();

        if let Some(last) = self.last_update {
            if now.duration_since(last) < MIN_UPDATE_INTERVAL && percentage < 100.0 {
                return;
            }
        }
        self.last_update = Some(now);

        self.bar.set_position(percentage as u64);
        if let Some(info) = extra_info {
            self.bar.set_message(info.to_string());
        }
    }

    /// Runs `f` with the bar cleared so log lines don't tear through it.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    #[cfg(test)]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&mut self) {
        self.bar.finish_and_clear();
        self.last_update = None;
    }
}
