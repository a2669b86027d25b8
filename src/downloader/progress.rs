#[cfg(feature = "render_progress")]
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

#[cfg(feature = "render_progress")]
const DEFAULT_BAR_PROGRESS: &str =
    "{bar:30.blue/red} ({percent}%) {bytes:>12.green} / {total_bytes:<12.green} {bytes_per_sec:>13.blue} - ETA: {eta_precise}";
#[cfg(feature = "render_progress")]
const DEFAULT_SPINNER_PROGRESS: &str = "{spinner:.blue} {bytes:>12.green} {bytes_per_sec:>13.blue} - {elapsed_precise}";
#[cfg(feature = "render_progress")]
const PROGRESS_LINE: &str = "━╾╴─";

/// A snapshot of a running transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub written: u64,
    pub total: Option<u64>,
    /// Rounded percentage in `0..=100`; `None` when the total is unknown.
    pub percent: Option<u8>,
}

/// Observes a transfer. Never affects the outcome of a download.
pub trait Progress: Send + Sync {
    /// Called once before the first chunk.
    fn start(&mut self, total: Option<u64>);
    fn update(&mut self, update: ProgressUpdate);
    fn finish(&mut self) {}
}

impl<P: Progress + ?Sized> Progress for Box<P> {
    fn start(&mut self, total: Option<u64>) {
        (**self).start(total)
    }
    fn update(&mut self, update: ProgressUpdate) {
        (**self).update(update)
    }
    fn finish(&mut self) {
        (**self).finish()
    }
}

/// Reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _: Option<u64>) {}
    fn update(&mut self, _: ProgressUpdate) {}
}

/// Prints `Downloading... N% complete` on a single line, or a running byte
/// count when the total is unknown.
pub struct PercentProgress<W> {
    out: W,
    last: Option<ProgressUpdate>,
}

impl PercentProgress<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send + Sync> PercentProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }
    pub fn into_inner(self) -> W {
        self.out
    }
    fn render(&mut self, update: ProgressUpdate) {
        let line = match update.percent {
            Some(percent) => format!("\rDownloading... {percent}% complete"),
            None => format!("\rDownloading... {} bytes", update.written),
        };
        // Progress output is best effort.
        let _ = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush());
    }
}

impl<W: Write + Send + Sync> Progress for PercentProgress<W> {
    fn start(&mut self, _: Option<u64>) {
        self.last = None;
    }
    fn update(&mut self, update: ProgressUpdate) {
        let changed = match (self.last, update.percent) {
            (Some(last), Some(percent)) => last.percent != Some(percent),
            _ => true,
        };
        if changed {
            self.render(update);
        }
        self.last = Some(update);
    }
    fn finish(&mut self) {
        if self.last.is_some() {
            let _ = self.out.write_all(b"\n").and_then(|_| self.out.flush());
        }
    }
}

/// An indicatif progress bar, falling back to a spinner when the total is unknown.
#[cfg(feature = "render_progress")]
pub struct BarProgress {
    bar: Option<ProgressBar>,
    style: ProgressStyle,
    spinner: ProgressStyle,
}

#[cfg(feature = "render_progress")]
impl Default for BarProgress {
    fn default() -> Self {
        Self {
            bar: None,
            style: ProgressStyle::with_template(DEFAULT_BAR_PROGRESS)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars(PROGRESS_LINE),
            spinner: ProgressStyle::with_template(DEFAULT_SPINNER_PROGRESS)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        }
    }
}

#[cfg(feature = "render_progress")]
impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "render_progress")]
impl Progress for BarProgress {
    fn start(&mut self, total: Option<u64>) {
        let bar = match total {
            Some(total) => ProgressBar::new(total).with_style(self.style.clone()),
            None => ProgressBar::new_spinner().with_style(self.spinner.clone()),
        };
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        self.bar = Some(bar);
    }
    fn update(&mut self, update: ProgressUpdate) {
        if let Some(bar) = &self.bar {
            bar.set_position(update.written);
        }
    }
    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}
