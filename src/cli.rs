use checked_fetcher::{ChecksumSource, Download, DownloadError, NoProgress, PercentProgress, Progress};
use clap::{Parser, ValueEnum};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Parser)]
#[command(name = "checked-fetch", version, about = "Download a file and verify it before saving it")]
pub struct Cli {
    /// URL of the file to download
    pub url: String,
    /// Filename to use; a directory component sets the download directory
    #[arg(short, long)]
    pub filename: Option<String>,
    /// Timeout in seconds for connecting and receiving the response headers
    #[arg(short, long, default_value_t = 300)]
    pub timeout: u64,
    /// Checksum to verify the downloaded file against
    #[arg(short, long)]
    pub checksum: Option<String>,
    /// Local file containing the checksum
    #[arg(long)]
    pub checksum_file: Option<PathBuf>,
    /// URL to download the checksum from
    #[arg(long)]
    pub checksum_url: Option<String>,
    /// Use parallel download (not supported, downloads always use one connection)
    #[arg(short, long)]
    pub parallel: bool,
    /// How to display progress
    #[arg(long, value_enum, default_value_t = ProgressKind::default())]
    pub progress: ProgressKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProgressKind {
    Bar,
    Percent,
    None,
}

impl Default for ProgressKind {
    fn default() -> Self {
        if cfg!(feature = "render_progress") {
            Self::Bar
        } else {
            Self::Percent
        }
    }
}

impl ProgressKind {
    pub fn reporter(self) -> Box<dyn Progress> {
        match self {
            #[cfg(feature = "render_progress")]
            Self::Bar => Box::new(checked_fetcher::BarProgress::new()),
            #[cfg(not(feature = "render_progress"))]
            Self::Bar => Box::new(PercentProgress::stderr()),
            Self::Percent => Box::new(PercentProgress::stderr()),
            Self::None => Box::new(NoProgress),
        }
    }
}

impl Cli {
    pub fn download(&self) -> Result<Download, DownloadError> {
        let mut download = Download::new(&self.url)?.with_timeout(Duration::from_secs(self.timeout));
        if let Some(filename) = &self.filename {
            download = download.with_filename(filename.as_str());
        }
        let checksum = ChecksumSource::select(self.checksum.clone(), self.checksum_file.clone(), self.checksum_url.clone())?;
        if let Some(checksum) = checksum {
            download = download.with_checksum(checksum);
        }
        Ok(download)
    }
}
