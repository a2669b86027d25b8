mod downloader;
mod error;
pub mod storage;

pub use downloader::{
    ChecksumSource, Download, Downloaded, Downloader, NoProgress, PercentProgress, Progress, ProgressUpdate, DEFAULT_TIMEOUT,
    FAKE_CHECKSUM,
};
pub use downloader::verify::{Sha256Verifier, Verifier};
pub use error::{ChecksumError, DownloadError, StorageError};
pub use storage::{FsStorage, MemoryStorage, Storage};
pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "render_progress")]
pub use downloader::BarProgress;
