mod progress;
mod source;
mod transfer;
pub(crate) mod verify;

pub use progress::{NoProgress, PercentProgress, Progress, ProgressUpdate};
#[cfg(feature = "render_progress")]
pub use progress::BarProgress;
pub use source::{ChecksumSource, FAKE_CHECKSUM};

use crate::{
    error::DownloadError,
    storage::{self, Storage},
};
use futures::TryStreamExt;
use reqwest::{header::HeaderMap, Client, Response, Url};
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::io::AsyncWriteExt;
use tokio_util::{io::StreamReader, sync::CancellationToken};
use transfer::TeeWriter;
use verify::{Sha256Verifier, Verifier};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(6);
const ERROR_BODY_LIMIT: usize = 64 * 1024;
const FALLBACK_FILENAME: &str = "download";

/// Runs downloads one at a time: request, stream to `<name>.tmp`, check the
/// length, verify, then rename into place.
///
/// Nothing ever appears under the final name unless every step succeeded. On
/// failure after the transfer started the `.tmp` file is left behind.
pub struct Downloader {
    client: Client,
    storage: Arc<dyn Storage>,
    verifier: Box<dyn Verifier>,
    progress: Box<dyn Progress>,
}

impl Downloader {
    pub fn new(storage: Arc<dyn Storage>) -> Result<Self, DownloadError> {
        let client = reqwest::ClientBuilder::new().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self::new_with_client(client, storage))
    }
    pub fn new_with_client(client: Client, storage: Arc<dyn Storage>) -> Self {
        Self {
            client,
            storage,
            verifier: Box::new(Sha256Verifier::new()),
            progress: Box::new(NoProgress),
        }
    }
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
    pub fn with_verifier(mut self, verifier: impl Verifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }
    pub fn with_progress(mut self, progress: impl Progress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }
    /// Downloads, verifies and commits a single file. Returns where it was committed.
    pub async fn download(&mut self, download: &Download, cancel: &CancellationToken) -> Result<Downloaded, DownloadError> {
        let response = self.request(download, cancel).await?;

        let destination = download.destination();
        let temp = storage::temp_path(&destination);
        let bytes = self.transfer(response, &temp, cancel).await?;
        log::debug!("Wrote {bytes} bytes to {}", temp.display());

        match &download.checksum {
            Some(source) => self.verify(source, download, &temp, cancel).await?,
            None => log::debug!("No checksum configured, skipping verification"),
        }

        self.storage.rename(&temp, &destination).await?;
        log::info!("Saved {} ({bytes} bytes)", destination.display());
        Ok(Downloaded { path: destination, bytes })
    }
    async fn request(&self, download: &Download, cancel: &CancellationToken) -> Result<Response, DownloadError> {
        let mut request = self.client.get(download.url.clone());
        if let Some(headers) = &download.headers {
            request = request.headers(headers.clone());
        }
        log::info!("Requesting {}", download.url);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            response = tokio::time::timeout(download.timeout, request.send()) => response.map_err(|_| DownloadError::Timeout {
                url: download.url.to_string(),
                timeout: download.timeout,
            })??,
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                body = transfer::read_bounded(response, ERROR_BODY_LIMIT) => body?,
            };
            return Err(DownloadError::Status {
                url: download.url.to_string(),
                status,
                body,
            });
        }
        Ok(response)
    }
    async fn transfer(&mut self, response: Response, temp: &Path, cancel: &CancellationToken) -> Result<u64, DownloadError> {
        let total = response.content_length();
        let file = self.storage.create(temp).await?;
        let mut body = StreamReader::new(Box::pin(response.bytes_stream().map_err(io::Error::other)));
        let mut tee = TeeWriter::new(file, total, &mut *self.progress);

        let copy = async {
            tokio::io::copy(&mut body, &mut tee).await?;
            tee.shutdown().await
        };
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = copy => Some(result),
        };
        let state = tee.state();
        drop(tee);
        self.progress.finish();

        match result {
            None => return Err(DownloadError::Cancelled),
            Some(Err(source)) => return Err(state.interrupted(temp, source)),
            Some(Ok(())) => {}
        }
        state.check_length()?;
        Ok(state.written())
    }
    async fn verify(
        &self,
        source: &ChecksumSource,
        download: &Download,
        temp: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        let expected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            expected = source.resolve(&self.client, download.timeout) => expected?,
        };
        if expected.is_empty() {
            log::warn!("Expected checksum for {} is empty, verification will fail", temp.display());
        }
        log::info!("Verifying checksum of {}", temp.display());
        let mut file = self.storage.open(temp).await?;
        self.verifier.verify(&mut *file, &expected).await?;
        log::info!("Checksums matched");
        Ok(())
    }
}

/// A committed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
}

/// A single file to fetch.
#[derive(Debug, Clone)]
pub struct Download {
    url: Url,
    directory: Option<PathBuf>,
    filename: Option<String>,
    headers: Option<HeaderMap>,
    checksum: Option<ChecksumSource>,
    timeout: Duration,
}

impl Download {
    pub fn new(url: impl AsRef<str>) -> Result<Self, DownloadError> {
        let url = url.as_ref();
        let url = Url::parse(url).map_err(|err| DownloadError::URLParse(format!("{url}: {err}")))?;
        Ok(Self::new_from_url(url))
    }
    pub fn new_from_url(url: Url) -> Self {
        Self {
            url,
            directory: None,
            filename: None,
            headers: None,
            checksum: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
    /// Name to save under. May contain directories, which are then part of
    /// the destination.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        let filename: String = filename.into();
        self.filename = (!filename.is_empty()).then_some(filename);
        self
    }
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.directory = Some(path.into());
        self
    }
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }
    pub fn with_checksum(mut self, checksum: ChecksumSource) -> Self {
        self.checksum = Some(checksum);
        self
    }
    /// Bounds connecting and receiving the response headers, for the file and
    /// for a remote checksum. The body is not covered; cancel the token to
    /// abort a slow transfer.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    /// Final path of the file. The explicit filename wins over the last
    /// segment of the URL.
    pub fn destination(&self) -> PathBuf {
        let filename = self.filename.as_deref().unwrap_or_else(|| {
            self.url
                .path_segments()
                .and_then(|segments| segments.last())
                .and_then(|name| if name.is_empty() { None } else { Some(name) })
                .unwrap_or(FALLBACK_FILENAME)
        });
        match &self.directory {
            Some(dir) => dir.join(filename),
            None => PathBuf::from(filename),
        }
    }
}
