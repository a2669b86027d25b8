use super::progress::{Progress, ProgressUpdate};
use crate::error::DownloadError;
use futures::StreamExt;
use reqwest::Response;
use std::{
    io,
    path::Path,
    pin::Pin,
    task::{ready, Context, Poll},
};
use tokio::io::AsyncWrite;

/// Byte counts for a single transfer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TransferState {
    written: u64,
    total: Option<u64>,
    percent: u8,
}

impl TransferState {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self { written: 0, total, percent: 0 }
    }
    pub(crate) fn written(&self) -> u64 {
        self.written
    }
    pub(crate) fn advance(&mut self, n: u64) -> ProgressUpdate {
        self.written += n;
        let percent = self.total.map(|total| {
            let percent = if total == 0 {
                100
            } else {
                ((self.written as f64 / total as f64) * 100.0).round().min(100.0) as u8
            };
            self.percent = self.percent.max(percent);
            self.percent
        });
        ProgressUpdate {
            written: self.written,
            total: self.total,
            percent,
        }
    }
    /// Error for a copy that broke off. A body cut short of its declared
    /// length is reported as a length mismatch.
    pub(crate) fn interrupted(&self, path: &Path, source: io::Error) -> DownloadError {
        match self.total {
            Some(expected) if self.written < expected => DownloadError::Length {
                copied: self.written,
                expected,
            },
            _ => DownloadError::Transfer {
                path: path.to_path_buf(),
                source,
            },
        }
    }
    /// Fails if a declared length was not matched exactly.
    pub(crate) fn check_length(&self) -> Result<(), DownloadError> {
        match self.total {
            Some(expected) if expected != self.written => Err(DownloadError::Length {
                copied: self.written,
                expected,
            }),
            _ => Ok(()),
        }
    }
}

/// Writes every chunk to `inner` and reports the bytes that landed to `progress`.
pub(crate) struct TeeWriter<'a, W> {
    inner: W,
    state: TransferState,
    progress: &'a mut dyn Progress,
}

impl<'a, W: AsyncWrite + Unpin> TeeWriter<'a, W> {
    pub(crate) fn new(inner: W, total: Option<u64>, progress: &'a mut dyn Progress) -> Self {
        progress.start(total);
        Self {
            inner,
            state: TransferState::new(total),
            progress,
        }
    }
    pub(crate) fn state(&self) -> TransferState {
        self.state
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for TeeWriter<'_, W> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let n = ready!(Pin::new(&mut this.inner).poll_write(cx, buf))?;
        let update = this.state.advance(n as u64);
        this.progress.update(update);
        Poll::Ready(Ok(n))
    }
    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }
    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// Reads at most `limit` bytes of the body, lossily decoded.
pub(crate) async fn read_bounded(response: Response, limit: usize) -> Result<String, reqwest::Error> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await.transpose()? {
        let take = chunk.len().min(limit - body.len());
        body.extend_from_slice(&chunk[..take]);
        if body.len() >= limit {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}
