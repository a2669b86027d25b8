use reqwest::StatusCode;
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("Unable to read checksum file {}: {source}", path.display())]
    LocalFile { path: PathBuf, source: std::io::Error },
    #[error("Unable to fetch checksum from {url}: {source}")]
    Remote { url: String, source: reqwest::Error },
    #[error("Request for checksum at {url} timed out after {timeout:?}")]
    RemoteTimeout { url: String, timeout: Duration },
    #[error("{url}: {status}")]
    RemoteStatus { url: String, status: StatusCode },
    #[error("Unable to read downloaded file for verification: {0}")]
    Read(#[source] std::io::Error),
    #[error("checksum mismatch: expected {expected}, computed {computed}")]
    VerificationFailure { expected: String, computed: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("create {}: {source}", path.display())]
    Create { path: PathBuf, source: std::io::Error },
    #[error("open {}: {source}", path.display())]
    Open { path: PathBuf, source: std::io::Error },
    #[error("rename {} {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Unable to parse URL: {0}")]
    URLParse(String),
    #[error("{0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("download failed: {url}: {status}: {body}")]
    Status { url: String, status: StatusCode, body: String },
    #[error("Error while transferring to {}: {source}", path.display())]
    Transfer { path: PathBuf, source: std::io::Error },
    #[error("copied {copied} bytes; expected {expected}")]
    Length { copied: u64, expected: u64 },
    #[error("{0}")]
    Checksum(#[from] ChecksumError),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("Download cancelled")]
    Cancelled,
}
