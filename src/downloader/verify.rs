use crate::error::ChecksumError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

const BUF_SIZE: usize = 64 * 1024;

/// Checks downloaded bytes against an expected checksum.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, input: &mut (dyn AsyncRead + Send + Unpin), expected: &str) -> Result<(), ChecksumError>;
}

/// Hashes the input with SHA-256 and compares the lowercase hex digest to the
/// expected value, ignoring case.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Verifier;

impl Sha256Verifier {
    pub fn new() -> Self {
        Self
    }
    pub async fn digest(&self, input: &mut (dyn AsyncRead + Send + Unpin)) -> Result<String, ChecksumError> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; BUF_SIZE];
        loop {
            let n = input.read(&mut buf).await.map_err(ChecksumError::Read)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[async_trait]
impl Verifier for Sha256Verifier {
    async fn verify(&self, input: &mut (dyn AsyncRead + Send + Unpin), expected: &str) -> Result<(), ChecksumError> {
        let computed = self.digest(input).await?;
        log::debug!("Computed checksum {computed}, expected {expected}");
        if computed.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(ChecksumError::VerificationFailure {
                expected: expected.to_string(),
                computed,
            })
        }
    }
}
