use crate::error::{ChecksumError, DownloadError};
use reqwest::{Client, Url};
use std::{path::PathBuf, time::Duration};

/// The value the fake source always resolves to.
pub const FAKE_CHECKSUM: &str = "fakehash";

/// Where the expected checksum of a download comes from.
///
/// Whatever the source yields is used verbatim; no trimming or parsing of
/// `sha256sum`-style lines happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumSource {
    /// A literal checksum.
    Inline(String),
    /// A local file whose entire contents are the checksum.
    File(PathBuf),
    /// A URL whose response body is the checksum.
    Remote(Url),
    /// Always resolves to [`FAKE_CHECKSUM`]. Pair it with a stub verifier to
    /// exercise the pipeline without real digests.
    Fake,
}

impl ChecksumSource {
    /// Picks one source out of the configured inputs. Empty values count as
    /// unset; an inline checksum wins over a file, and a file over a URL.
    pub fn select(
        inline: Option<String>,
        file: Option<PathBuf>,
        url: Option<String>,
    ) -> Result<Option<Self>, DownloadError> {
        if let Some(checksum) = inline.filter(|checksum| !checksum.is_empty()) {
            return Ok(Some(Self::Inline(checksum)));
        }
        if let Some(path) = file.filter(|path| !path.as_os_str().is_empty()) {
            return Ok(Some(Self::File(path)));
        }
        match url.filter(|url| !url.is_empty()) {
            Some(url) => {
                let url = Url::parse(&url).map_err(|err| DownloadError::URLParse(format!("{url}: {err}")))?;
                Ok(Some(Self::Remote(url)))
            }
            None => Ok(None),
        }
    }
    /// Produces the expected checksum. `timeout` bounds receiving the response
    /// headers of a remote checksum.
    pub async fn resolve(&self, client: &Client, timeout: Duration) -> Result<String, ChecksumError> {
        match self {
            Self::Inline(checksum) => Ok(checksum.clone()),
            Self::Fake => Ok(FAKE_CHECKSUM.to_string()),
            Self::File(path) => {
                let contents = tokio::fs::read(path).await.map_err(|source| ChecksumError::LocalFile {
                    path: path.clone(),
                    source,
                })?;
                Ok(String::from_utf8_lossy(&contents).into_owned())
            }
            Self::Remote(url) => {
                let remote_err = |source| ChecksumError::Remote {
                    url: url.to_string(),
                    source,
                };
                log::info!("Fetching checksum from {url}");
                let response = tokio::time::timeout(timeout, client.get(url.clone()).send())
                    .await
                    .map_err(|_| ChecksumError::RemoteTimeout {
                        url: url.to_string(),
                        timeout,
                    })?
                    .map_err(remote_err)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ChecksumError::RemoteStatus {
                        url: url.to_string(),
                        status,
                    });
                }
                let body = response.bytes().await.map_err(remote_err)?;
                Ok(String::from_utf8_lossy(&body).into_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn inline_wins_over_everything() {
        let source = ChecksumSource::select(some("abc"), Some("sum.txt".into()), some("https://example.com/sum")).unwrap();
        assert_eq!(source, Some(ChecksumSource::Inline("abc".into())));
    }

    #[test]
    fn file_wins_over_url() {
        let source = ChecksumSource::select(some(""), Some("sum.txt".into()), some("https://example.com/sum")).unwrap();
        assert_eq!(source, Some(ChecksumSource::File("sum.txt".into())));
    }

    #[test]
    fn url_is_last_resort() {
        let source = ChecksumSource::select(None, Some(PathBuf::new()), some("https://example.com/sum")).unwrap();
        assert_eq!(source, Some(ChecksumSource::Remote(Url::parse("https://example.com/sum").unwrap())));
    }

    #[test]
    fn nothing_configured_means_no_source() {
        assert_eq!(ChecksumSource::select(None, None, None).unwrap(), None);
        assert_eq!(ChecksumSource::select(some(""), None, some("")).unwrap(), None);
    }

    #[test]
    fn bad_checksum_url_is_rejected() {
        assert!(matches!(
            ChecksumSource::select(None, None, some("not a url")),
            Err(DownloadError::URLParse(_))
        ));
    }

    #[tokio::test]
    async fn inline_and_fake_need_no_io() {
        let client = Client::new();
        assert_eq!(ChecksumSource::Inline("ABC123".into()).resolve(&client, TIMEOUT).await.unwrap(), "ABC123");
        assert_eq!(ChecksumSource::Fake.resolve(&client, TIMEOUT).await.unwrap(), FAKE_CHECKSUM);
    }

    #[tokio::test]
    async fn file_contents_are_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.sha256");
        std::fs::write(&path, "deadbeef\n").unwrap();
        let checksum = ChecksumSource::File(path).resolve(&Client::new(), TIMEOUT).await.unwrap();
        assert_eq!(checksum, "deadbeef\n");
    }

    #[tokio::test]
    async fn missing_file_is_a_retrieval_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ChecksumSource::File(dir.path().join("absent"))
            .resolve(&Client::new(), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, ChecksumError::LocalFile { .. }));
    }
}
