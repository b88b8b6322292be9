//! Artifact download with bounded, manually followed redirects.
//!
//! The body is streamed into `<destination>.part` and only renamed over the
//! destination once it has been fully written and closed, so a failed
//! download never leaves a truncated artifact behind.

use camino::{Utf8Path, Utf8PathBuf};
use futures_util::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{Client, Url};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Errors that can occur while downloading the artifact
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Download of {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Gave up after following {limit} redirects (last location: {last_url})")]
    TooManyRedirects { limit: usize, last_url: String },

    #[error("Redirect from {url} (HTTP {status}) has no usable Location header")]
    MissingLocation { url: String, status: u16 },

    #[error("Invalid download URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One request of a download: where to fetch from and where the body goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: Url,
    pub destination: Utf8PathBuf,
}

impl DownloadTarget {
    pub fn new(url: &str, destination: impl Into<Utf8PathBuf>) -> Result<Self, DownloadError> {
        let url = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            url,
            destination: destination.into(),
        })
    }

    /// Target for a redirect: new URL, same destination.
    fn redirected(&self, url: Url) -> Self {
        Self {
            url,
            destination: self.destination.clone(),
        }
    }
}

/// Result of a completed download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: Utf8PathBuf,
    pub bytes_written: u64,
    pub redirects_followed: usize,
    pub final_url: String,
}

/// Download `url` to `destination`, following up to `max_redirects` redirects.
///
/// `client` must not follow redirects on its own (see
/// [`build_download_client`](crate::services::http::build_download_client)).
/// The parent directory of `destination` must already exist.
pub async fn download_file(
    client: &Client,
    url: &str,
    destination: &Utf8Path,
    max_redirects: usize,
) -> Result<DownloadOutcome, DownloadError> {
    let mut target = DownloadTarget::new(url, destination)?;
    let mut redirects = 0usize;

    let response = loop {
        tracing::debug!("GET {}", target.url);

        let response = client
            .get(target.url.clone())
            .send()
            .await
            .map_err(|source| DownloadError::Transport {
                url: target.url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_redirection() {
            break response;
        }

        let next = redirect_location(&target.url, &response).ok_or_else(|| {
            DownloadError::MissingLocation {
                url: target.url.to_string(),
                status: status.as_u16(),
            }
        })?;

        if redirects >= max_redirects {
            return Err(DownloadError::TooManyRedirects {
                limit: max_redirects,
                last_url: next.to_string(),
            });
        }
        redirects += 1;

        tracing::debug!("Following HTTP {} redirect to {}", status.as_u16(), next);
        target = target.redirected(next);
    };

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: target.url.to_string(),
            status: status.as_u16(),
        });
    }

    let partial = partial_path(&target.destination);
    let written = match stream_to_file(response, &target, &partial).await {
        Ok(written) => written,
        Err(e) => {
            remove_partial(&partial).await;
            return Err(e);
        }
    };

    if let Err(source) = tokio::fs::rename(&partial, &target.destination).await {
        remove_partial(&partial).await;
        return Err(DownloadError::Io {
            path: target.destination.clone(),
            source,
        });
    }

    tracing::info!(
        "Downloaded {} bytes from {} to {}",
        written,
        target.url,
        target.destination
    );

    Ok(DownloadOutcome {
        path: target.destination,
        bytes_written: written,
        redirects_followed: redirects,
        final_url: target.url.to_string(),
    })
}

/// Resolve the `Location` header of a redirect against the URL that produced it.
fn redirect_location(current: &Url, response: &reqwest::Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

fn partial_path(destination: &Utf8Path) -> Utf8PathBuf {
    let mut name = destination.file_name().unwrap_or("download").to_string();
    name.push_str(".part");
    destination.with_file_name(name)
}

async fn stream_to_file(
    response: reqwest::Response,
    target: &DownloadTarget,
    partial: &Utf8Path,
) -> Result<u64, DownloadError> {
    let io_error = |source| DownloadError::Io {
        path: partial.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(partial).await.map_err(io_error)?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| DownloadError::Transport {
            url: target.url.to_string(),
            source,
        })?;
        file.write_all(&chunk).await.map_err(io_error)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(io_error)?;
    file.sync_all().await.map_err(io_error)?;
    // Close the handle before the rename; Windows refuses to move open files
    drop(file);

    Ok(written)
}

async fn remove_partial(partial: &Utf8Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => tracing::debug!("Removed partial download {}", partial),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove partial download {}: {}", partial, e),
    }
}
