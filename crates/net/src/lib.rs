#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Source artifact fetching for lxpkg
//!
//! [`fetch`] places the artifact named by a URL into a destination
//! directory. A file already present under that name is reused without
//! touching the network.

mod client;

pub use client::{NetClient, NetConfig};

use futures::StreamExt;
use lxpkg_errors::{Error, FetchError};
use lxpkg_events::{AppEvent, DownloadEvent, EventEmitter, EventSender, FailureContext};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Suffix of the in-progress download file
const PARTIAL_SUFFIX: &str = "part";

/// File name an artifact fetched from `url` is stored under
///
/// This is the last segment of the URL path; query and fragment are
/// ignored.
///
/// # Errors
///
/// Returns `FetchError::InvalidUrl` if `url` does not parse or its path has
/// no usable last segment.
pub fn artifact_name(url: &str) -> Result<String, Error> {
    let invalid = || FetchError::InvalidUrl {
        url: url.to_string(),
    };
    let parsed = Url::parse(url).map_err(|_| invalid())?;
    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .ok_or_else(invalid)?;
    Ok(name.to_string())
}

/// Fetch `url` into `dest_dir`, returning the artifact path
///
/// Idempotent: when `dest_dir/<artifact name>` exists it is returned with no
/// network access. A fresh download is streamed into a `.part` file and
/// renamed into place once complete, so an interrupted download is never
/// mistaken for a cached artifact.
///
/// # Errors
///
/// Returns a `FetchError` for an unusable URL, a transport failure, an HTTP
/// error status, or a failure writing the file.
pub async fn fetch(
    client: &NetClient,
    url: &str,
    dest_dir: &Path,
    tx: &EventSender,
) -> Result<PathBuf, Error> {
    let name = artifact_name(url)?;
    let dest = dest_dir.join(&name);

    if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
        tracing::debug!(url, path = %dest.display(), "artifact already present");
        tx.emit(AppEvent::Download(DownloadEvent::CacheHit {
            url: url.to_string(),
            path: dest.clone(),
        }));
        return Ok(dest);
    }

    match download(client, url, dest_dir, &dest, tx).await {
        Ok(()) => {
            tx.emit_status(format!("Downloaded {name}"));
            Ok(dest)
        }
        Err(e) => {
            tx.emit(AppEvent::Download(DownloadEvent::Failed {
                url: url.to_string(),
                failure: FailureContext::from_error(&e),
            }));
            Err(e)
        }
    }
}

async fn download(
    client: &NetClient,
    url: &str,
    dest_dir: &Path,
    dest: &Path,
    tx: &EventSender,
) -> Result<(), Error> {
    let start = Instant::now();
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| io_error(dest_dir, &e))?;

    let response = client.get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    tx.emit(AppEvent::Download(DownloadEvent::Started {
        url: url.to_string(),
        total_bytes: response.content_length(),
    }));

    let partial = partial_path(dest);
    let written = match stream_to_file(response, url, &partial).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
    };

    tokio::fs::rename(&partial, dest)
        .await
        .map_err(|e| io_error(dest, &e))?;

    tracing::debug!(url, path = %dest.display(), bytes = written, "download complete");
    tx.emit(AppEvent::Download(DownloadEvent::Completed {
        url: url.to_string(),
        path: dest.to_path_buf(),
        bytes_downloaded: written,
        duration: start.elapsed(),
    }));
    Ok(())
}

async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, Error> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| io_error(path, &e))?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk: bytes::Bytes = chunk.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| io_error(path, &e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| io_error(path, &e))?;
    Ok(written)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}

fn io_error(path: &Path, err: &std::io::Error) -> Error {
    FetchError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name_uses_last_path_segment() {
        assert_eq!(
            artifact_name("https://example.org/dl/hello-2.12.tar.gz").unwrap(),
            "hello-2.12.tar.gz"
        );
        assert_eq!(
            artifact_name("https://example.org/dl/zlib.tar.xz?mirror=1#frag").unwrap(),
            "zlib.tar.xz"
        );
    }

    #[test]
    fn test_artifact_name_rejects_unusable_urls() {
        for url in ["not a url", "https://example.org/", "https://example.org/dir/"] {
            assert!(
                matches!(
                    artifact_name(url),
                    Err(Error::Fetch(FetchError::InvalidUrl { .. }))
                ),
                "{url}"
            );
        }
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/b/pkg-1.0.tar.gz")),
            PathBuf::from("/b/pkg-1.0.tar.gz.part")
        );
    }
}
