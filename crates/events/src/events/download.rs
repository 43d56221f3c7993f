use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::FailureContext;

/// Source artifact download events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// A fresh download started
    Started {
        url: String,
        total_bytes: Option<u64>,
    },

    /// The artifact was already present in the destination directory
    CacheHit { url: String, path: PathBuf },

    /// Download finished and the artifact was moved into place
    Completed {
        url: String,
        path: PathBuf,
        bytes_downloaded: u64,
        duration: Duration,
    },

    /// Download failed; no artifact was left behind
    Failed {
        url: String,
        failure: FailureContext,
    },
}
