use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Manifest-driven removal events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UninstallEvent {
    /// Removal started
    Started { package: String, entries: usize },

    /// A manifest file was deleted
    FileRemoved { path: PathBuf },

    /// A manifest file was already absent
    FileMissing { path: PathBuf },

    /// Removal finished
    Completed {
        package: String,
        removed: usize,
        missing: usize,
    },
}
