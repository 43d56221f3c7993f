use lxpkg_types::Stage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Extraction and build stage events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Archive unpacked and source root identified
    Extracted {
        artifact: PathBuf,
        source_dir: PathBuf,
        entries: usize,
    },

    /// Stage started
    StageStarted { stage: Stage, commands: usize },

    /// Command about to run (after privilege rewriting)
    CommandStarted {
        stage: Stage,
        command: String,
        privileged: bool,
        working_dir: PathBuf,
    },

    /// Command exited
    CommandCompleted {
        stage: Stage,
        command: String,
        exit_code: Option<i32>,
        duration: Duration,
    },

    /// Every command of the stage exited successfully
    StageCompleted { stage: Stage, duration: Duration },
}
