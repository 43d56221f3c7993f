use lxpkg_types::JobState;
use serde::{Deserialize, Serialize};

/// Installation job events
///
/// Per job a presentation layer sees zero or more `Progress`/`Status`
/// events followed by exactly one `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    /// Job accepted and running in the background
    Started { package: String },

    /// Job entered a new state
    StateChanged { package: String, state: JobState },

    /// Progress milestone reached (0-100, never decreasing within a job)
    Progress { percent: u8 },

    /// Human readable status line
    Status { message: String },

    /// Job finished
    Completed {
        package: String,
        success: bool,
        message: String,
        error_detail: String,
    },
}
