use serde::{Deserialize, Serialize};

use lxpkg_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod build;
pub mod download;
pub mod general;
pub mod job;
pub mod uninstall;

pub use build::*;
pub use download::*;
pub use general::*;
pub use job::*;
pub use uninstall::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Source artifact downloads
    Download(DownloadEvent),

    /// Extraction and build stage execution
    Build(BuildEvent),

    /// Installation job lifecycle: progress, status and completion
    Job(JobEvent),

    /// Manifest-driven file removal
    Uninstall(UninstallEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::Download(DownloadEvent::Failed { .. })
            | Self::Job(JobEvent::Completed { success: false, .. }) => Level::ERROR,

            Self::General(
                GeneralEvent::Warning { .. } | GeneralEvent::OperationCompleted { success: false, .. },
            ) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Build(BuildEvent::CommandStarted { .. } | BuildEvent::CommandCompleted { .. })
            | Self::Job(JobEvent::Progress { .. })
            | Self::Uninstall(UninstallEvent::FileMissing { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }
}
