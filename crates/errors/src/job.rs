//! Job orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum JobError {
    #[error("an installation of '{active}' is already running")]
    AlreadyRunning { active: String },

    #[error("no async runtime available to run jobs")]
    NoRuntime,

    #[error("job for '{package}' ended abnormally: {message}")]
    Aborted { package: String, message: String },
}

impl UserFacingError for JobError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::AlreadyRunning { .. } => Some("Wait for the running installation to finish."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::AlreadyRunning { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::AlreadyRunning { .. } => "job.concurrent",
            Self::NoRuntime => "job.no_runtime",
            Self::Aborted { .. } => "job.aborted",
        };
        Some(code)
    }
}
