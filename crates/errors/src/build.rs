//! Build stage error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("{stage} stage failed running `{command}`: {stderr}")]
    StageFailed {
        stage: String,
        command: String,
        stderr: String,
    },

    #[error("{stage} stage could not start `{command}`: {message}")]
    Spawn {
        stage: String,
        command: String,
        message: String,
    },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::StageFailed { stage, command, .. } => {
                Cow::Owned(format!("{stage} stage failed running `{command}`"))
            }
            Self::Spawn { .. } => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::StageFailed { .. } => Some(
                "The build tree was kept in the build root; inspect it and the command output.",
            ),
            Self::Spawn { .. } => Some("Check that the configured shell is installed."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::StageFailed { .. } => "build.stage_failed",
            Self::Spawn { .. } => "build.spawn_failed",
        };
        Some(code)
    }
}
