//! Installed-file tracking error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum InstallError {
    #[error("failed to remove {path}: {message}")]
    RemoveFailed { path: String, message: String },

    #[error("manifest entry escapes the install root: {path}")]
    PathEscape { path: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::RemoveFailed { .. } => {
                Some("Files listed before this one were already removed; fix permissions and rerun.")
            }
            Self::PathEscape { .. } => Some("Manifest paths must be relative to the install root."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::RemoveFailed { .. } => "install.remove_failed",
            Self::PathEscape { .. } => "install.path_escape",
        };
        Some(code)
    }
}
