//! Descriptor lookup and parsing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DescriptorError {
    #[error("no descriptor found for package '{name}'")]
    NotFound { name: String },

    #[error("invalid descriptor {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to scan source tree {root}: {message}")]
    ScanFailed { root: String, message: String },
}

impl UserFacingError for DescriptorError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Run `lxpkg search` to list known packages, or check the source root.")
            }
            Self::Parse { .. } => {
                Some("Fix the descriptor: [package] needs a `name` and a non-empty `src` list.")
            }
            Self::ScanFailed { .. } => Some("Ensure the source root exists and is readable."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "descriptor.not_found",
            Self::Parse { .. } => "descriptor.parse_error",
            Self::ScanFailed { .. } => "descriptor.scan_failed",
        };
        Some(code)
    }
}
