//! Archive extraction error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("unsupported archive format: {path}")]
    Unsupported { path: String },

    #[error("failed to extract {path}: {message}")]
    Failed { path: String, message: String },
}

impl UserFacingError for ExtractError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unsupported { .. } => {
                Some("Supported formats: tar, tar.gz, tar.bz2, tar.xz, tar.zst, zip.")
            }
            Self::Failed { .. } => {
                Some("Delete the cached artifact from the build root so it is downloaded again.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Unsupported { .. } => "extract.unsupported",
            Self::Failed { .. } => "extract.failed",
        };
        Some(code)
    }
}
