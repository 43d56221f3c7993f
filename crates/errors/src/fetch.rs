//! Source fetch error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("HTTP error {status} fetching {url}")]
    Http { url: String, status: u16 },

    #[error("download of {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("failed to write {path}: {message}")]
    Io { path: String, message: String },

    #[error("HTTP client setup failed: {message}")]
    Client { message: String },
}

impl UserFacingError for FetchError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidUrl { .. } => Some("Correct the first `src` entry of the descriptor."),
            Self::Http { status, .. } if *status == 404 => {
                Some("The upstream artifact moved; update the descriptor's `src` URL.")
            }
            Self::Http { .. } | Self::Transport { .. } => {
                Some("Check your network connection and retry.")
            }
            Self::Io { .. } => Some("Ensure the build root is writable and has free space."),
            Self::Client { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidUrl { .. } => "fetch.invalid_url",
            Self::Http { .. } => "fetch.http_error",
            Self::Transport { .. } => "fetch.transport_error",
            Self::Io { .. } => "fetch.io_error",
            Self::Client { .. } => "fetch.client_error",
        };
        Some(code)
    }
}
