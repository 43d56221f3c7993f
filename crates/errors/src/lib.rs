#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the lxpkg source installer
//!
//! This crate provides fine-grained error types organized by pipeline stage.
//! All error types implement Clone so they can travel inside events.

use std::borrow::Cow;

use thiserror::Error;

pub mod build;
pub mod config;
pub mod descriptor;
pub mod extract;
pub mod fetch;
pub mod install;
pub mod job;

// Re-export all error types at the root
pub use build::BuildError;
pub use config::ConfigError;
pub use descriptor::DescriptorError;
pub use extract::ExtractError;
pub use fetch::FetchError;
pub use install::InstallError;
pub use job::JobError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("install error: {0}")]
    Install(#[from] InstallError),

    #[error("job error: {0}")]
    Job(#[from] JobError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// Raw diagnostic text for this error
    ///
    /// For a failed build command this is the command's captured standard
    /// error; for everything else it is the display text.
    #[must_use]
    pub fn diagnostic_detail(&self) -> String {
        match self {
            Error::Build(BuildError::StageFailed { stderr, .. }) => stderr.clone(),
            _ => self.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for lxpkg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for analytics / structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Descriptor(err) => err.user_message(),
            Error::Fetch(err) => err.user_message(),
            Error::Build(err) => err.user_message(),
            Error::Install(err) => err.user_message(),
            Error::Job(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Descriptor(err) => err.user_hint(),
            Error::Fetch(err) => err.user_hint(),
            Error::Extract(err) => err.user_hint(),
            Error::Build(err) => err.user_hint(),
            Error::Install(err) => err.user_hint(),
            Error::Job(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Fetch(err) => err.is_retryable(),
            Error::Job(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Descriptor(err) => err.user_code(),
            Error::Fetch(err) => err.user_code(),
            Error::Extract(err) => err.user_code(),
            Error::Build(err) => err.user_code(),
            Error::Install(err) => err.user_code(),
            Error::Job(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
