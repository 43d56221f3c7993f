//! Installation job record

use lxpkg_errors::{Error, UserFacingError};
use lxpkg_types::JobState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a job ended in `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
    /// Captured stderr for build failures, the error text otherwise
    pub detail: String,
}

impl JobFailure {
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        Self {
            code: error.user_code().map(str::to_string),
            message: error.user_message().into_owned(),
            detail: error.diagnostic_detail(),
        }
    }
}

/// Point-in-time view of a job for presentation layers that poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Identifies the job in logs
    pub id: Uuid,
    pub package: String,
    pub state: JobState,
    pub progress: u8,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<JobFailure>,
}

/// Mutable state of one installation job
///
/// Owned by the task running the job; everyone else sees [`JobSnapshot`]s.
#[derive(Debug)]
pub(crate) struct InstallationJob {
    id: Uuid,
    package: String,
    state: JobState,
    progress: u8,
    status: Option<String>,
    failure: Option<JobFailure>,
}

impl InstallationJob {
    pub(crate) fn new(package: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            package: package.into(),
            state: JobState::Pending,
            progress: 0,
            status: None,
            failure: None,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn package(&self) -> &str {
        &self.package
    }

    pub(crate) fn state(&self) -> JobState {
        self.state
    }

    /// Move to `next`
    ///
    /// # Errors
    ///
    /// Returns an internal error for an illegal transition; the state is
    /// left unchanged.
    pub(crate) fn transition(&mut self, next: JobState) -> Result<(), Error> {
        if !self.state.can_transition_to(next) {
            return Err(Error::internal(format!(
                "illegal job transition {} -> {next}",
                self.state
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Record the milestone of the current state
    ///
    /// Returns the new percentage when it actually advanced, so callers
    /// report each milestone at most once and never a lower value.
    pub(crate) fn complete_state(&mut self) -> Option<u8> {
        let milestone = self.state.milestone()?;
        if milestone <= self.progress {
            return None;
        }
        self.progress = milestone;
        Some(milestone)
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub(crate) fn fail(&mut self, error: &Error) {
        // Failed is reachable from every non-terminal state
        if !self.state.is_terminal() {
            self.state = JobState::Failed;
        }
        self.failure = Some(JobFailure::from_error(error));
    }

    pub(crate) fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            package: self.package.clone(),
            state: self.state,
            progress: self.progress,
            status: self.status.clone(),
            failure: self.failure.clone(),
        }
    }
}
