//! Installation job state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of an installation job
///
/// ```text
/// Pending -> Loading -> Fetching -> Extracting -> [Configuring] -> [Compiling]
///         -> [Installing] -> Cleanup -> Succeeded
/// ```
///
/// Any non-terminal state may move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Loading,
    Fetching,
    Extracting,
    Configuring,
    Compiling,
    Installing,
    Cleanup,
    Succeeded,
    Failed,
}

impl JobState {
    /// Whether the job can no longer change state
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Progress reported once this state has completed successfully
    #[must_use]
    pub const fn milestone(self) -> Option<u8> {
        match self {
            Self::Loading => Some(10),
            Self::Fetching => Some(30),
            Self::Extracting => Some(50),
            Self::Configuring => Some(60),
            Self::Compiling => Some(80),
            Self::Installing => Some(90),
            Self::Cleanup => Some(100),
            Self::Pending | Self::Succeeded | Self::Failed => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition
    ///
    /// Forward moves may skip the optional build stages but never go back.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed => true,
            Self::Pending => false,
            Self::Loading => self == Self::Pending,
            Self::Fetching => self == Self::Loading,
            Self::Extracting => self == Self::Fetching,
            Self::Configuring | Self::Compiling | Self::Installing | Self::Cleanup => {
                self >= Self::Extracting && self < next
            }
            Self::Succeeded => self == Self::Cleanup,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Loading => "loading",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Configuring => "configuring",
            Self::Compiling => "compiling",
            Self::Installing => "installing",
            Self::Cleanup => "cleanup",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            JobState::Pending,
            JobState::Loading,
            JobState::Fetching,
            JobState::Extracting,
            JobState::Configuring,
            JobState::Compiling,
            JobState::Installing,
            JobState::Cleanup,
            JobState::Succeeded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_optional_stages_can_be_skipped() {
        assert!(JobState::Extracting.can_transition_to(JobState::Compiling));
        assert!(JobState::Extracting.can_transition_to(JobState::Cleanup));
        assert!(JobState::Configuring.can_transition_to(JobState::Installing));
    }

    #[test]
    fn test_no_backwards_or_terminal_moves() {
        assert!(!JobState::Compiling.can_transition_to(JobState::Configuring));
        assert!(!JobState::Loading.can_transition_to(JobState::Extracting));
        assert!(!JobState::Succeeded.can_transition_to(JobState::Failed));
        assert!(!JobState::Failed.can_transition_to(JobState::Loading));
    }

    #[test]
    fn test_any_active_state_can_fail() {
        for state in [
            JobState::Pending,
            JobState::Loading,
            JobState::Fetching,
            JobState::Extracting,
            JobState::Configuring,
            JobState::Compiling,
            JobState::Installing,
            JobState::Cleanup,
        ] {
            assert!(state.can_transition_to(JobState::Failed));
        }
    }

    #[test]
    fn test_milestones_increase_along_the_path() {
        let milestones: Vec<u8> = [
            JobState::Loading,
            JobState::Fetching,
            JobState::Extracting,
            JobState::Configuring,
            JobState::Compiling,
            JobState::Installing,
            JobState::Cleanup,
        ]
        .iter()
        .filter_map(|s| s.milestone())
        .collect();
        assert_eq!(milestones, vec![10, 30, 50, 60, 80, 90, 100]);
        assert_eq!(JobState::Failed.milestone(), None);
    }
}
