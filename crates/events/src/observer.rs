//! Callback contract for presentation layers
//!
//! A front end that prefers callbacks over matching on [`AppEvent`] implements
//! [`JobObserver`] and feeds every received event through [`dispatch`].

use crate::{AppEvent, JobEvent};

/// Receives the three job notifications a presentation layer needs
pub trait JobObserver {
    /// Progress milestone reached (0-100)
    fn on_progress(&mut self, percent: u8);

    /// New status line
    fn on_status(&mut self, message: &str);

    /// Job finished; called exactly once per job
    fn on_complete(&mut self, success: bool, message: &str, error_detail: &str);
}

/// Route a job event to `observer`
///
/// Events from other domains are ignored. Returns `true` when the event was
/// the job's completion, so callers can stop their receive loop.
pub fn dispatch<O: JobObserver + ?Sized>(event: &AppEvent, observer: &mut O) -> bool {
    let AppEvent::Job(job_event) = event else {
        return false;
    };
    match job_event {
        JobEvent::Progress { percent } => observer.on_progress(*percent),
        JobEvent::Status { message } => observer.on_status(message),
        JobEvent::Completed {
            success,
            message,
            error_detail,
            ..
        } => {
            observer.on_complete(*success, message, error_detail);
            return true;
        }
        JobEvent::Started { .. } | JobEvent::StateChanged { .. } => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneralEvent;

    #[derive(Default)]
    struct Recorder {
        progress: Vec<u8>,
        status: Vec<String>,
        completed: Option<(bool, String, String)>,
    }

    impl JobObserver for Recorder {
        fn on_progress(&mut self, percent: u8) {
            self.progress.push(percent);
        }

        fn on_status(&mut self, message: &str) {
            self.status.push(message.to_string());
        }

        fn on_complete(&mut self, success: bool, message: &str, error_detail: &str) {
            self.completed = Some((success, message.to_string(), error_detail.to_string()));
        }
    }

    #[test]
    fn test_dispatch_routes_job_events() {
        let mut recorder = Recorder::default();
        let events = [
            AppEvent::Job(JobEvent::Progress { percent: 10 }),
            AppEvent::General(GeneralEvent::debug("ignored")),
            AppEvent::Job(JobEvent::Status {
                message: "Compiling...".to_string(),
            }),
        ];
        for event in &events {
            assert!(!dispatch(event, &mut recorder));
        }

        let done = AppEvent::Job(JobEvent::Completed {
            package: "pkg".to_string(),
            success: true,
            message: "'pkg' installed".to_string(),
            error_detail: String::new(),
        });
        assert!(dispatch(&done, &mut recorder));

        assert_eq!(recorder.progress, vec![10]);
        assert_eq!(recorder.status, vec!["Compiling...".to_string()]);
        assert_eq!(
            recorder.completed,
            Some((true, "'pkg' installed".to_string(), String::new()))
        );
    }
}
