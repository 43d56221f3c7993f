//! Integration tests for events

#[cfg(test)]
mod tests {
    use lxpkg_events::*;

    #[tokio::test]
    async fn test_event_emitter_helpers() {
        let (tx, mut rx) = channel();

        tx.emit_status("Loaded: pkg.toml");
        tx.emit_progress(10);
        tx.emit_debug("test debug");

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            AppEvent::Job(JobEvent::Status { ref message }) if message == "Loaded: pkg.toml"
        ));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::Job(JobEvent::Progress { percent: 10 })));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::General(GeneralEvent::DebugLog { .. })));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning_with_context("ignored", "no receiver");
    }

    #[test]
    fn test_absent_sender_is_noop() {
        let tx: Option<EventSender> = None;
        tx.emit_status("nobody listening");
    }

    #[test]
    fn test_failed_completion_logs_as_error() {
        let event = AppEvent::Job(JobEvent::Completed {
            package: "pkg".to_string(),
            success: false,
            message: "Failed: boom".to_string(),
            error_detail: "boom".to_string(),
        });
        assert_eq!(event.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_failed_operation_logs_as_warning() {
        let failed = AppEvent::General(GeneralEvent::OperationCompleted {
            operation: "Removing pkg".to_string(),
            success: false,
        });
        assert_eq!(failed.log_level(), tracing::Level::WARN);

        let done = AppEvent::General(GeneralEvent::OperationCompleted {
            operation: "Removing pkg".to_string(),
            success: true,
        });
        assert_eq!(done.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = AppEvent::Job(JobEvent::Progress { percent: 50 });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "job");
        assert_eq!(json["event"]["type"], "Progress");
        assert_eq!(json["event"]["percent"], 50);
    }
}
