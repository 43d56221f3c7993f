#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in lxpkg
//!
//! Pipeline components never print. Everything a presentation layer shows
//! (progress, status lines, the final result of a job) travels as an
//! [`AppEvent`] over an unbounded channel, and every event also carries
//! enough structure to be forwarded to `tracing`.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by pipeline area (Download, Build, Job, ...)
//! - **`EventEmitter` trait**: one API for emitting from anything that owns a sender
//! - **`JobObserver` trait**: callback-style contract for presentation layers

pub mod events;
pub mod observer;

pub use events::{
    AppEvent, BuildEvent, DownloadEvent, FailureContext, GeneralEvent, JobEvent, UninstallEvent,
};
pub use observer::{dispatch, JobObserver};

use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender using the `AppEvent` system
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver using the `AppEvent` system
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel with the `AppEvent` system
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout lxpkg
///
/// This trait provides a single, consistent API for emitting events regardless of
/// whether you have a raw `EventSender` or a struct that contains one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit a job status line
    fn emit_status(&self, message: impl Into<String>) {
        self.emit(AppEvent::Job(JobEvent::Status {
            message: message.into(),
        }));
    }

    /// Emit a job progress percentage
    fn emit_progress(&self, percent: u8) {
        self.emit(AppEvent::Job(JobEvent::Progress { percent }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
/// This allows `EventSender` to be used directly where `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

/// Emitting through an optional sender is a no-op when it is absent
impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
