//! Structured logging integration for events
//!
//! Converts domain events into `tracing` records with structured fields, so
//! a JSON log file carries the full job history. Every record is written at
//! the level [`AppEvent::log_level`] assigns to its event.

use lxpkg_events::{AppEvent, BuildEvent, DownloadEvent, GeneralEvent, JobEvent, UninstallEvent};
use tracing::Level;

/// `tracing::event!` with a level chosen at runtime
///
/// Callsite levels must be constants, so each level gets its own callsite.
macro_rules! event_at {
    ($level:expr, target: $target:literal, $($rest:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::event!(target: $target, Level::ERROR, $($rest)+);
        } else if level == Level::WARN {
            tracing::event!(target: $target, Level::WARN, $($rest)+);
        } else if level == Level::INFO {
            tracing::event!(target: $target, Level::INFO, $($rest)+);
        } else if level == Level::DEBUG {
            tracing::event!(target: $target, Level::DEBUG, $($rest)+);
        } else {
            tracing::event!(target: $target, Level::TRACE, $($rest)+);
        }
    }};
}

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let level = event.log_level();
    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                event_at!(level, target: "lxpkg::events::general", context = ?context, "{message}");
            }
            GeneralEvent::DebugLog { message, context } => {
                event_at!(level, target: "lxpkg::events::general", context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                event_at!(level, target: "lxpkg::events::general", operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                event_at!(
                    level,
                    target: "lxpkg::events::general",
                    operation = %operation,
                    success,
                    "Operation completed"
                );
            }
        },

        AppEvent::Download(download) => match download {
            DownloadEvent::Started { url, total_bytes } => {
                event_at!(level, target: "lxpkg::events::download", url = %url, total_bytes = ?total_bytes, "Download started");
            }
            DownloadEvent::CacheHit { url, path } => {
                event_at!(
                    level,
                    target: "lxpkg::events::download",
                    url = %url,
                    path = %path.display(),
                    "Artifact already present"
                );
            }
            DownloadEvent::Completed {
                url,
                path,
                bytes_downloaded,
                duration,
            } => {
                event_at!(
                    level,
                    target: "lxpkg::events::download",
                    url = %url,
                    path = %path.display(),
                    bytes_downloaded,
                    duration_ms = duration.as_millis(),
                    "Download completed"
                );
            }
            DownloadEvent::Failed { url, failure } => {
                event_at!(
                    level,
                    target: "lxpkg::events::download",
                    url = %url,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Download failed"
                );
            }
        },

        AppEvent::Build(build) => match build {
            BuildEvent::Extracted {
                artifact,
                source_dir,
                entries,
            } => {
                event_at!(
                    level,
                    target: "lxpkg::events::build",
                    artifact = %artifact.display(),
                    source_dir = %source_dir.display(),
                    entries,
                    "Archive extracted"
                );
            }
            BuildEvent::StageStarted { stage, commands } => {
                event_at!(level, target: "lxpkg::events::build", %stage, commands, "Stage started");
            }
            BuildEvent::CommandStarted {
                stage,
                command,
                privileged,
                working_dir,
            } => {
                event_at!(
                    level,
                    target: "lxpkg::events::build",
                    %stage,
                    command = %command,
                    privileged,
                    working_dir = %working_dir.display(),
                    "Command started"
                );
            }
            BuildEvent::CommandCompleted {
                stage,
                command,
                exit_code,
                duration,
            } => {
                event_at!(
                    level,
                    target: "lxpkg::events::build",
                    %stage,
                    command = %command,
                    exit_code = ?exit_code,
                    duration_ms = duration.as_millis(),
                    "Command completed"
                );
            }
            BuildEvent::StageCompleted { stage, duration } => {
                event_at!(
                    level,
                    target: "lxpkg::events::build",
                    %stage,
                    duration_ms = duration.as_millis(),
                    "Stage completed"
                );
            }
        },

        AppEvent::Job(job) => match job {
            JobEvent::Started { package } => {
                event_at!(level, target: "lxpkg::events::job", package = %package, "Job started");
            }
            JobEvent::StateChanged { package, state } => {
                event_at!(level, target: "lxpkg::events::job", package = %package, %state, "Job state changed");
            }
            JobEvent::Progress { percent } => {
                event_at!(level, target: "lxpkg::events::job", percent, "Job progress");
            }
            JobEvent::Status { message } => {
                event_at!(level, target: "lxpkg::events::job", "{message}");
            }
            JobEvent::Completed {
                package,
                message,
                error_detail,
                ..
            } => {
                event_at!(
                    level,
                    target: "lxpkg::events::job",
                    package = %package,
                    detail = %error_detail,
                    "{message}"
                );
            }
        },

        AppEvent::Uninstall(uninstall) => match uninstall {
            UninstallEvent::Started { package, entries } => {
                event_at!(level, target: "lxpkg::events::uninstall", package = %package, entries, "Removal started");
            }
            UninstallEvent::FileRemoved { path } => {
                event_at!(level, target: "lxpkg::events::uninstall", path = %path.display(), "File removed");
            }
            UninstallEvent::FileMissing { path } => {
                event_at!(level, target: "lxpkg::events::uninstall", path = %path.display(), "File already absent");
            }
            UninstallEvent::Completed {
                package,
                removed,
                missing,
            } => {
                event_at!(
                    level,
                    target: "lxpkg::events::uninstall",
                    package = %package,
                    removed,
                    missing,
                    "Removal completed"
                );
            }
        },
    }
}
