//! Event handling and progress display

use console::{Style, Term};
use lxpkg_events::{
    dispatch, AppEvent, BuildEvent, DownloadEvent, GeneralEvent, JobObserver, UninstallEvent,
};

/// Event handler for progress display and user feedback
///
/// Every event is forwarded to `tracing`; terminal output goes to stderr so
/// stdout stays reserved for the rendered result.
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    /// Suppress terminal output (JSON mode)
    quiet: bool,
    /// Last progress milestone, shown as a prefix on status lines
    progress: u8,
    completed: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
            progress: 0,
            completed: false,
        }
    }

    /// Whether a job completion has been seen
    #[allow(dead_code)] // Used in tests
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        crate::logging::log_event_with_tracing(&event);

        if dispatch(&event, self) {
            self.completed = true;
            return;
        }

        match event {
            AppEvent::General(GeneralEvent::Warning { message, context }) => match context {
                Some(context) => self.show_warning(&format!("{message}: {context}")),
                None => self.show_warning(&message),
            },
            AppEvent::Download(DownloadEvent::Started { url, total_bytes }) => {
                let size = total_bytes.map(|b| format!(" ({})", format_bytes(b)));
                self.show_detail(&format!("Downloading {url}{}", size.unwrap_or_default()));
            }
            AppEvent::Download(DownloadEvent::CacheHit { path, .. }) => {
                self.show_detail(&format!("Using existing {}", path.display()));
            }
            AppEvent::Build(BuildEvent::CommandStarted {
                command,
                privileged: true,
                ..
            }) => {
                self.show_detail(&format!("Privileged: {command}"));
            }
            AppEvent::Uninstall(UninstallEvent::FileRemoved { path }) => {
                self.show_detail(&format!("Removed {}", path.display()));
            }
            AppEvent::Uninstall(UninstallEvent::FileMissing { path }) if self.debug_enabled => {
                self.show_detail(&format!("Not present {}", path.display()));
            }
            // Remaining events are only logged
            _ => {}
        }
    }

    fn style(&self, style: Style) -> Style {
        if self.colors_enabled {
            style
        } else {
            Style::new()
        }
    }

    fn write(&self, line: &str) {
        if !self.quiet {
            let _ = self.term.write_line(line);
        }
    }

    fn show_status(&self, message: &str) {
        let prefix = self
            .style(Style::new().cyan())
            .apply_to(format!("[{:>3}%]", self.progress));
        self.write(&format!("{prefix} {message}"));
    }

    fn show_detail(&self, message: &str) {
        let line = self.style(Style::new().dim()).apply_to(message);
        self.write(&format!("       {line}"));
    }

    fn show_success(&self, message: &str) {
        let mark = self.style(Style::new().green().bold()).apply_to("✓");
        self.write(&format!("{mark} {message}"));
    }

    fn show_warning(&self, message: &str) {
        let label = self.style(Style::new().yellow().bold()).apply_to("warning:");
        self.write(&format!("{label} {message}"));
    }

    fn show_error(&self, message: &str) {
        let mark = self.style(Style::new().red().bold()).apply_to("✗");
        self.write(&format!("{mark} {message}"));
    }
}

impl JobObserver for EventHandler {
    fn on_progress(&mut self, percent: u8) {
        self.progress = self.progress.max(percent);
    }

    fn on_status(&mut self, message: &str) {
        self.show_status(message);
    }

    fn on_complete(&mut self, success: bool, message: &str, error_detail: &str) {
        if success {
            self.show_success(message);
            return;
        }
        self.show_error(message);
        for line in error_detail.lines() {
            self.show_detail(line);
        }
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lxpkg_events::JobEvent;

    #[test]
    fn test_progress_tracks_highest_milestone() {
        let mut handler = EventHandler::new(false, false, true);
        handler.handle_event(AppEvent::Job(JobEvent::Progress { percent: 30 }));
        handler.handle_event(AppEvent::Job(JobEvent::Progress { percent: 10 }));
        assert_eq!(handler.progress, 30);
        assert!(!handler.completed());
    }

    #[test]
    fn test_completion_is_recorded() {
        let mut handler = EventHandler::new(false, false, true);
        handler.handle_event(AppEvent::Job(JobEvent::Completed {
            package: "zlib".to_string(),
            success: false,
            message: "Failed: compile stage failed running `make`".to_string(),
            error_detail: "make: *** No targets.  Stop.\n".to_string(),
        }));
        assert!(handler.completed());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
