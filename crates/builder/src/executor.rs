//! Build stage execution

use crate::privilege::{PrivilegeEscalation, SudoMatcher};
use lxpkg_errors::{BuildError, Error};
use lxpkg_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use lxpkg_types::Stage;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;

/// Runs the shell commands of a build stage inside an unpacked source tree
#[derive(Debug, Clone)]
pub struct StageExecutor {
    shell: String,
    escalation: Arc<dyn PrivilegeEscalation>,
    matcher: SudoMatcher,
    tx: EventSender,
}

impl EventEmitter for StageExecutor {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

impl StageExecutor {
    /// # Errors
    ///
    /// Returns an internal error if the sudo pattern fails to compile.
    pub fn new(
        shell: impl Into<String>,
        escalation: Arc<dyn PrivilegeEscalation>,
        tx: EventSender,
    ) -> Result<Self, Error> {
        Ok(Self {
            shell: shell.into(),
            escalation,
            matcher: SudoMatcher::new()?,
            tx,
        })
    }

    /// Run `commands` in order with `src_dir` as working directory
    ///
    /// Emits `"<Label>: <command>"` before each command and `"<Label> done"`
    /// once all of them succeeded. The first failing command stops the
    /// stage.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::StageFailed` carrying the command's captured
    /// standard error when it exits non-zero or is killed by a signal, and
    /// `BuildError::Spawn` when the shell cannot be started.
    pub async fn run_stage(
        &self,
        stage: Stage,
        src_dir: &Path,
        commands: &[String],
    ) -> Result<(), Error> {
        let started = Instant::now();
        self.emit(AppEvent::Build(BuildEvent::StageStarted {
            stage,
            commands: commands.len(),
        }));

        for command in commands {
            self.emit_status(format!("{}: {command}", stage.label()));
            self.run_command(stage, src_dir, command).await?;
        }

        self.emit_status(format!("{} done", stage.label()));
        self.emit(AppEvent::Build(BuildEvent::StageCompleted {
            stage,
            duration: started.elapsed(),
        }));
        Ok(())
    }

    async fn run_command(&self, stage: Stage, src_dir: &Path, command: &str) -> Result<(), Error> {
        let privileged = self.matcher.is_privileged(command);
        let effective = if privileged {
            let wrapped = self.escalation.wrap(command);
            tracing::info!(
                %stage,
                strategy = self.escalation.name(),
                command = %wrapped,
                "running privileged command"
            );
            wrapped
        } else {
            command.to_string()
        };

        self.emit(AppEvent::Build(BuildEvent::CommandStarted {
            stage,
            command: effective.clone(),
            privileged,
            working_dir: src_dir.to_path_buf(),
        }));

        let started = Instant::now();
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&effective)
            .current_dir(src_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BuildError::Spawn {
                stage: stage.to_string(),
                command: command.to_string(),
                message: e.to_string(),
            })?;

        self.emit(AppEvent::Build(BuildEvent::CommandCompleted {
            stage,
            command: effective,
            exit_code: output.status.code(),
            duration: started.elapsed(),
        }));

        // a signal-terminated command has no exit code and is not a success
        if !output.status.success() {
            return Err(BuildError::StageFailed {
                stage: stage.to_string(),
                command: command.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        tracing::debug!(
            %stage,
            command,
            stdout_bytes = output.stdout.len(),
            "command succeeded"
        );
        Ok(())
    }
}
