//! Background installation jobs with a single-flight slot
//!
//! [`Orchestrator::start_install`] returns as soon as the job task is
//! spawned. The job reports through the context's event channel: zero or
//! more progress and status events, then exactly one
//! [`JobEvent::Completed`]. At most one job runs at a time. The slot is
//! released before the completion event is sent, so an observer may start
//! the next job as soon as it sees the previous one complete.

use crate::job::{InstallationJob, JobSnapshot};
use crate::OpsCtx;
use futures::FutureExt;
use lxpkg_builder::StageExecutor;
use lxpkg_errors::{DescriptorError, Error, JobError, UserFacingError};
use lxpkg_events::{AppEvent, EventEmitter, JobEvent};
use lxpkg_types::JobState;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Runs installation jobs one at a time
#[derive(Debug)]
pub struct Orchestrator {
    ctx: Arc<OpsCtx>,
    runtime: Handle,
    slot: Arc<Mutex<()>>,
    current: Arc<watch::Sender<Option<JobSnapshot>>>,
}

impl Orchestrator {
    /// Create an orchestrator bound to the calling tokio runtime
    ///
    /// # Errors
    ///
    /// Returns `JobError::NoRuntime` when called outside a tokio runtime.
    pub fn new(ctx: OpsCtx) -> Result<Self, Error> {
        let runtime = Handle::try_current().map_err(|_| JobError::NoRuntime)?;
        let (current, _) = watch::channel(None);
        Ok(Self {
            ctx: Arc::new(ctx),
            runtime,
            slot: Arc::new(Mutex::new(())),
            current: Arc::new(current),
        })
    }

    #[must_use]
    pub fn context(&self) -> &OpsCtx {
        &self.ctx
    }

    /// Snapshot of the running job, `None` when idle
    #[must_use]
    pub fn current_job(&self) -> Option<JobSnapshot> {
        self.current.borrow().clone()
    }

    /// Receiver that observes every snapshot the running job publishes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<JobSnapshot>> {
        self.current.subscribe()
    }

    /// Start installing `name` in the background
    ///
    /// # Errors
    ///
    /// Returns `JobError::AlreadyRunning` while another job holds the slot.
    /// The running job is not affected.
    pub fn start_install(&self, name: &str) -> Result<JobHandle, Error> {
        let Ok(guard) = Arc::clone(&self.slot).try_lock_owned() else {
            let active = self
                .current
                .borrow()
                .as_ref()
                .map(|job| job.package.clone())
                .unwrap_or_default();
            return Err(JobError::AlreadyRunning { active }.into());
        };

        let job = InstallationJob::new(name);
        let job_id = job.id();
        self.current.send_replace(Some(job.snapshot()));

        let ctx = Arc::clone(&self.ctx);
        let current = Arc::clone(&self.current);
        let runner = JobRunner {
            ctx: Arc::clone(&ctx),
            current: Arc::clone(&current),
            job,
        };
        let task = self.runtime.spawn(async move {
            let (snapshot, completed) = runner.run().await;
            current.send_replace(None);
            drop(guard);
            ctx.emit(AppEvent::Job(completed));
            snapshot
        });

        tracing::info!(package = name, %job_id, "installation job started");
        Ok(JobHandle {
            package: name.to_string(),
            task,
        })
    }
}

/// Handle to a spawned installation job
#[derive(Debug)]
pub struct JobHandle {
    package: String,
    task: JoinHandle<JobSnapshot>,
}

impl JobHandle {
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the job has finished and its slot is free again
    ///
    /// # Errors
    ///
    /// Returns `JobError::Aborted` if the job task was cancelled.
    pub async fn wait(self) -> Result<JobSnapshot, Error> {
        let Self { package, task } = self;
        task.await.map_err(|e| {
            JobError::Aborted {
                package,
                message: e.to_string(),
            }
            .into()
        })
    }
}

struct JobRunner {
    ctx: Arc<OpsCtx>,
    current: Arc<watch::Sender<Option<JobSnapshot>>>,
    job: InstallationJob,
}

impl JobRunner {
    /// Drive the job to a terminal state
    ///
    /// Returns the final snapshot and the completion event, which the caller
    /// sends once the slot is free.
    async fn run(mut self) -> (JobSnapshot, JobEvent) {
        let package = self.job.package().to_string();
        let job_id = self.job.id();
        self.ctx.emit(AppEvent::Job(JobEvent::Started {
            package: package.clone(),
        }));

        let outcome = AssertUnwindSafe(self.pipeline()).catch_unwind().await;
        let result = match outcome {
            Ok(result) => result,
            Err(panic) => Err(JobError::Aborted {
                package: package.clone(),
                message: panic_message(panic.as_ref()),
            }
            .into()),
        }
        .and_then(|()| self.job.transition(JobState::Succeeded));

        let (success, message, error_detail) = match &result {
            Ok(()) => {
                tracing::info!(package = %package, %job_id, "installation succeeded");
                (true, format!("'{package}' installed"), String::new())
            }
            Err(e) => {
                tracing::error!(
                    package = %package,
                    %job_id,
                    state = %self.job.state(),
                    error = %e,
                    "installation failed"
                );
                self.job.fail(e);
                (
                    false,
                    format!("Failed: {}", e.user_message()),
                    e.diagnostic_detail(),
                )
            }
        };

        let snapshot = self.job.snapshot();
        self.ctx.emit(AppEvent::Job(JobEvent::StateChanged {
            package: package.clone(),
            state: snapshot.state,
        }));
        let completed = JobEvent::Completed {
            package,
            success,
            message,
            error_detail,
        };
        (snapshot, completed)
    }

    async fn pipeline(&mut self) -> Result<(), Error> {
        let ctx = Arc::clone(&self.ctx);

        self.enter(JobState::Loading)?;
        let path = ctx.index.find(self.job.package())?.to_path_buf();
        let descriptor = ctx.index.load(&path)?;
        let file_name = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        self.status(format!("Loaded: {file_name}"));
        self.finish_state();

        self.enter(JobState::Fetching)?;
        let url = descriptor
            .primary_source()
            .ok_or_else(|| DescriptorError::Parse {
                path: path.display().to_string(),
                message: "no source URL".to_string(),
            })?;
        let artifact = lxpkg_net::fetch(&ctx.net, url, &ctx.roots.build, &ctx.tx).await?;
        self.finish_state();

        self.enter(JobState::Extracting)?;
        let src_dir = lxpkg_builder::extract(&artifact, &ctx.roots.build, &ctx.tx).await?;
        self.finish_state();

        let executor =
            StageExecutor::new(ctx.shell.clone(), Arc::clone(&ctx.escalation), ctx.tx.clone())?;
        for (stage, commands) in descriptor.declared_stages() {
            self.enter(stage.job_state())?;
            self.status(format!("{}...", stage.label()));
            executor.run_stage(stage, &src_dir, commands).await?;
            self.finish_state();
        }

        self.enter(JobState::Cleanup)?;
        self.status("Cleaning up...".to_string());
        self.cleanup(&src_dir, &artifact).await;
        self.finish_state();
        Ok(())
    }

    /// Remove the build leftovers of a successful job
    ///
    /// The package is installed at this point, so failures only warn.
    async fn cleanup(&self, src_dir: &Path, artifact: &Path) {
        // the whole top-level directory the extractor created, never the build root
        let unpacked = src_dir
            .strip_prefix(&self.ctx.roots.build)
            .ok()
            .and_then(|rel| rel.components().next())
            .map(|top| self.ctx.roots.build.join(top));
        if let Some(dir) = unpacked {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                self.warn_cleanup(&dir, &e);
            }
        }
        if let Err(e) = tokio::fs::remove_file(artifact).await {
            self.warn_cleanup(artifact, &e);
        }
    }

    fn warn_cleanup(&self, path: &Path, err: &std::io::Error) {
        tracing::warn!(path = %path.display(), error = %err, "cleanup failed");
        self.ctx.emit_warning_with_context(
            format!("could not remove {}", path.display()),
            err.to_string(),
        );
    }

    fn enter(&mut self, state: JobState) -> Result<(), Error> {
        self.job.transition(state)?;
        tracing::debug!(package = self.job.package(), %state, "job state changed");
        self.ctx.emit(AppEvent::Job(JobEvent::StateChanged {
            package: self.job.package().to_string(),
            state,
        }));
        self.publish();
        Ok(())
    }

    fn finish_state(&mut self) {
        if let Some(percent) = self.job.complete_state() {
            self.ctx.emit_progress(percent);
        }
        self.publish();
    }

    fn status(&mut self, message: String) {
        self.job.set_status(message.clone());
        self.ctx.emit_status(message);
        self.publish();
    }

    fn publish(&self) {
        self.current.send_replace(Some(self.job.snapshot()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "job task panicked".to_string())
}
