#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations for lxpkg
//!
//! This crate sits between the CLI and the pipeline crates. Installation
//! runs as a background job owned by the [`Orchestrator`]; the small
//! operations (lookup, listing, removal) are plain async functions over an
//! [`OpsCtx`].

mod context;
mod job;
mod orchestrator;

pub use context::{OpsContextBuilder, OpsCtx};
pub use job::{JobFailure, JobSnapshot};
pub use orchestrator::{JobHandle, Orchestrator};

use lxpkg_errors::Error;
use lxpkg_events::EventEmitter;
use lxpkg_install::RemovalReport;
use lxpkg_types::PackageDescriptor;
use serde::Serialize;
use std::path::PathBuf;

/// A descriptor found in the source tree
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub path: PathBuf,
}

/// A resolved descriptor and where it was read from
#[derive(Clone, Debug, Serialize)]
pub struct PackageInfo {
    pub path: PathBuf,
    pub descriptor: PackageDescriptor,
}

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Search results
    SearchResults(Vec<SearchResult>),
    /// Package information
    PackageInfo(PackageInfo),
    /// Outcome of an installation job
    Install(JobSnapshot),
    /// Outcome of a removal
    Removal(RemovalReport),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Check if this is a success result
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::Install(job) => job.failure.is_none(),
            OperationResult::SearchResults(_)
            | OperationResult::PackageInfo(_)
            | OperationResult::Removal(_) => true,
        }
    }
}

/// Names of descriptors whose name contains `query`, in index order
///
/// The iterator is lazy and borrows the context's index.
pub fn list_names<'a>(ctx: &'a OpsCtx, query: &str) -> impl Iterator<Item = &'a str> + 'a {
    ctx.index.list_names(query)
}

/// Descriptors matching `query`, with their paths
#[must_use]
pub fn search_packages(ctx: &OpsCtx, query: &str) -> Vec<SearchResult> {
    ctx.index
        .entries(query)
        .map(|entry| SearchResult {
            name: entry.display_name().to_string(),
            path: entry.path.clone(),
        })
        .collect()
}

/// Resolve `name` and load its descriptor
///
/// # Errors
///
/// Returns `DescriptorError::NotFound` when nothing matches and
/// `DescriptorError::Parse` when the matched file is invalid.
pub fn package_info(ctx: &OpsCtx, name: &str) -> Result<PackageInfo, Error> {
    let path = ctx.index.find(name)?.to_path_buf();
    let descriptor = ctx.index.load(&path)?;
    Ok(PackageInfo { path, descriptor })
}

/// Remove the files listed in the manifest of `name`
///
/// # Errors
///
/// Returns descriptor lookup errors, and `InstallError` variants from the
/// removal itself.
pub async fn remove(ctx: &OpsCtx, name: &str) -> Result<RemovalReport, Error> {
    let PackageInfo { path, descriptor } = package_info(ctx, name)?;
    tracing::info!(
        package = %descriptor.name,
        descriptor = %path.display(),
        entries = descriptor.manifest.len(),
        "removing package files"
    );
    let operation = format!("Removing {}", descriptor.name);
    ctx.emit_operation_started(operation.clone());
    let result = lxpkg_install::remove_manifest(
        &ctx.roots.install,
        &descriptor.name,
        &descriptor.manifest,
        &ctx.tx,
    )
    .await;
    ctx.emit_operation_completed(operation, result.is_ok());
    result
}
