#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Installed-file tracking for lxpkg
//!
//! Packages are removed by deleting the files their descriptor's manifest
//! lists, resolved against the install root. Removal is not transactional:
//! files deleted before a failure stay deleted.

use lxpkg_errors::{Error, InstallError};
use lxpkg_events::{AppEvent, EventEmitter, EventSender, UninstallEvent};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Outcome of a manifest-driven removal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalReport {
    pub package: String,
    /// Paths that existed and were deleted
    pub removed: Vec<PathBuf>,
    /// Paths that were already absent
    pub missing: Vec<PathBuf>,
}

/// Resolve a manifest entry against `install_root`
///
/// A leading `/` is stripped, so `/usr/bin/x` and `usr/bin/x` name the same
/// file.
///
/// # Errors
///
/// Returns `InstallError::PathEscape` for empty entries and entries that
/// climb out of the install root.
pub fn resolve(install_root: &Path, entry: &str) -> Result<PathBuf, Error> {
    let escape = || InstallError::PathEscape {
        path: entry.to_string(),
    };
    let relative = entry.trim_start_matches('/');

    let mut resolved = install_root.to_path_buf();
    let mut depth = 0usize;
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(escape().into())
            }
        }
    }
    if depth == 0 {
        return Err(escape().into());
    }
    Ok(resolved)
}

/// Delete every manifest entry of `package` under `install_root`
///
/// Entries are processed in order. Absent paths are skipped and reported
/// as missing. Every entry is validated before anything is deleted.
///
/// # Errors
///
/// Returns `InstallError::PathEscape` if any entry resolves outside the
/// install root (nothing is deleted in that case), and
/// `InstallError::RemoveFailed` on the first unexpected I/O failure.
pub async fn remove_manifest(
    install_root: &Path,
    package: &str,
    manifest: &[String],
    tx: &EventSender,
) -> Result<RemovalReport, Error> {
    let targets = manifest
        .iter()
        .map(|entry| resolve(install_root, entry))
        .collect::<Result<Vec<_>, _>>()?;

    tx.emit(AppEvent::Uninstall(UninstallEvent::Started {
        package: package.to_string(),
        entries: targets.len(),
    }));

    let mut report = RemovalReport {
        package: package.to_string(),
        ..RemovalReport::default()
    };

    for path in targets {
        if remove_path(&path).await? {
            tracing::debug!(path = %path.display(), "removed");
            tx.emit(AppEvent::Uninstall(UninstallEvent::FileRemoved { path: path.clone() }));
            report.removed.push(path);
        } else {
            tx.emit(AppEvent::Uninstall(UninstallEvent::FileMissing { path: path.clone() }));
            report.missing.push(path);
        }
    }

    tracing::info!(
        package,
        removed = report.removed.len(),
        missing = report.missing.len(),
        "manifest removal finished"
    );
    tx.emit(AppEvent::Uninstall(UninstallEvent::Completed {
        package: package.to_string(),
        removed: report.removed.len(),
        missing: report.missing.len(),
    }));
    Ok(report)
}

/// `Ok(false)` when nothing exists at `path`
async fn remove_path(path: &Path) -> Result<bool, Error> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(remove_failed(path, &e)),
    };

    // directories are removed only when empty; symlinks are never followed
    let result = if metadata.is_dir() {
        tokio::fs::remove_dir(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(remove_failed(path, &e)),
    }
}

fn remove_failed(path: &Path, err: &std::io::Error) -> Error {
    InstallError::RemoveFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}
