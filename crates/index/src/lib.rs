#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Descriptor store for lxpkg
//!
//! The source tree is scanned once into a [`DescriptorIndex`] that maps
//! every `*.toml` descriptor to its path. Lookups run against the index and
//! are deterministic; descriptors themselves are parsed fresh on every
//! [`DescriptorIndex::load`].

mod parse;

pub use parse::{load, parse};

use lxpkg_errors::{DescriptorError, Error};
use lxpkg_types::PackageDescriptor;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DESCRIPTOR_EXTENSION: &str = "toml";

/// One descriptor file known to the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Lower-cased file stem
    pub stem: String,
    /// Path of the descriptor file
    pub path: PathBuf,
    /// `package.name` as declared, when the file could be read at scan time
    pub declared_name: Option<String>,
}

impl IndexEntry {
    /// Name shown to users: the declared name, or the file stem
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.declared_name.as_deref().unwrap_or(&self.stem)
    }

    fn is_exact(&self, needle: &str) -> bool {
        self.stem == needle
            || self
                .declared_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase() == needle)
    }

    fn mentions(&self, needle: &str) -> bool {
        self.stem.contains(needle)
            || self
                .declared_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(needle))
    }
}

/// Sorted index of the descriptor files under a source tree
#[derive(Debug, Clone)]
pub struct DescriptorIndex {
    root: PathBuf,
    excluded: Vec<PathBuf>,
    entries: BTreeMap<(String, PathBuf), IndexEntry>,
}

impl DescriptorIndex {
    /// Scan `root` recursively
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::ScanFailed` if `root` cannot be walked.
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::scan_excluding(root, Vec::new())
    }

    /// Scan `root`, skipping the given directories (typically the build root
    /// when it lives inside the source tree, so that unpacked sources never
    /// show up as descriptors)
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::ScanFailed` if `root` cannot be walked.
    pub fn scan_excluding(root: impl Into<PathBuf>, excluded: Vec<PathBuf>) -> Result<Self, Error> {
        let mut index = Self {
            root: root.into(),
            excluded,
            entries: BTreeMap::new(),
        };
        index.refresh()?;
        Ok(index)
    }

    /// Rebuild the index from disk
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::ScanFailed` if the root cannot be walked.
    pub fn refresh(&mut self) -> Result<(), Error> {
        if !self.root.is_dir() {
            return Err(DescriptorError::ScanFailed {
                root: self.root.display().to_string(),
                message: "not a directory".to_string(),
            }
            .into());
        }

        // compared by identity, however the excluded paths were spelled
        let excluded: Vec<PathBuf> = self
            .excluded
            .iter()
            .filter_map(|p| p.canonicalize().ok())
            .collect();

        let mut entries = BTreeMap::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped(e, &excluded));

        for dent in walker {
            let dent = match dent {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable path in source tree");
                    continue;
                }
            };
            if !dent.file_type().is_file() || !is_descriptor(dent.path()) {
                continue;
            }

            let path = dent.into_path();
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_lowercase()) else {
                continue;
            };
            let declared_name = match std::fs::read_to_string(&path) {
                Ok(contents) => parse::declared_name(&contents),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "descriptor not readable");
                    None
                }
            };
            if declared_name.is_none() {
                tracing::debug!(path = %path.display(), "indexing descriptor by file stem only");
            }

            entries.insert(
                (stem.clone(), path.clone()),
                IndexEntry {
                    stem,
                    path,
                    declared_name,
                },
            );
        }

        tracing::debug!(
            root = %self.root.display(),
            descriptors = entries.len(),
            "indexed source tree"
        );
        self.entries = entries;
        Ok(())
    }

    /// Root the index was built from
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of indexed descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no descriptors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locate the descriptor for `name` (case-insensitive)
    ///
    /// An exact match on file stem or declared name wins. Otherwise the first
    /// entry, in stem order, whose file stem contains `name` is returned.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::NotFound` when nothing matches.
    pub fn find(&self, name: &str) -> Result<&Path, Error> {
        let needle = name.trim().to_lowercase();
        let not_found = || DescriptorError::NotFound {
            name: name.to_string(),
        };
        if needle.is_empty() {
            return Err(not_found().into());
        }

        self.entries
            .values()
            .find(|e| e.is_exact(&needle))
            .or_else(|| self.entries.values().find(|e| e.stem.contains(&needle)))
            .map(|e| e.path.as_path())
            .ok_or_else(|| not_found().into())
    }

    /// Parse the descriptor at `path`
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::Parse` for unreadable or invalid files.
    #[allow(clippy::unused_self)]
    pub fn load(&self, path: &Path) -> Result<PackageDescriptor, Error> {
        parse::load(path)
    }

    /// Index entries whose stem or declared name contains `query`
    /// (case-insensitive; an empty query matches everything)
    pub fn entries<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        let needle = query.trim().to_lowercase();
        self.entries
            .values()
            .filter(move |e| needle.is_empty() || e.mentions(&needle))
    }

    /// Names of the packages matching `query`, in index order
    pub fn list_names<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries(query).map(IndexEntry::display_name)
    }
}

fn is_skipped(dent: &walkdir::DirEntry, excluded: &[PathBuf]) -> bool {
    if dent.depth() == 0 {
        return false;
    }
    if dent.file_name().to_string_lossy().starts_with('.') {
        return true;
    }
    dent.file_type().is_dir()
        && !excluded.is_empty()
        && dent
            .path()
            .canonicalize()
            .is_ok_and(|path| excluded.contains(&path))
}

fn is_descriptor(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DESCRIPTOR_EXTENSION))
}
