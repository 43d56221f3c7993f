//! Package descriptor model
//!
//! A descriptor is the declarative build recipe for one package: where its
//! sources come from, which shell commands build it, and which files it
//! installs.

use crate::JobState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three ordered build stages a descriptor may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Configure,
    Compile,
    Install,
}

impl Stage {
    /// Execution order. Stages always run in this order, whatever order the
    /// descriptor file lists them in.
    pub const ALL: [Stage; 3] = [Stage::Configure, Stage::Compile, Stage::Install];

    /// Key used in the `[build]` table of a descriptor
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Compile => "compile",
            Self::Install => "install",
        }
    }

    /// Human readable label used in status messages ("Compiling: make")
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Configure => "Configuring",
            Self::Compile => "Compiling",
            Self::Install => "Installing",
        }
    }

    /// Job state entered while this stage runs
    #[must_use]
    pub const fn job_state(self) -> JobState {
        match self {
            Self::Configure => JobState::Configuring,
            Self::Compile => JobState::Compiling,
            Self::Install => JobState::Installing,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A parsed package descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Declared package name
    pub name: String,
    /// Source URLs; the first one is authoritative
    pub sources: Vec<String>,
    /// Commands of the configure stage, if declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configure: Option<Vec<String>>,
    /// Commands of the compile stage, if declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile: Option<Vec<String>>,
    /// Commands of the install stage, if declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<Vec<String>>,
    /// Files installed by the package, relative to the install root
    #[serde(default)]
    pub manifest: Vec<String>,
}

impl PackageDescriptor {
    /// The URL a fetch should use
    #[must_use]
    pub fn primary_source(&self) -> Option<&str> {
        self.sources.first().map(String::as_str)
    }

    /// Commands declared for `stage`, or `None` when the stage is absent
    #[must_use]
    pub fn commands(&self, stage: Stage) -> Option<&[String]> {
        match stage {
            Stage::Configure => self.configure.as_deref(),
            Stage::Compile => self.compile.as_deref(),
            Stage::Install => self.install.as_deref(),
        }
    }

    /// Declared stages with their commands, in execution order
    pub fn declared_stages(&self) -> impl Iterator<Item = (Stage, &[String])> + '_ {
        Stage::ALL
            .into_iter()
            .filter_map(|stage| self.commands(stage).map(|commands| (stage, commands)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> PackageDescriptor {
        PackageDescriptor {
            name: "pkg".to_string(),
            sources: vec![
                "https://example.org/pkg-1.0.tar.gz".to_string(),
                "https://mirror.example.org/pkg-1.0.tar.gz".to_string(),
            ],
            configure: None,
            compile: Some(vec!["make".to_string()]),
            install: Some(vec!["make install".to_string()]),
            manifest: vec![],
        }
    }

    #[test]
    fn test_primary_source_is_first() {
        assert_eq!(
            descriptor().primary_source(),
            Some("https://example.org/pkg-1.0.tar.gz")
        );
    }

    #[test]
    fn test_declared_stages_skip_missing() {
        let desc = descriptor();
        let stages: Vec<Stage> = desc.declared_stages().map(|(s, _)| s).collect();
        assert_eq!(stages, vec![Stage::Compile, Stage::Install]);
    }

    #[test]
    fn test_declared_stages_fixed_order() {
        let mut desc = descriptor();
        desc.configure = Some(vec!["./configure".to_string()]);
        let stages: Vec<Stage> = desc.declared_stages().map(|(s, _)| s).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }

    #[test]
    fn test_empty_stage_is_still_declared() {
        let mut desc = descriptor();
        desc.configure = Some(vec![]);
        assert_eq!(desc.commands(Stage::Configure), Some(&[][..]));
        assert_eq!(desc.declared_stages().count(), 3);
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Compile.label(), "Compiling");
        assert_eq!(Stage::Install.key(), "install");
        assert_eq!(Stage::Configure.to_string(), "configure");
    }
}
