//! Privilege escalation for build commands
//!
//! A command is privileged when it contains the word `sudo`. Before such a
//! command runs, the configured [`PrivilegeEscalation`] strategy rewrites it.

use lxpkg_config::{EscalationConfig, EscalationMode};
use lxpkg_errors::Error;
use regex::{NoExpand, Regex};
use std::fmt;
use std::sync::Arc;

const SUDO_PATTERN: &str = r"\bsudo\b";

/// Matches the `sudo` word in a shell command
#[derive(Debug, Clone)]
pub struct SudoMatcher {
    re: Regex,
}

impl SudoMatcher {
    /// # Errors
    ///
    /// Returns an internal error if the pattern fails to compile.
    pub fn new() -> Result<Self, Error> {
        let re = Regex::new(SUDO_PATTERN).map_err(|e| Error::internal(e.to_string()))?;
        Ok(Self { re })
    }

    /// Whether `command` needs elevated privileges
    #[must_use]
    pub fn is_privileged(&self, command: &str) -> bool {
        self.re.is_match(command)
    }

    fn replace(&self, command: &str, with: &str) -> String {
        self.re.replace_all(command, NoExpand(with)).into_owned()
    }
}

/// Strategy applied to privileged commands
pub trait PrivilegeEscalation: fmt::Debug + Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Command line to execute in place of the privileged `command`
    fn wrap(&self, command: &str) -> String;
}

/// Replace `sudo` with a graphical or agent-based front end such as `pkexec`
#[derive(Debug, Clone)]
pub struct FrontEnd {
    program: String,
    matcher: SudoMatcher,
}

impl FrontEnd {
    /// # Errors
    ///
    /// Returns an internal error if the sudo pattern fails to compile.
    pub fn new(program: impl Into<String>) -> Result<Self, Error> {
        Ok(Self {
            program: program.into(),
            matcher: SudoMatcher::new()?,
        })
    }
}

impl PrivilegeEscalation for FrontEnd {
    fn name(&self) -> &str {
        &self.program
    }

    fn wrap(&self, command: &str) -> String {
        self.matcher.replace(command, &self.program)
    }
}

/// Leave privileged commands untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PrivilegeEscalation for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn wrap(&self, command: &str) -> String {
        command.to_string()
    }
}

/// Build the strategy selected in the `[build.escalation]` config table
///
/// # Errors
///
/// Returns an internal error if the sudo pattern fails to compile.
pub fn from_config(config: &EscalationConfig) -> Result<Arc<dyn PrivilegeEscalation>, Error> {
    Ok(match config.mode {
        EscalationMode::FrontEnd => Arc::new(FrontEnd::new(config.program.clone())?),
        EscalationMode::Passthrough => Arc::new(Passthrough),
    })
}
