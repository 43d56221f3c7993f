#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Source extraction and build stage execution for lxpkg
//!
//! This crate turns a downloaded artifact into a source tree ([`extract`])
//! and runs a descriptor's configure, compile and install commands inside
//! it ([`StageExecutor`]).

mod executor;
mod extract;
pub mod privilege;

pub use executor::StageExecutor;
pub use extract::{artifact_stem, extract, ArchiveFormat};
pub use privilege::{FrontEnd, Passthrough, PrivilegeEscalation, SudoMatcher};
