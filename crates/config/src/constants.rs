//! Default filesystem locations and executables
//!
//! Every value here can be overridden through the config file, the
//! environment or CLI flags.

/// Descriptor tree, relative to the user's home directory
pub const DEFAULT_SOURCE_DIR: &str = "sources";

/// Build scratch space, relative to the source root
pub const DEFAULT_BUILD_DIR: &str = "build";

pub const DEFAULT_INSTALL_ROOT: &str = "/usr";

pub const DEFAULT_SHELL: &str = "sh";

pub const DEFAULT_ESCALATION_PROGRAM: &str = "pkexec";
