//! POSIX `sh` profile.
//!
//! An interactive `sh` writes its prompt to stderr, so the setup command
//! re-executes the shell with stderr folded into stdout. Prompt and output
//! then arrive in order on one pipe. A shell reading from a pipe does not
//! echo its input.

use std::sync::Arc;

use crate::profile::{NoEcho, ShellProfile};

/// Create the POSIX shell profile.
pub fn profile() -> ShellProfile {
    ShellProfile::new("posix", "/bin/sh")
        .with_arg("-c")
        .with_arg("PS1='{prompt}'; PS2=''; export PS1 PS2; exec /bin/sh -i 2>&1")
        .without_env("ENV")
        .with_line_ending("\n")
        .with_echo_policy(Arc::new(NoEcho))
}
