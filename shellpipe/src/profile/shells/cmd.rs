//! Windows `cmd.exe` profile.
//!
//! `cmd /K` runs the `prompt` command and then stays open. With stdin on a
//! pipe, cmd echoes every line it receives before running it, so responses
//! start with the command that was sent.

use std::sync::Arc;

use crate::profile::{EchoLength, ShellProfile};

/// Create the cmd.exe profile (ANSI output mode).
pub fn profile() -> ShellProfile {
    ShellProfile::new("cmd", "cmd")
        .with_args(["/A", "/K", "prompt {prompt}"])
        .with_line_ending("\r\n")
        .with_echo_policy(Arc::new(EchoLength))
}
