//! Shell sessions.
//!
//! A [`ShellSession`] owns a shell process and the pipes to it. Commands are
//! written to the shell's input and its output is read back up to the
//! sentinel prompt the profile installed.

mod builder;
mod config;
mod response;
mod shell;

pub use builder::{DEFAULT_PROFILE, SessionBuilder};
pub use config::{PollStrategy, ReadMode, SessionConfig};
pub use response::Response;
pub use shell::{OutputCallback, SessionState, ShellSession};
