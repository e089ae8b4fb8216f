//! # Shellpipe
//!
//! Drive an interactive shell over OS pipes as a request/response channel.
//!
//! Shellpipe spawns a shell with its standard streams redirected to pipes,
//! replaces the shell's prompt with a sentinel string, and then treats every
//! appearance of that sentinel as "the previous command has finished". A
//! command's output is everything between the command and the next sentinel,
//! minus the shell's echo of the command.
//!
//! ## Features
//!
//! - Synchronous, single-threaded read loop with pluggable idle strategies
//! - Buffered or streaming delivery of output
//! - Terminator matching that survives a prompt split across reads
//! - Shell profiles for POSIX `sh` and Windows `cmd`, extensible at runtime
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shellpipe::{ReadMode, SessionBuilder};
//!
//! fn main() -> Result<(), shellpipe::Error> {
//!     let mut session = SessionBuilder::new().profile("posix").build()?;
//!
//!     // Consume the first prompt printed at startup.
//!     session.read_until_prompt(|_| {}, ReadMode::Buffered)?;
//!
//!     let response = session.send_command("uname -a")?;
//!     println!("{}", response.result);
//!
//!     // Each streaming call carries everything received so far.
//!     let mut printed = 0;
//!     session.execute(
//!         "ls",
//!         Some(&mut |so_far: &str| {
//!             print!("{}", so_far.get(printed..).unwrap_or(""));
//!             printed = so_far.len();
//!         }),
//!         ReadMode::Streaming,
//!     )?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod profile;
pub mod session;

// Re-export main types for convenience
pub use channel::{ByteChannel, PipeChannel};
pub use error::{Error, Result};
pub use profile::{ProfileRegistry, ShellProfile};
pub use session::{
    OutputCallback, PollStrategy, ReadMode, Response, SessionBuilder, SessionConfig, SessionState,
    ShellSession,
};
