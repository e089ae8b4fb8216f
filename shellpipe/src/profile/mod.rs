//! Shell profiles: how to launch a shell and how to read its responses.
//!
//! A profile names the program to run, the setup that turns its prompt into
//! a sentinel, the line ending commands are sent with, and the echo policy
//! used to clean each response.

mod definition;
mod registry;
pub mod shells;

pub use definition::{DEFAULT_PROMPT_SENTINEL, PROMPT_PLACEHOLDER, ShellProfile};
pub use registry::ProfileRegistry;

/// How a shell echoes the line it was sent.
///
/// `execute` hands the policy the exact bytes it wrote (command plus line
/// ending) and the text captured before the sentinel. The policy returns the
/// part that is real output.
pub trait EchoPolicy: Send + Sync {
    /// Remove the echo of `sent` from the start of `output`.
    fn strip_echo<'a>(&self, sent: &[u8], output: &'a [u8]) -> &'a [u8];
}

/// Drop exactly as many leading bytes as were sent.
///
/// This assumes the shell echoes every command verbatim. When it does not
/// (a nested program that takes over the console, for instance), real output
/// is cut instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoLength;

impl EchoPolicy for EchoLength {
    fn strip_echo<'a>(&self, sent: &[u8], output: &'a [u8]) -> &'a [u8] {
        &output[sent.len().min(output.len())..]
    }
}

/// Drop the echoed command line, but only if the output starts with it.
///
/// The echo may end in a different line ending than the one sent (a
/// terminal turns `\n` into `\r\n`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoLine;

impl EchoPolicy for EchoLine {
    fn strip_echo<'a>(&self, sent: &[u8], output: &'a [u8]) -> &'a [u8] {
        let command = trim_line_ending(sent);
        let Some(rest) = output.strip_prefix(command) else {
            return output;
        };
        match memchr::memchr(b'\n', rest) {
            Some(pos) if rest[..pos].iter().all(|&b| b == b'\r') => &rest[pos + 1..],
            // Echo not terminated yet, or followed by something else.
            Some(_) => output,
            None if rest.iter().all(|&b| b == b'\r') => &[],
            None => output,
        }
    }
}

/// The shell does not echo; output is returned untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEcho;

impl EchoPolicy for NoEcho {
    fn strip_echo<'a>(&self, _sent: &[u8], output: &'a [u8]) -> &'a [u8] {
        output
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |pos| pos + 1);
    &line[..end]
}
