//! Error types for shellpipe.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for shellpipe operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Pipe-level errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Shell profile errors
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

impl Error {
    /// Whether this error leaves the session it came from unusable.
    ///
    /// Every channel failure is fatal; a read timeout is not.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Channel(_) => true,
            Error::Session(SessionError::ReadTimeout(_)) => false,
            Error::Session(_) => true,
            Error::Profile(_) => false,
        }
    }
}

/// One of the three standard streams wired to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stream::Stdin => "stdin",
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        };
        f.write_str(name)
    }
}

/// Pipe errors (creation, handle configuration, I/O).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to allocate a pipe pair
    #[error("Failed to create {stream} pipe: {source}")]
    Creation {
        stream: Stream,
        #[source]
        source: nix::Error,
    },

    /// Failed to clear the inheritance flag on a controller-side end
    #[error("Failed to configure {stream} pipe handle: {source}")]
    HandleConfig {
        stream: Stream,
        #[source]
        source: io::Error,
    },

    /// Writing to the child's stdin failed
    #[error("Write to child stdin failed: {0}")]
    Write(#[source] io::Error),

    /// Reading from an output pipe failed
    #[error("Read from child output failed: {0}")]
    Read(#[source] io::Error),

    /// Querying the number of queued bytes failed
    #[error("Failed to peek child output pipe: {0}")]
    Peek(#[source] io::Error),

    /// Waiting for readiness failed
    #[error("Failed to wait for child output: {0}")]
    Wait(#[source] io::Error),

    /// The OS reported a byte count different from the one requested
    #[error("{operation} transferred {actual} bytes, expected {requested}")]
    InvariantViolation {
        operation: &'static str,
        requested: usize,
        actual: usize,
    },

    /// The pipes have already been closed
    #[error("Channel closed")]
    Closed,
}

/// Session errors (process lifecycle, reads).
#[derive(Error, Debug)]
pub enum SessionError {
    /// The shell process could not be started
    #[error("Failed to spawn '{program}': {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The terminator did not appear within the configured read timeout
    #[error("Terminator not found within {0:?}")]
    ReadTimeout(Duration),

    /// A previous channel failure left the session in an undefined state
    #[error("Session is unusable after an earlier failure - create a new one")]
    Unusable,

    /// The session was terminated
    #[error("Session terminated")]
    Terminated,
}

/// Shell profile definition and lookup errors.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Invalid profile definition
    #[error("Invalid profile definition: {message}")]
    InvalidDefinition { message: String },

    /// No profile registered under that name
    #[error("Unknown profile '{name}'")]
    UnknownProfile { name: String },

    /// A profile with the same name is already registered
    #[error("Profile '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Result type alias using shellpipe's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_errors_are_fatal() {
        let err: Error = ChannelError::Closed.into();
        assert!(err.is_fatal());

        let err: Error = ChannelError::InvariantViolation {
            operation: "write",
            requested: 5,
            actual: 3,
        }
        .into();
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Channel error: write transferred 3 bytes, expected 5"
        );
    }

    #[test]
    fn test_timeout_is_not_fatal() {
        let err: Error = SessionError::ReadTimeout(Duration::from_millis(50)).into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_creation_error_names_stream() {
        let err = ChannelError::Creation {
            stream: Stream::Stdout,
            source: nix::Error::EMFILE,
        };
        assert!(err.to_string().starts_with("Failed to create stdout pipe"));
    }
}
