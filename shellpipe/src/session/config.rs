//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a read delivers output to its callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// One call, after the terminator, with everything before it.
    #[default]
    Buffered,

    /// A call each time new output arrives, with everything received so far
    /// in this read, then a final call with everything before the terminator.
    Streaming,
}

impl From<bool> for ReadMode {
    /// `true` means buffered.
    fn from(buffered: bool) -> Self {
        if buffered {
            ReadMode::Buffered
        } else {
            ReadMode::Streaming
        }
    }
}

/// What the read loop does when a poll finds no new output.
///
/// `Spin` never yields and burns a core while a slow command runs, in
/// exchange for the lowest possible latency. The other two give that up for
/// an idle CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStrategy {
    /// Poll again immediately.
    #[default]
    Spin,

    /// Sleep for the interval, then poll again.
    Sleep(Duration),

    /// Block until the output pipe is readable, at most for the duration.
    Readiness(Duration),
}

/// Configuration for session behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle behavior of the read loop.
    pub poll: PollStrategy,

    /// Give up on a read after this long. `None` waits forever, so a shell
    /// that never prints its prompt again stalls the caller.
    pub read_timeout: Option<Duration>,

    /// Strip ANSI escape sequences from output as it is buffered.
    pub strip_ansi: bool,

    /// Kill and reap the shell when the session is dropped, instead of only
    /// releasing the handle.
    pub kill_on_drop: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll: PollStrategy::Spin,
            read_timeout: None,
            strip_ansi: false,
            kill_on_drop: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.poll, PollStrategy::Spin);
        assert!(config.read_timeout.is_none());
        assert!(!config.strip_ansi);
        assert!(!config.kill_on_drop);
    }

    #[test]
    fn test_read_mode_from_bool() {
        assert_eq!(ReadMode::from(true), ReadMode::Buffered);
        assert_eq!(ReadMode::from(false), ReadMode::Streaming);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"poll": {"sleep": {"secs": 0, "nanos": 5000000}}, "kill_on_drop": true}"#,
        )
        .unwrap();
        assert_eq!(config.poll, PollStrategy::Sleep(Duration::from_millis(5)));
        assert!(config.kill_on_drop);
        assert!(config.read_timeout.is_none());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = SessionConfig {
            poll: PollStrategy::Readiness(Duration::from_millis(50)),
            read_timeout: Some(Duration::from_secs(2)),
            strip_ansi: true,
            kill_on_drop: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
