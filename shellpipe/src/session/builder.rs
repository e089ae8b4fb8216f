//! Builder for creating shell sessions.

use std::time::Duration;

use super::config::{PollStrategy, SessionConfig};
use super::shell::ShellSession;
use crate::error::Result;
use crate::profile::{ProfileRegistry, ShellProfile};

/// Name of the profile used when none is chosen.
pub const DEFAULT_PROFILE: &str = "posix";

/// Builder for constructing shell sessions.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use shellpipe::session::SessionBuilder;
///
/// # fn example() -> Result<(), shellpipe::Error> {
/// let mut session = SessionBuilder::new()
///     .profile("posix")
///     .read_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SessionBuilder {
    profile_name: Option<String>,
    custom_profile: Option<ShellProfile>,
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a registered profile (e.g., "posix", "cmd").
    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.profile_name = Some(name.into());
        self
    }

    /// Use a profile that is not in the registry. Takes precedence over
    /// [`profile`](Self::profile).
    pub fn custom_profile(mut self, profile: ShellProfile) -> Self {
        self.custom_profile = Some(profile);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the idle behavior of the read loop.
    pub fn poll_strategy(mut self, poll: PollStrategy) -> Self {
        self.config.poll = poll;
        self
    }

    /// Fail reads that take longer than `timeout`.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    pub fn strip_ansi(mut self, strip: bool) -> Self {
        self.config.strip_ansi = strip;
        self
    }

    pub fn kill_on_drop(mut self, kill: bool) -> Self {
        self.config.kill_on_drop = kill;
        self
    }

    /// Resolve the profile without spawning anything.
    pub fn resolve_profile(&self) -> Result<ShellProfile> {
        if let Some(custom) = &self.custom_profile {
            return Ok(custom.clone());
        }
        let name = self.profile_name.as_deref().unwrap_or(DEFAULT_PROFILE);
        ProfileRegistry::lookup(name)
    }

    /// Spawn the shell and return a running session.
    pub fn build(self) -> Result<ShellSession> {
        let profile = self.resolve_profile()?;
        ShellSession::spawn(profile, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ProfileError};

    #[test]
    fn test_default_profile_is_posix() {
        let profile = SessionBuilder::new().resolve_profile().unwrap();
        assert_eq!(profile.name, DEFAULT_PROFILE);
    }

    #[test]
    fn test_named_profile() {
        let profile = SessionBuilder::new().profile("cmd").resolve_profile().unwrap();
        assert_eq!(profile.line_ending, "\r\n");
    }

    #[test]
    fn test_custom_profile_wins() {
        let profile = SessionBuilder::new()
            .profile("cmd")
            .custom_profile(ShellProfile::new("mine", "/bin/dash"))
            .resolve_profile()
            .unwrap();
        assert_eq!(profile.name, "mine");
    }

    #[test]
    fn test_unknown_profile() {
        let err = match SessionBuilder::new().profile("tcsh").build() {
            Ok(_) => panic!("unknown profile was accepted"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            Error::Profile(ProfileError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn test_config_setters() {
        let builder = SessionBuilder::new()
            .poll_strategy(PollStrategy::Sleep(Duration::from_millis(1)))
            .read_timeout(Duration::from_secs(3))
            .strip_ansi(true)
            .kill_on_drop(true);
        assert_eq!(builder.config.poll, PollStrategy::Sleep(Duration::from_millis(1)));
        assert_eq!(builder.config.read_timeout, Some(Duration::from_secs(3)));
        assert!(builder.config.strip_ansi);
        assert!(builder.config.kill_on_drop);
    }
}
