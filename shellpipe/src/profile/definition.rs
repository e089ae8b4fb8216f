//! Shell profile definition.

use std::fmt;
use std::sync::Arc;

use super::{EchoPolicy, NoEcho};
use crate::error::ProfileError;

/// Sentinel prompt used when a profile does not choose its own. Chosen to be
/// unlikely to appear in real command output.
pub const DEFAULT_PROMPT_SENTINEL: &str = "ATOTALLYRANDOMSTRING";

/// Placeholder in profile arguments replaced by the prompt sentinel at
/// spawn time.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Everything needed to launch one kind of shell and talk to it.
#[derive(Clone)]
pub struct ShellProfile {
    /// Profile name (e.g., "posix", "cmd").
    pub name: String,

    /// Program to execute.
    pub program: String,

    /// Arguments; `{prompt}` is replaced with the sentinel.
    pub args: Vec<String>,

    /// Environment variables set for the shell.
    pub env: Vec<(String, String)>,

    /// Environment variables removed for the shell.
    pub env_remove: Vec<String>,

    /// Sentinel the shell prints as its prompt when idle.
    pub prompt: String,

    /// Appended to every command sent by `execute`.
    pub line_ending: String,

    /// How the shell's echo of a command is removed from its response.
    pub echo: Arc<dyn EchoPolicy>,
}

impl ShellProfile {
    /// Create a profile with no arguments, the default sentinel, `\n` line
    /// endings and no echo.
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: vec![],
            env: vec![],
            env_remove: vec![],
            prompt: DEFAULT_PROMPT_SENTINEL.to_string(),
            line_ending: "\n".to_string(),
            echo: Arc::new(NoEcho),
        }
    }

    /// Add an argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the shell.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Remove an environment variable for the shell.
    pub fn without_env(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    /// Set the sentinel prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the line ending appended to commands.
    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    /// Set the echo policy.
    pub fn with_echo_policy(mut self, echo: Arc<dyn EchoPolicy>) -> Self {
        self.echo = echo;
        self
    }

    /// Arguments with the prompt placeholder filled in.
    pub fn command_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(PROMPT_PLACEHOLDER, &self.prompt))
            .collect()
    }

    /// Check that the profile can drive a session.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.program.is_empty() {
            return Err(self.invalid("program must not be empty"));
        }
        if self.prompt.is_empty() {
            return Err(self.invalid("prompt sentinel must not be empty"));
        }
        if self.prompt.contains(['\r', '\n']) {
            return Err(self.invalid("prompt sentinel must be a single line"));
        }
        // The sentinel is pasted into a quoted shell setup line.
        if self.prompt.contains(['\'', '"']) {
            return Err(self.invalid("prompt sentinel must not contain quotes"));
        }
        if self.line_ending.is_empty() {
            return Err(self.invalid("line ending must not be empty"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> ProfileError {
        ProfileError::InvalidDefinition {
            message: format!("{}: {}", self.name, reason),
        }
    }
}

impl fmt::Debug for ShellProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellProfile")
            .field("name", &self.name)
            .field("program", &self.program)
            .field("args", &self.args)
            .field("env", &self.env)
            .field("env_remove", &self.env_remove)
            .field("prompt", &self.prompt)
            .field("line_ending", &self.line_ending)
            .field("echo", &"<EchoPolicy>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::EchoLength;

    #[test]
    fn test_defaults() {
        let profile = ShellProfile::new("test", "/bin/sh");
        assert_eq!(profile.prompt, DEFAULT_PROMPT_SENTINEL);
        assert_eq!(profile.line_ending, "\n");
        assert!(profile.args.is_empty());
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_prompt_placeholder_substitution() {
        let profile = ShellProfile::new("test", "cmd")
            .with_args(["/A", "/K", "prompt {prompt}"])
            .with_prompt("SENTINEL");
        assert_eq!(profile.command_args(), vec!["/A", "/K", "prompt SENTINEL"]);
        // The stored arguments keep the placeholder.
        assert_eq!(profile.args[2], "prompt {prompt}");
    }

    #[test]
    fn test_builder_methods() {
        let profile = ShellProfile::new("test", "/bin/sh")
            .with_arg("-i")
            .with_env("PS2", "")
            .without_env("ENV")
            .with_line_ending("\r\n")
            .with_echo_policy(Arc::new(EchoLength));
        assert_eq!(profile.args, vec!["-i"]);
        assert_eq!(profile.env, vec![("PS2".to_string(), String::new())]);
        assert_eq!(profile.env_remove, vec!["ENV"]);
        assert_eq!(profile.echo.strip_echo(b"x\r\n", b"x\r\nout"), b"out");
    }

    #[test]
    fn test_validate_rejects_bad_profiles() {
        assert!(ShellProfile::new("p", "").validate().is_err());
        assert!(ShellProfile::new("p", "sh").with_prompt("").validate().is_err());
        assert!(ShellProfile::new("p", "sh").with_prompt("a\nb").validate().is_err());
        assert!(ShellProfile::new("p", "sh").with_line_ending("").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_quoted_prompt() {
        let profile = crate::profile::shells::posix::profile().with_prompt("it's>");
        assert!(profile.validate().is_err());
        assert!(ShellProfile::new("p", "sh").with_prompt("say \"hi\"").validate().is_err());
    }

    #[test]
    fn test_debug_hides_policy() {
        let text = format!("{:?}", ShellProfile::new("p", "sh"));
        assert!(text.contains("<EchoPolicy>"));
    }
}
