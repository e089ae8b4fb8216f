//! Response type for command execution results.

use std::time::Duration;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output (echo and trailing prompt removed).
    pub result: String,

    /// Everything received before the prompt, echo included.
    pub raw_result: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,
}

impl Response {
    /// Create a new response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            elapsed,
        }
    }

    /// Whether the command produced no output.
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        let response = Response::new("ls", "a.txt\nb.txt\n", "a.txt\nb.txt\n", Duration::ZERO);
        assert!(!response.is_empty());
        assert_eq!(response.lines().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
        assert!(response.contains("b.txt"));
        assert_eq!(response.to_string(), "a.txt\nb.txt\n");
    }
}
