//! Failed-command triage for warp_intent
//!
//! Asks an external assistant process whether a failed command deserves a
//! user-facing notification. The assistant is told to lean towards notifying;
//! any infrastructure failure (spawn error, timeout, cancellation, non-zero
//! exit, unparseable reply) yields `None` and callers treat that as "stay
//! quiet".

pub mod client;
pub mod envelope;
pub mod prompt;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use client::{triage_error, TriageCancel, TriageClient, TriageError, TriageHandle, TRIAGE_TIMEOUT};
pub use envelope::parse_triage_response;
pub use prompt::{build_triage_prompt, tail_lines, MAX_OUTPUT_LINES};

/// A failed command to triage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriageRequest {
    pub command: Option<String>,
    pub exit_code: i32,
    pub recent_output: String,
    pub cwd: Option<PathBuf>,
}

impl TriageRequest {
    pub fn new(command: impl Into<String>, exit_code: i32, recent_output: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            exit_code,
            recent_output: recent_output.into(),
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// The last [`MAX_OUTPUT_LINES`] lines of output
    pub fn bounded_output(&self) -> String {
        tail_lines(&self.recent_output, MAX_OUTPUT_LINES)
    }

    pub fn prompt(&self) -> String {
        build_triage_prompt(self.command.as_deref(), self.exit_code, &self.recent_output)
    }
}

/// The assistant's verdict
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    pub should_notify: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_output_keeps_tail() {
        let output: String = (1..=50).map(|i| format!("line {i}\n")).collect();
        let request = TriageRequest::new("make", 2, output);
        let bounded = request.bounded_output();

        assert_eq!(bounded.lines().count(), MAX_OUTPUT_LINES);
        assert!(bounded.starts_with("line 21"));
        assert!(bounded.ends_with("line 50"));
    }

    #[test]
    fn test_request_prompt_uses_command() {
        let request = TriageRequest::new("cargo build", 101, "error: aborting").with_cwd("/tmp");
        let prompt = request.prompt();
        assert!(prompt.contains("cargo build"));
        assert!(prompt.contains("101"));
        assert_eq!(request.cwd, Some(PathBuf::from("/tmp")));
    }
}
