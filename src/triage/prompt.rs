//! Triage prompt template

use crate::redact::redact_secrets;
use lazy_static::lazy_static;
use regex::Regex;

/// Output lines kept for triage
pub const MAX_OUTPUT_LINES: usize = 30;

const UNKNOWN_COMMAND: &str = "(unknown command)";
const NO_OUTPUT: &str = "(no output captured)";

const INSTRUCTIONS: &str = r#"Decide whether the user should get a notification about this failure.

Default to notifying: most non-zero exits are real errors the user wants to know about.
Only set shouldNotify to false when one of these applies:
- The command exits non-zero on purpose (grep with no matches, test or [ checks, diff finding differences).
- The user interrupted it (Ctrl-C, exit code 130, SIGINT or SIGTERM).
- It is watch-mode tooling (file watchers, dev servers, --watch test runners) being stopped or restarted.
- It repeats an error the user was already notified about.

Reply with only a JSON object, no prose:
{"shouldNotify": true or false, "message": "one short sentence for the notification"}"#;

lazy_static! {
    static ref ANSI_ESCAPE: Option<Regex> =
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").ok();
}

/// Build the prompt sent to the assistant for a failed command
pub fn build_triage_prompt(command: Option<&str>, exit_code: i32, recent_output: &str) -> String {
    let command = command
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN_COMMAND);

    let output = tail_lines(&strip_ansi(recent_output), MAX_OUTPUT_LINES);
    let output = if output.is_empty() {
        NO_OUTPUT.to_string()
    } else {
        redact_secrets(&output)
    };

    format!(
        "A command run in the user's terminal failed.\n\n\
         Command: {command}\n\
         Exit code: {exit_code}\n\
         Recent output (last {MAX_OUTPUT_LINES} lines):\n\
         ```\n{output}\n```\n\n\
         {INSTRUCTIONS}\n"
    )
}

/// Trimmed text limited to its last `max_lines` lines
pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

fn strip_ansi(text: &str) -> String {
    match ANSI_ESCAPE.as_ref() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}
