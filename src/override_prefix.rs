//! Explicit intent overrides for warp_intent
//!
//! A leading `!` forces the line to run as a shell command, a leading `?`
//! forces it to be sent to the assistant as a question. Everything else is
//! left to the heuristics in [`crate::classifier`].

use serde::{Deserialize, Serialize};

const COMMAND_MARKER: char = '!';
const NATURAL_LANGUAGE_MARKER: char = '?';

/// Intent forced by an override marker
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputOverride {
    Command,
    NaturalLanguage,
}

/// Result of override parsing for a single input line
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OverrideResult {
    #[serde(rename = "override")]
    pub override_: Option<InputOverride>,
    pub cleaned_input: String,
}

impl OverrideResult {
    fn none(cleaned_input: &str) -> Self {
        Self {
            override_: None,
            cleaned_input: cleaned_input.to_string(),
        }
    }
}

/// Strip an explicit `!` / `?` override from the start of `input`.
///
/// Only the marker itself is removed; whitespace between the marker and the
/// rest of the line is kept. A lone marker is not an override.
pub fn check_override_prefix(input: &str) -> OverrideResult {
    let trimmed = input.trim();

    let mut chars = trimmed.chars();
    let override_ = match chars.next() {
        Some(COMMAND_MARKER) => InputOverride::Command,
        Some(NATURAL_LANGUAGE_MARKER) => InputOverride::NaturalLanguage,
        _ => return OverrideResult::none(trimmed),
    };

    let rest = chars.as_str();
    if rest.is_empty() {
        return OverrideResult::none(trimmed);
    }

    OverrideResult {
        override_: Some(override_),
        cleaned_input: rest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_override() {
        let result = check_override_prefix("!git status");
        assert_eq!(result.override_, Some(InputOverride::Command));
        assert_eq!(result.cleaned_input, "git status");
    }

    #[test]
    fn test_natural_language_override() {
        let result = check_override_prefix("?how do I undo a commit");
        assert_eq!(result.override_, Some(InputOverride::NaturalLanguage));
        assert_eq!(result.cleaned_input, "how do I undo a commit");
    }

    #[test]
    fn test_outer_whitespace_trimmed_inner_kept() {
        let result = check_override_prefix("   ! ls -la  ");
        assert_eq!(result.override_, Some(InputOverride::Command));
        assert_eq!(result.cleaned_input, " ls -la");
    }

    #[test]
    fn test_lone_marker_is_not_override() {
        let result = check_override_prefix("  !  ");
        assert_eq!(result.override_, None);
        assert_eq!(result.cleaned_input, "!");

        let result = check_override_prefix("?");
        assert_eq!(result.override_, None);
        assert_eq!(result.cleaned_input, "?");
    }

    #[test]
    fn test_marker_elsewhere_is_ignored() {
        let result = check_override_prefix("echo hi!");
        assert_eq!(result.override_, None);
        assert_eq!(result.cleaned_input, "echo hi!");

        let result = check_override_prefix("what is this?");
        assert_eq!(result.override_, None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(check_override_prefix(""), OverrideResult::none(""));
        assert_eq!(check_override_prefix(" \t\n"), OverrideResult::none(""));
    }

    #[test]
    fn test_strips_exactly_one_marker() {
        let result = check_override_prefix("!!");
        assert_eq!(result.override_, Some(InputOverride::Command));
        assert_eq!(result.cleaned_input, "!");

        let result = check_override_prefix("??what");
        assert_eq!(result.override_, Some(InputOverride::NaturalLanguage));
        assert_eq!(result.cleaned_input, "?what");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(check_override_prefix("!ls")).unwrap();
        assert_eq!(json["override"], "COMMAND");
        assert_eq!(json["cleanedInput"], "ls");
    }
}
