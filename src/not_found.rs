//! "Command not found" detection for warp_intent
//!
//! Recognizes the not-found phrasing of bash, zsh, dash, fish, cmd.exe and
//! PowerShell in raw terminal output. A failed command whose output matches
//! is suppressed without asking the assistant.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which family of not-found message matched
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NotFoundKind {
    /// `bash: foo: command not found`
    ShellCommandNotFound,
    /// `zsh: command not found: foo`
    ZshCommandNotFound,
    /// `sh: 1: foo: not found` and generic `...: not found`
    NotFound,
    /// `fish: Unknown command: foo`, `npm: unknown command`
    UnknownCommand,
    /// `'foo' is not recognized as an internal or external command`
    WindowsNotRecognized,
    /// `No such file or directory`
    NoSuchFile,
}

/// A compiled entry of the pattern bank
pub struct NotFoundPattern {
    pub kind: NotFoundKind,
    pub regex: Regex,
}

// Ordered: the first match decides the reported kind.
const PATTERN_SOURCES: &[(&str, NotFoundKind)] = &[
    (
        r"(?im)[^\s:]+:\s+[^\s:]+:\s+command not found",
        NotFoundKind::ShellCommandNotFound,
    ),
    (
        r"(?im)[^\s:]+:\s+command not found:\s*\S+",
        NotFoundKind::ZshCommandNotFound,
    ),
    (
        r"(?im)[^\s:]+:\s+[^\s:]+:\s+not found",
        NotFoundKind::NotFound,
    ),
    (r"(?im)\S:\s*not found\b", NotFoundKind::NotFound),
    (r"(?i)\bunknown command\b", NotFoundKind::UnknownCommand),
    (
        r"(?i)'[^']+' is not recognized as an internal or external command",
        NotFoundKind::WindowsNotRecognized,
    ),
    (
        r"(?i)is not recognized as the name of a cmdlet",
        NotFoundKind::WindowsNotRecognized,
    ),
    (r"(?i)no such file or directory", NotFoundKind::NoSuchFile),
];

lazy_static! {
    static ref NOT_FOUND_PATTERNS: Vec<NotFoundPattern> = PATTERN_SOURCES
        .iter()
        .filter_map(|(source, kind)| {
            Regex::new(source).ok().map(|regex| NotFoundPattern { kind: *kind, regex })
        })
        .collect();
}

/// The ordered pattern bank
pub fn patterns() -> &'static [NotFoundPattern] {
    &NOT_FOUND_PATTERNS
}

/// Kind of the first pattern matching `text`, if any
pub fn classify_not_found(text: &str) -> Option<NotFoundKind> {
    if text.trim().is_empty() {
        return None;
    }
    patterns()
        .iter()
        .find(|p| p.regex.is_match(text))
        .map(|p| p.kind)
}

/// Whether `text` contains a "command not found" style error
pub fn is_command_not_found(text: &str) -> bool {
    classify_not_found(text).is_some()
}
