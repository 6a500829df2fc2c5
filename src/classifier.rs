//! Intent classifier for warp_intent
//!
//! Composes override parsing, the known-command and subcommand registries and
//! typo suggestions into the command-vs-question decision, and composes the
//! not-found detector with the triage client into the notify-vs-suppress
//! decision for failed commands.
//!
//! Precedence for input lines:
//! 1. An explicit `!` / `?` override wins.
//! 2. A known leading command is a command, unless it is a multi-level tool
//!    whose second word is not one of its subcommands.
//! 3. For such tools a close subcommand match is still a command, with a
//!    correction attached.
//! 4. An unknown leading word close to a known command is a command, with a
//!    correction attached. Anything else is natural language.

use crate::config::IntentConfig;
use crate::known_commands::KnownCommandRegistry;
use crate::not_found::{classify_not_found, NotFoundKind};
use crate::override_prefix::{check_override_prefix, InputOverride};
use crate::shell_env::SystemShell;
use crate::subcommands::SubcommandRegistry;
use crate::triage::{TriageClient, TriageHandle, TriageRequest, TriageResult};
use crate::typo::{edit_distance, find_typo_suggestion, DEFAULT_MAX_DISTANCE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Widely installed commands offered as correction targets even before the
/// user has run them in this session.
pub const COMMON_COMMANDS: &[&str] = &[
    // File operations
    "ls", "cd", "pwd", "mkdir", "rmdir", "rm", "cp", "mv", "touch", "cat",
    "head", "tail", "less", "more", "find", "grep", "sed", "awk", "sort",
    "uniq", "wc", "diff", "chmod", "chown", "ln",
    // Text processing
    "echo", "printf", "cut", "tr", "xargs", "tee",
    // System
    "ps", "top", "htop", "kill", "killall", "sudo", "whoami", "uname",
    "hostname", "uptime", "df", "du", "free", "mount", "umount",
    // Network
    "ping", "curl", "wget", "ssh", "scp", "rsync", "netstat", "dig",
    "nslookup", "traceroute", "telnet",
    // Languages and package managers
    "python", "python3", "node", "npx", "pip3", "gem", "rustc", "rustup",
    "make", "cmake",
    // Editors
    "vim", "vi", "nvim", "nano", "emacs", "code",
    // Archives
    "tar", "gzip", "gunzip", "zip", "unzip",
    // Misc
    "man", "which", "history", "clear", "exit", "source", "export", "env",
    "date",
];

/// Leading words that mark an unknown first word as prose, not a typo
const PROSE_STARTERS: &[&str] = &[
    "what", "how", "why", "where", "when", "who", "whats", "what's", "can",
    "could", "should", "would", "will", "is", "are", "does", "did", "please",
    "explain", "tell", "show", "i", "i'm", "im", "my", "hey", "hi", "hello",
    "thanks", "write", "create", "fix", "the", "a", "an", "this", "that",
    "it",
];

/// Final intent for an input line
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Command,
    NaturalLanguage,
}

impl From<InputOverride> for Intent {
    fn from(value: InputOverride) -> Self {
        match value {
            InputOverride::Command => Intent::Command,
            InputOverride::NaturalLanguage => Intent::NaturalLanguage,
        }
    }
}

/// A typo correction attached to a command classification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    /// Leading command was misspelled
    Command { from: String, to: String },
    /// Subcommand of a multi-level tool was misspelled
    Subcommand { tool: String, from: String, to: String },
}

/// Result of classifying one input line
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub intent: Intent,
    pub cleaned_input: String,
    /// Whether an explicit `!` / `?` decided the intent
    pub overridden: bool,
    pub correction: Option<Correction>,
    /// `cleaned_input` with the correction applied
    pub suggested_input: Option<String>,
}

impl Classification {
    fn plain(intent: Intent, cleaned_input: &str) -> Self {
        Self {
            intent,
            cleaned_input: cleaned_input.to_string(),
            overridden: false,
            correction: None,
            suggested_input: None,
        }
    }

    fn corrected(cleaned_input: &str, correction: Correction, suggested_input: String) -> Self {
        Self {
            intent: Intent::Command,
            cleaned_input: cleaned_input.to_string(),
            overridden: false,
            correction: Some(correction),
            suggested_input: Some(suggested_input),
        }
    }

    pub fn is_command(&self) -> bool {
        self.intent == Intent::Command
    }
}

/// Why a failed command produced no notification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuppressReason {
    /// Output shows a not-found error; the assistant was not consulted
    CommandNotFound { pattern: NotFoundKind },
    /// The assistant judged the failure not worth a notification
    AssistantDeclined { message: String },
    /// The assistant gave no usable verdict
    NoVerdict,
}

/// Notify-vs-suppress decision for a failed command
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriageOutcome {
    Notify { message: String },
    Suppress { reason: SuppressReason },
}

impl TriageOutcome {
    /// Map an assistant result; `None` fails closed
    pub fn from_result(result: Option<TriageResult>) -> Self {
        match result {
            Some(TriageResult { should_notify: true, message }) => TriageOutcome::Notify { message },
            Some(TriageResult { should_notify: false, message }) => TriageOutcome::Suppress {
                reason: SuppressReason::AssistantDeclined { message },
            },
            None => TriageOutcome::Suppress {
                reason: SuppressReason::NoVerdict,
            },
        }
    }

    pub fn should_notify(&self) -> bool {
        matches!(self, TriageOutcome::Notify { .. })
    }
}

/// Either a decision made without the assistant, or a running triage
pub enum TriageStart {
    Decided(TriageOutcome),
    Pending(TriageHandle),
}

/// Process-wide classifier shared by all terminal sessions
pub struct IntentClassifier {
    known: KnownCommandRegistry,
    subcommands: SubcommandRegistry,
    triage: TriageClient,
    typo_max_distance: usize,
}

impl IntentClassifier {
    pub fn new(known: KnownCommandRegistry, subcommands: SubcommandRegistry, triage: TriageClient) -> Self {
        Self {
            known,
            subcommands,
            triage,
            typo_max_distance: DEFAULT_MAX_DISTANCE,
        }
    }

    /// Classifier over the user's shell, configured from `config`
    pub fn from_config(config: &IntentConfig) -> Self {
        let known = KnownCommandRegistry::new(Arc::new(SystemShell::detect()))
            .with_negative_ttl(Duration::from_secs(config.negative_cache_ttl_secs));
        Self::new(known, SubcommandRegistry::builtin(), TriageClient::from_config(config))
            .with_typo_max_distance(config.typo_max_distance)
    }

    pub fn with_typo_max_distance(mut self, max_distance: usize) -> Self {
        self.typo_max_distance = max_distance;
        self
    }

    /// Seed the known-command registry; idempotent
    pub async fn initialize_detection(&self) {
        self.known.initialize_detection().await;
    }

    pub fn known_commands(&self) -> &KnownCommandRegistry {
        &self.known
    }

    pub fn subcommands(&self) -> &SubcommandRegistry {
        &self.subcommands
    }

    /// Decide whether `input` is a shell command or a question
    pub fn classify(&self, input: &str) -> Classification {
        let parsed = check_override_prefix(input);
        if let Some(forced) = parsed.override_ {
            return Classification {
                overridden: true,
                ..Classification::plain(forced.into(), &parsed.cleaned_input)
            };
        }

        let cleaned = parsed.cleaned_input.as_str();
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();
        let Some(&first) = tokens.first() else {
            return Classification::plain(Intent::NaturalLanguage, cleaned);
        };

        let classification = if self.known.is_known_command(first) {
            self.classify_known(cleaned, &tokens)
        } else {
            self.classify_unknown(cleaned, &tokens)
        };

        debug!(
            intent = ?classification.intent,
            corrected = classification.correction.is_some(),
            "classified input"
        );
        classification
    }

    fn classify_known(&self, cleaned: &str, tokens: &[&str]) -> Classification {
        let first = tokens[0];
        let Some(subcommands) = self.subcommands.get_subcommands(first) else {
            return Classification::plain(Intent::Command, cleaned);
        };

        let second = match tokens.get(1) {
            None => return Classification::plain(Intent::Command, cleaned),
            // Flags, and `+toolchain` selectors as in `cargo +nightly build`
            Some(second) if second.starts_with('-') || second.starts_with('+') => {
                return Classification::plain(Intent::Command, cleaned)
            }
            Some(second) => *second,
        };

        if self.subcommands.has_valid_subcommand(first, second) {
            return Classification::plain(Intent::Command, cleaned);
        }

        let mut candidates: Vec<&str> = subcommands.iter().copied().collect();
        candidates.sort_unstable();

        match self.accepted_suggestion(second, candidates) {
            Some(to) => {
                let suggested = replace_token(tokens, 1, &to);
                Classification::corrected(
                    cleaned,
                    Correction::Subcommand {
                        tool: first.to_string(),
                        from: second.to_string(),
                        to,
                    },
                    suggested,
                )
            }
            None => Classification::plain(Intent::NaturalLanguage, cleaned),
        }
    }

    fn classify_unknown(&self, cleaned: &str, tokens: &[&str]) -> Classification {
        let first = tokens[0];
        if looks_like_prose(first, cleaned) {
            return Classification::plain(Intent::NaturalLanguage, cleaned);
        }

        match self.accepted_suggestion(first, self.command_candidates()) {
            Some(to) => {
                let suggested = replace_token(tokens, 0, &to);
                Classification::corrected(
                    cleaned,
                    Correction::Command {
                        from: first.to_string(),
                        to,
                    },
                    suggested,
                )
            }
            None => Classification::plain(Intent::NaturalLanguage, cleaned),
        }
    }

    /// Known commands, then multi-level tools, then common commands; deduplicated
    fn command_candidates(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.known
            .known_commands()
            .into_iter()
            .chain(self.subcommands.tools().into_iter().map(str::to_string))
            .chain(COMMON_COMMANDS.iter().map(|c| c.to_string()))
            .filter(|c| seen.insert(c.clone()))
            .collect()
    }

    /// A suggestion close enough to act on. Short words tolerate a single edit.
    fn accepted_suggestion<I, S>(&self, token: &str, candidates: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suggestion = find_typo_suggestion(token, candidates, self.typo_max_distance)?;
        let allowed = (token.chars().count() / 3).max(1);
        let distance = edit_distance(&token.to_lowercase(), &suggestion.to_lowercase());
        (distance <= allowed).then_some(suggestion)
    }

    /// Decide without the assistant if possible, otherwise start a triage
    pub fn begin_triage(&self, request: &TriageRequest) -> TriageStart {
        let output = request.bounded_output();
        if let Some(pattern) = classify_not_found(&output) {
            debug!(?pattern, "suppressing not-found failure");
            return TriageStart::Decided(TriageOutcome::Suppress {
                reason: SuppressReason::CommandNotFound { pattern },
            });
        }

        TriageStart::Pending(self.triage.triage(request.prompt(), request.cwd.clone()))
    }

    /// Decide whether a failed command deserves a notification
    pub async fn triage_failure(&self, request: &TriageRequest) -> TriageOutcome {
        match self.begin_triage(request) {
            TriageStart::Decided(outcome) => outcome,
            TriageStart::Pending(handle) => TriageOutcome::from_result(handle.result().await),
        }
    }
}

fn looks_like_prose(first: &str, cleaned: &str) -> bool {
    let first = first.to_lowercase();
    PROSE_STARTERS.contains(&first.as_str()) || cleaned.trim_end().ends_with('?')
}

fn replace_token(tokens: &[&str], index: usize, replacement: &str) -> String {
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| if i == index { replacement } else { *token })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell_env::ShellEnvironment;

    struct FixtureShell {
        seeds: Vec<&'static str>,
        path: Vec<&'static str>,
    }

    impl ShellEnvironment for FixtureShell {
        fn discover(&self) -> Vec<String> {
            self.seeds.iter().map(|s| s.to_string()).collect()
        }

        fn resolve(&self, name: &str) -> bool {
            self.path.iter().any(|p| *p == name)
        }
    }

    fn classifier() -> IntentClassifier {
        let shell = Arc::new(FixtureShell {
            seeds: vec!["cd", "export", "alias"],
            path: vec!["git", "npm", "ls", "docker", "cat", "which"],
        });
        IntentClassifier::new(
            KnownCommandRegistry::new(shell),
            SubcommandRegistry::builtin(),
            TriageClient::new("/nonexistent/assistant"),
        )
    }

    #[test]
    fn test_override_short_circuits() {
        let c = classifier();
        let result = c.classify("!what is this");
        assert_eq!(result.intent, Intent::Command);
        assert!(result.overridden);
        assert_eq!(result.cleaned_input, "what is this");

        let result = c.classify("?git status");
        assert_eq!(result.intent, Intent::NaturalLanguage);
        assert_eq!(result.cleaned_input, "git status");
    }

    #[test]
    fn test_known_command_without_table() {
        let c = classifier();
        assert!(c.classify("ls -la").is_command());
        assert!(c.classify("cat README.md").is_command());
        assert!(c.classify("./run.sh --fast").is_command());
    }

    #[tokio::test]
    async fn test_seeded_builtin_is_command() {
        let c = classifier();
        c.initialize_detection().await;
        assert!(c.classify("export FOO=1").is_command());
    }

    #[test]
    fn test_valid_subcommand() {
        let c = classifier();
        let result = c.classify("git status");
        assert_eq!(result, Classification::plain(Intent::Command, "git status"));
        assert!(c.classify("git").is_command());
        assert!(c.classify("git --version").is_command());
    }

    #[test]
    fn test_subcommand_typo() {
        let c = classifier();
        let result = c.classify("git stauts -s");
        assert_eq!(result.intent, Intent::Command);
        assert_eq!(
            result.correction,
            Some(Correction::Subcommand {
                tool: "git".into(),
                from: "stauts".into(),
                to: "status".into(),
            })
        );
        assert_eq!(result.suggested_input.as_deref(), Some("git status -s"));
    }

    #[test]
    fn test_invalid_subcommand_is_prose() {
        let c = classifier();
        assert_eq!(c.classify("git is broken again").intent, Intent::NaturalLanguage);
    }

    #[test]
    fn test_command_typo() {
        let c = classifier();
        let result = c.classify("gti status");
        assert_eq!(result.intent, Intent::Command);
        assert_eq!(
            result.correction,
            Some(Correction::Command { from: "gti".into(), to: "git".into() })
        );
        assert_eq!(result.suggested_input.as_deref(), Some("git status"));
    }

    #[test]
    fn test_natural_language() {
        let c = classifier();
        for input in [
            "how do I list files",
            "what does this error mean",
            "summarize the last build failure",
            "the deploy keeps failing",
        ] {
            assert_eq!(c.classify(input).intent, Intent::NaturalLanguage, "{input}");
        }
    }

    #[test]
    fn test_question_mark_blocks_typo_guess() {
        let c = classifier();
        assert_eq!(c.classify("gti?").intent, Intent::NaturalLanguage);
    }

    #[test]
    fn test_empty_input() {
        let c = classifier();
        let result = c.classify("   ");
        assert_eq!(result.intent, Intent::NaturalLanguage);
        assert_eq!(result.cleaned_input, "");
    }

    #[tokio::test]
    async fn test_not_found_suppresses_without_assistant() {
        let c = classifier();
        let request = TriageRequest::new("gti status", 127, "zsh: command not found: gti");
        let outcome = c.triage_failure(&request).await;
        assert_eq!(
            outcome,
            TriageOutcome::Suppress {
                reason: SuppressReason::CommandNotFound {
                    pattern: NotFoundKind::ZshCommandNotFound
                }
            }
        );
        assert!(!outcome.should_notify());
    }

    #[tokio::test]
    async fn test_missing_assistant_fails_closed() {
        let c = classifier();
        let request = TriageRequest::new("cargo build", 101, "error: could not compile `app`");
        let outcome = c.triage_failure(&request).await;
        assert_eq!(
            outcome,
            TriageOutcome::Suppress {
                reason: SuppressReason::NoVerdict
            }
        );
    }

    #[test]
    fn test_outcome_mapping() {
        let notify = TriageOutcome::from_result(Some(TriageResult {
            should_notify: true,
            message: "Tests failed".into(),
        }));
        assert!(notify.should_notify());

        let declined = TriageOutcome::from_result(Some(TriageResult {
            should_notify: false,
            message: "Interrupted".into(),
        }));
        assert_eq!(
            declined,
            TriageOutcome::Suppress {
                reason: SuppressReason::AssistantDeclined {
                    message: "Interrupted".into()
                }
            }
        );
    }
}
