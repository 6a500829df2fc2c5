//! warp_intent - input intent classification and failed-command triage
//!
//! Decides whether a line typed into a terminal is a shell command or a
//! natural-language request, and whether a failed command is worth telling
//! the user about.
//!
//! Modules:
//! - override_prefix: `!` / `?` forced-intent markers
//! - not_found: "command not found" output detection
//! - subcommands: Subcommand tables for multi-level CLI tools
//! - shell_env: Shell builtin/function/alias discovery and PATH lookup
//! - known_commands: Cached known-command registry
//! - typo: Edit-distance typo suggestions
//! - redact: Secret masking for text sent to the assistant
//! - triage: Assistant subprocess triage of failed commands
//! - classifier: Composes the above into intent and notify decisions
//! - config: YAML configuration with environment overrides
//! - logging: tracing subscriber setup

pub mod classifier;
pub mod config;
pub mod known_commands;
pub mod logging;
pub mod not_found;
pub mod override_prefix;
pub mod redact;
pub mod shell_env;
pub mod subcommands;
pub mod triage;
pub mod typo;

// Re-export key types for convenience
pub use classifier::{
    Classification, Correction, Intent, IntentClassifier, SuppressReason, TriageOutcome,
    TriageStart,
};

pub use config::{ConfigError, IntentConfig};

pub use known_commands::KnownCommandRegistry;

pub use logging::{init_logging, LogConfig};

pub use not_found::{classify_not_found, is_command_not_found, NotFoundKind};

pub use override_prefix::{check_override_prefix, InputOverride, OverrideResult};

pub use shell_env::{ShellEnvironment, ShellType, SystemShell};

pub use subcommands::SubcommandRegistry;

pub use triage::{
    triage_error, TriageCancel, TriageClient, TriageError, TriageHandle, TriageRequest,
    TriageResult,
};

pub use typo::{find_typo_suggestion, DEFAULT_MAX_DISTANCE};
