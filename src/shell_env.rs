//! Shell environment access for warp_intent
//!
//! Asks the user's shell which builtins, functions and aliases it knows and
//! resolves executables on PATH. The known-command registry only talks to the
//! shell through [`ShellEnvironment`], so tests can swap in a fixture.

use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Builtins shared by POSIX shells, used when the shell cannot be queried
pub const POSIX_BUILTINS: &[&str] = &[
    "alias", "bg", "break", "cd", "command", "continue", "echo", "eval", "exec",
    "exit", "export", "false", "fg", "getopts", "hash", "jobs", "kill", "printf",
    "pwd", "read", "readonly", "return", "set", "shift", "source", "test",
    "times", "trap", "true", "type", "ulimit", "umask", "unalias", "unset",
    "wait",
];

/// Printed before the listing; anything the rc files print comes before it
const LISTING_MARKER: &str = "__warp_intent_listing__";

/// Supported shell types
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl ShellType {
    /// Detect shell type from shell path or name
    pub fn detect(shell: &str) -> Option<Self> {
        let shell_lower = shell.to_lowercase();
        if shell_lower.contains("bash") {
            Some(ShellType::Bash)
        } else if shell_lower.contains("zsh") {
            Some(ShellType::Zsh)
        } else if shell_lower.contains("fish") {
            Some(ShellType::Fish)
        } else if shell_lower.contains("pwsh") || shell_lower.contains("powershell") {
            Some(ShellType::PowerShell)
        } else {
            None
        }
    }

    /// Arguments that make the shell print the listing marker, then its
    /// builtins, functions and aliases
    fn listing_args(&self) -> Vec<String> {
        let (flags, listing): (&[&str], &str) = match self {
            ShellType::Bash => (&["-ic"], "compgen -b; compgen -A function; compgen -a"),
            ShellType::Zsh => (&["-ic"], "print -rl -- ${(k)builtins} ${(k)functions} ${(k)aliases}"),
            ShellType::Fish => (&["-ic"], "builtin -n; functions -n; abbr -l"),
            ShellType::PowerShell => (
                &["-NoLogo", "-Command"],
                "Get-Command -CommandType Alias,Function,Cmdlet | ForEach-Object Name",
            ),
        };
        let mut args: Vec<String> = flags.iter().map(|f| f.to_string()).collect();
        args.push(format!("echo {LISTING_MARKER}; {listing}"));
        args
    }
}

/// The registry's view of the user's shell
pub trait ShellEnvironment: Send + Sync {
    /// Names of builtins, functions and aliases. May block.
    fn discover(&self) -> Vec<String>;

    /// Whether `name` resolves to an executable on PATH
    fn resolve(&self, name: &str) -> bool;
}

/// The real shell of the current user
#[derive(Clone, Debug)]
pub struct SystemShell {
    shell_path: String,
    shell: Option<ShellType>,
}

impl SystemShell {
    /// Use `$SHELL`, falling back to `/bin/sh`
    pub fn detect() -> Self {
        let shell_path = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        Self::new(shell_path)
    }

    pub fn new(shell_path: impl Into<String>) -> Self {
        let shell_path = shell_path.into();
        let shell = ShellType::detect(&shell_path);
        Self { shell_path, shell }
    }

    pub fn shell_type(&self) -> Option<ShellType> {
        self.shell
    }
}

impl ShellEnvironment for SystemShell {
    fn discover(&self) -> Vec<String> {
        let Some(shell) = self.shell else {
            debug!(shell = %self.shell_path, "unrecognized shell, using POSIX builtins");
            return POSIX_BUILTINS.iter().map(|b| b.to_string()).collect();
        };

        let output = Command::new(&self.shell_path)
            .args(shell.listing_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let mut names = parse_listing(&stdout);
                names.extend(POSIX_BUILTINS.iter().map(|b| b.to_string()));
                debug!(shell = ?shell, count = names.len(), "discovered shell commands");
                names
            }
            Err(e) => {
                warn!(shell = %self.shell_path, "failed to query shell for commands: {e}");
                POSIX_BUILTINS.iter().map(|b| b.to_string()).collect()
            }
        }
    }

    fn resolve(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }
}

/// Split shell listing output into names. Only text after the last listing
/// marker counts; fish may join names with commas.
pub fn parse_listing(output: &str) -> Vec<String> {
    let listing = output
        .rsplit_once(LISTING_MARKER)
        .map_or(output, |(_, after)| after);
    listing
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .collect()
}
