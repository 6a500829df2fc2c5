//! Subcommand Registry for warp_intent
//!
//! Static allow-list of first-level subcommands for multi-level CLI tools.
//! Used to tell `git status` (a command) apart from `git is weird` (prose)
//! and to offer subcommand typo corrections such as `git stauts`.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

const GIT: &[&str] = &[
    "add", "am", "archive", "bisect", "blame", "branch", "bundle", "checkout",
    "cherry-pick", "clean", "clone", "commit", "config", "describe", "diff",
    "fetch", "format-patch", "gc", "grep", "init", "log", "ls-files", "merge",
    "mv", "notes", "pull", "push", "rebase", "reflog", "remote", "reset",
    "restore", "revert", "rm", "shortlog", "show", "sparse-checkout", "stash",
    "status", "submodule", "switch", "tag", "worktree",
];

const NPM: &[&str] = &[
    "access", "adduser", "audit", "cache", "ci", "config", "dedupe",
    "deprecate", "doctor", "exec", "explain", "fund", "help", "init",
    "install", "link", "login", "logout", "ls", "outdated", "owner", "pack",
    "ping", "prune", "publish", "rebuild", "restart", "root", "run",
    "run-script", "search", "start", "stop", "test", "uninstall", "unpublish",
    "update", "version", "view", "whoami", "i", "t", "un", "up",
];

const DOCKER: &[&str] = &[
    "attach", "build", "builder", "buildx", "commit", "compose", "container",
    "context", "cp", "create", "diff", "events", "exec", "export", "history",
    "image", "images", "import", "info", "inspect", "kill", "load", "login",
    "logout", "logs", "network", "pause", "port", "ps", "pull", "push",
    "rename", "restart", "rm", "rmi", "run", "save", "search", "start",
    "stats", "stop", "system", "tag", "top", "unpause", "update", "version",
    "volume", "wait",
];

const KUBECTL: &[&str] = &[
    "annotate", "api-resources", "api-versions", "apply", "attach", "auth",
    "autoscale", "cluster-info", "completion", "config", "cordon", "cp",
    "create", "debug", "delete", "describe", "diff", "drain", "edit", "events",
    "exec", "explain", "expose", "get", "kustomize", "label", "logs", "patch",
    "port-forward", "proxy", "replace", "rollout", "run", "scale", "set",
    "taint", "top", "uncordon", "version", "wait",
];

const BREW: &[&str] = &[
    "analytics", "autoremove", "cleanup", "config", "deps", "doctor", "edit",
    "fetch", "home", "info", "install", "leaves", "link", "list", "ls",
    "outdated", "pin", "reinstall", "search", "services", "tap", "uninstall",
    "unlink", "unpin", "untap", "update", "upgrade", "uses",
];

const YARN: &[&str] = &[
    "add", "audit", "autoclean", "bin", "cache", "config", "create", "dlx",
    "exec", "global", "help", "info", "init", "install", "link", "list",
    "node", "outdated", "pack", "publish", "remove", "run", "start", "test",
    "unlink", "upgrade", "upgrade-interactive", "version", "why", "workspace",
    "workspaces",
];

const CARGO: &[&str] = &[
    "add", "bench", "build", "b", "check", "c", "clean", "clippy", "doc", "d",
    "fetch", "fix", "fmt", "generate-lockfile", "init", "install", "metadata",
    "new", "package", "publish", "remove", "run", "r", "search", "test", "t",
    "tree", "uninstall", "update", "vendor", "verify-project", "version",
];

const GH: &[&str] = &[
    "alias", "api", "auth", "browse", "cache", "codespace", "completion",
    "config", "extension", "gist", "gpg-key", "issue", "label", "org", "pr",
    "project", "release", "repo", "ruleset", "run", "search", "secret",
    "ssh-key", "status", "variable", "workflow",
];

const PNPM: &[&str] = &[
    "add", "audit", "dlx", "exec", "fetch", "import", "init", "install", "i",
    "link", "list", "ls", "outdated", "pack", "prune", "publish", "rebuild",
    "remove", "rm", "root", "run", "start", "store", "test", "unlink",
    "update", "up", "why",
];

const PIP: &[&str] = &[
    "cache", "check", "config", "debug", "download", "freeze", "hash", "help",
    "index", "inspect", "install", "list", "search", "show", "uninstall",
    "wheel",
];

const GO: &[&str] = &[
    "bug", "build", "clean", "doc", "env", "fix", "fmt", "generate", "get",
    "install", "list", "mod", "run", "test", "tool", "version", "vet", "work",
];

const HELM: &[&str] = &[
    "completion", "create", "dependency", "env", "get", "history", "install",
    "lint", "list", "package", "plugin", "pull", "push", "registry", "repo",
    "rollback", "search", "show", "status", "template", "test", "uninstall",
    "upgrade", "verify", "version",
];

const TERRAFORM: &[&str] = &[
    "apply", "console", "destroy", "fmt", "force-unlock", "get", "graph",
    "import", "init", "login", "logout", "output", "plan", "providers",
    "refresh", "show", "state", "taint", "test", "untaint", "validate",
    "version", "workspace",
];

const SYSTEMCTL: &[&str] = &[
    "cat", "daemon-reload", "disable", "edit", "enable", "is-active",
    "is-enabled", "is-failed", "kill", "list-timers", "list-unit-files",
    "list-units", "mask", "reload", "restart", "show", "start", "status",
    "stop", "unmask",
];

const APT: &[&str] = &[
    "autoclean", "autoremove", "clean", "depends", "full-upgrade", "install",
    "list", "policy", "purge", "rdepends", "reinstall", "remove", "search",
    "show", "source", "update", "upgrade",
];

/// package.json script names that yarn and pnpm run without `run`
const PACKAGE_SCRIPTS: &[&str] = &[
    "build", "check", "clean", "compile", "coverage", "deploy", "dev", "e2e",
    "fmt", "format", "generate", "lint", "prepare", "preview", "release",
    "serve", "storybook", "type-check", "typecheck", "watch",
];

const SCRIPT_RUNNERS: &[&str] = &["yarn", "pnpm"];

lazy_static! {
    static ref BUILTIN_TABLE: HashMap<&'static str, HashSet<&'static str>> = {
        let tools: [(&str, &[&str]); 15] = [
            ("git", GIT),
            ("npm", NPM),
            ("docker", DOCKER),
            ("kubectl", KUBECTL),
            ("brew", BREW),
            ("yarn", YARN),
            ("cargo", CARGO),
            ("gh", GH),
            ("pnpm", PNPM),
            ("pip", PIP),
            ("go", GO),
            ("helm", HELM),
            ("terraform", TERRAFORM),
            ("systemctl", SYSTEMCTL),
            ("apt", APT),
        ];
        let mut table: HashMap<&'static str, HashSet<&'static str>> = tools
            .into_iter()
            .map(|(tool, subs)| (tool, subs.iter().copied().collect::<HashSet<_>>()))
            .collect();
        for runner in SCRIPT_RUNNERS {
            if let Some(subs) = table.get_mut(runner) {
                subs.extend(PACKAGE_SCRIPTS.iter().copied());
            }
        }
        table
    };
}

/// Read-only table of valid subcommands per tool
#[derive(Clone, Copy, Debug)]
pub struct SubcommandRegistry {
    table: &'static HashMap<&'static str, HashSet<&'static str>>,
}

impl Default for SubcommandRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SubcommandRegistry {
    /// The built-in table, constructed once per process
    pub fn builtin() -> Self {
        Self {
            table: &BUILTIN_TABLE,
        }
    }

    /// Whether `cmd` has a registered subcommand table
    pub fn command_has_subcommands(&self, cmd: &str) -> bool {
        self.get_subcommands(cmd).is_some()
    }

    /// Whether `sub` is a valid subcommand of `cmd`; false for unregistered tools
    pub fn has_valid_subcommand(&self, cmd: &str, sub: &str) -> bool {
        self.get_subcommands(cmd)
            .map(|subs| subs.contains(sub.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Subcommands registered for `cmd`
    pub fn get_subcommands(&self, cmd: &str) -> Option<&'static HashSet<&'static str>> {
        self.table.get(cmd.to_lowercase().as_str())
    }

    /// Registered tool names, sorted
    pub fn tools(&self) -> Vec<&'static str> {
        let mut tools: Vec<&'static str> = self.table.keys().copied().collect();
        tools.sort_unstable();
        tools
    }
}
