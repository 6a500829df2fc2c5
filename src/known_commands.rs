//! Known Command Registry for warp_intent
//!
//! Process-wide cache of command names known to exist: shell builtins,
//! functions and aliases found at initialization, plus executables found on
//! PATH the first time they are typed. Names are stored lower-cased. Once a
//! name is known it stays known; PATH misses are remembered only for a
//! bounded time so freshly installed tools are picked up.

use crate::shell_env::{ShellEnvironment, SystemShell};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// How long a failed PATH probe is remembered
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(30);

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tokens treated as runnable paths without any lookup
const PATH_PREFIXES: &[&str] = &["./", "/", "~/"];

#[derive(Default)]
struct RegistryState {
    /// Insertion order, used as tie order for typo suggestions
    order: Vec<String>,
    known: HashSet<String>,
    misses: HashMap<String, Instant>,
}

impl RegistryState {
    fn insert(&mut self, name: String) -> bool {
        self.misses.remove(&name);
        if self.known.insert(name.clone()) {
            self.order.push(name);
            true
        } else {
            false
        }
    }
}

/// Cache of command names known to exist
pub struct KnownCommandRegistry {
    env: Arc<dyn ShellEnvironment>,
    state: RwLock<RegistryState>,
    initialized: OnceCell<()>,
    negative_ttl: Duration,
}

impl KnownCommandRegistry {
    pub fn new(env: Arc<dyn ShellEnvironment>) -> Self {
        Self {
            env,
            state: RwLock::new(RegistryState::default()),
            initialized: OnceCell::new(),
            negative_ttl: DEFAULT_NEGATIVE_TTL,
        }
    }

    /// Registry backed by the user's `$SHELL` and PATH
    pub fn system() -> Self {
        Self::new(Arc::new(SystemShell::detect()))
    }

    /// Set how long PATH misses are remembered
    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }

    /// Seed the registry from the shell environment.
    ///
    /// Only the first call queries the shell; concurrent callers wait for
    /// that run and later calls return immediately.
    pub async fn initialize_detection(&self) {
        self.initialized
            .get_or_init(|| async {
                let env = Arc::clone(&self.env);
                let discovered =
                    tokio::time::timeout(DISCOVERY_TIMEOUT, tokio::task::spawn_blocking(move || env.discover()))
                        .await;

                let names = match discovered {
                    Ok(Ok(names)) => names,
                    Ok(Err(e)) => {
                        warn!("command discovery task failed: {e}");
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(timeout_ms = DISCOVERY_TIMEOUT.as_millis() as u64, "command discovery timed out");
                        Vec::new()
                    }
                };

                let mut state = self.write_state();
                let mut added = 0usize;
                for name in names {
                    if is_private_name(&name) {
                        continue;
                    }
                    if state.insert(name.to_lowercase()) {
                        added += 1;
                    }
                }
                debug!(added, "known command registry seeded");
            })
            .await;
    }

    /// Whether initialization has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Whether `name` is a runnable command. Case-insensitive.
    pub fn is_known_command(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        if is_path_like(name) {
            return true;
        }

        let lower = name.to_lowercase();
        {
            let state = self.read_state();
            if state.known.contains(&lower) {
                return true;
            }
            if let Some(missed_at) = state.misses.get(&lower) {
                if missed_at.elapsed() < self.negative_ttl {
                    return false;
                }
            }
        }

        let found = self.env.resolve(name) || (lower != name && self.env.resolve(&lower));

        let mut state = self.write_state();
        if found {
            if state.insert(lower) {
                debug!(command = name, "discovered command on PATH");
            }
        } else {
            let ttl = self.negative_ttl;
            state.misses.retain(|_, missed_at| missed_at.elapsed() < ttl);
            state.misses.insert(lower, Instant::now());
        }
        found
    }

    /// Record `name` as known without probing
    pub fn mark_known(&self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.write_state().insert(name.to_lowercase());
        }
    }

    /// Snapshot of known names in insertion order
    pub fn known_commands(&self) -> Vec<String> {
        self.read_state().order.clone()
    }

    pub fn len(&self) -> usize {
        self.read_state().known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("known command registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("known command registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// `./x`, `/x` and `~/x` tokens
pub fn is_path_like(token: &str) -> bool {
    PATH_PREFIXES.iter().any(|prefix| token.starts_with(prefix))
}

/// Leading `_` or `-` marks shell-internal helpers
fn is_private_name(name: &str) -> bool {
    name.is_empty() || name.starts_with('_') || name.starts_with('-')
}
