//! Assistant subprocess with timeout and cancellation
//!
//! Every triage spawns its own assistant process. The result settles exactly
//! once: whichever of natural completion, timeout or [`TriageHandle::cancel`]
//! gets there first wins, and the losers are ignored. Dropping the in-flight
//! future kills the process.

use super::envelope::parse_triage_response;
use super::TriageResult;
use crate::config::IntentConfig;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::{oneshot, Notify, Semaphore};
use tracing::{debug, warn};

/// How long an assistant process may run before it is killed
pub const TRIAGE_TIMEOUT: Duration = Duration::from_millis(8000);

/// Lightweight model requested from the assistant
pub const DEFAULT_MODEL: &str = "haiku";

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("failed to spawn assistant: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to collect assistant output: {0}")]
    Io(#[source] std::io::Error),
    #[error("assistant exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("assistant response was not a triage verdict")]
    Malformed,
    #[error("assistant did not answer within {0:?}")]
    Timeout(Duration),
    #[error("triage was cancelled")]
    Cancelled,
}

type Settled = Option<TriageResult>;

/// Single-fire latch guarding the result channel
struct SettleLatch {
    sender: Mutex<Option<oneshot::Sender<Settled>>>,
}

impl SettleLatch {
    fn new(sender: oneshot::Sender<Settled>) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Deliver `value` if nothing was delivered yet. Returns whether it was.
    fn settle(&self, value: Settled) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match sender {
            Some(tx) => {
                // The receiver may already be gone; that still counts as settled.
                let _ = tx.send(value);
                true
            }
            None => false,
        }
    }
}

/// Cancels an in-flight triage. Cloneable so another task can hold it.
#[derive(Clone)]
pub struct TriageCancel {
    latch: Arc<SettleLatch>,
    signal: Arc<Notify>,
}

impl TriageCancel {
    /// Resolve the triage with `None` and kill the assistant process
    pub fn cancel(&self) {
        if self.latch.settle(None) {
            debug!("triage cancelled");
        }
        self.signal.notify_one();
    }
}

/// An in-flight triage
pub struct TriageHandle {
    receiver: oneshot::Receiver<Settled>,
    canceller: TriageCancel,
}

impl TriageHandle {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> TriageCancel {
        self.canceller.clone()
    }

    /// Wait for the verdict; `None` on any infrastructure failure
    pub async fn result(self) -> Option<TriageResult> {
        self.receiver.await.ok().flatten()
    }
}

/// Spawns assistant processes for triage
#[derive(Clone, Debug)]
pub struct TriageClient {
    assistant_path: PathBuf,
    model: String,
    timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
}

impl TriageClient {
    /// Client without a concurrency cap
    pub fn new(assistant_path: impl Into<PathBuf>) -> Self {
        Self {
            assistant_path: assistant_path.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: TRIAGE_TIMEOUT,
            limiter: None,
        }
    }

    pub fn from_config(config: &IntentConfig) -> Self {
        Self::new(config.resolved_assistant_path())
            .with_model(config.model.clone())
            .with_timeout(Duration::from_millis(config.triage_timeout_ms))
            .with_max_concurrent(config.max_concurrent_triage)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Limit simultaneous assistant processes; 0 removes the limit
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.limiter = (max > 0).then(|| Arc::new(Semaphore::new(max)));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fixed arguments passed to the assistant
    pub fn assistant_args(&self) -> Vec<String> {
        vec![
            "-p".to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--output-format".to_string(),
            "json".to_string(),
        ]
    }

    /// Start a triage. Must be called from within a tokio runtime.
    ///
    /// Waiting for a concurrency permit counts against the timeout.
    pub fn triage(&self, prompt: impl Into<String>, cwd: Option<PathBuf>) -> TriageHandle {
        let (tx, rx) = oneshot::channel();
        let canceller = TriageCancel {
            latch: Arc::new(SettleLatch::new(tx)),
            signal: Arc::new(Notify::new()),
        };

        let client = self.clone();
        let prompt = prompt.into();
        let latch = Arc::clone(&canceller.latch);
        let signal = Arc::clone(&canceller.signal);

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = tokio::select! {
                run = tokio::time::timeout(client.timeout, client.run(prompt, cwd)) => match run {
                    Ok(result) => result,
                    Err(_) => Err(TriageError::Timeout(client.timeout)),
                },
                _ = signal.notified() => Err(TriageError::Cancelled),
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            let settled = match outcome {
                Ok(verdict) => {
                    debug!(elapsed_ms, should_notify = verdict.should_notify, "triage verdict");
                    latch.settle(Some(verdict))
                }
                Err(TriageError::Cancelled) => latch.settle(None),
                Err(e) => {
                    warn!(elapsed_ms, assistant = %client.assistant_path.display(), "triage failed: {e}");
                    latch.settle(None)
                }
            };
            if !settled {
                debug!(elapsed_ms, "triage already settled, dropping late result");
            }
        });

        TriageHandle {
            receiver: rx,
            canceller,
        }
    }

    async fn run(&self, prompt: String, cwd: Option<PathBuf>) -> Result<TriageResult, TriageError> {
        let _permit = match &self.limiter {
            Some(limiter) => Some(
                Arc::clone(limiter)
                    .acquire_owned()
                    .await
                    .map_err(|_| TriageError::Cancelled)?,
            ),
            None => None,
        };

        let mut cmd = Command::new(&self.assistant_path);
        cmd.args(self.assistant_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(TriageError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                // A broken pipe only means the assistant stopped reading early.
                if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                    debug!("could not write triage prompt: {e}");
                }
            });
        }

        let output = child.wait_with_output().await.map_err(TriageError::Io)?;
        if !output.status.success() {
            return Err(TriageError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_triage_response(&stdout).ok_or(TriageError::Malformed)
    }
}

/// Spawn the assistant at `assistant_path` to triage `prompt`, with no
/// concurrency cap and the default 8 second timeout.
pub fn triage_error(
    assistant_path: impl Into<PathBuf>,
    prompt: impl Into<String>,
    cwd: Option<PathBuf>,
) -> TriageHandle {
    TriageClient::new(assistant_path).triage(prompt, cwd)
}
