// tests/triage_client.rs
// Triage client against fake assistant scripts written to a temp dir

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use warp_intent::triage::{TriageClient, TriageRequest, TriageResult};
use warp_intent::{
    IntentClassifier, KnownCommandRegistry, SubcommandRegistry, SuppressReason, SystemShell,
    TriageOutcome,
};

static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Tests in this file write executables and then spawn them. Running them one
/// at a time keeps a concurrent fork from holding a script open for writing,
/// which makes exec fail with ETXTBSY.
fn serial() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fake assistant: records argv, stdin and cwd next to itself, then prints
/// `response.json` and exits with `exit_code`.
fn fake_assistant(dir: &Path, response: &str, exit_code: i32) -> PathBuf {
    std::fs::write(dir.join("response.json"), response).unwrap();
    let script = format!(
        "#!/bin/sh\n\
         here=\"$(dirname \"$0\")\"\n\
         printf '%s\\n' \"$@\" > \"$here/args.txt\"\n\
         pwd > \"$here/cwd.txt\"\n\
         cat > \"$here/stdin.txt\"\n\
         cat \"$here/response.json\"\n\
         exit {exit_code}\n"
    );
    write_script(dir, "assistant", &script)
}

/// Never answers. Records its pid in `pid.txt`; `exec` keeps that pid for `sleep`.
fn hanging_assistant(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "hanging",
        "#!/bin/sh\necho $$ > \"$(dirname \"$0\")/pid.txt\"\nexec sleep 30\n",
    )
}

async fn recorded_pid(dir: &Path) -> u32 {
    let path = dir.join("pid.txt");
    for _ in 0..100 {
        if let Some(pid) = std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            return pid;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("assistant never recorded its pid");
}

fn process_alive(pid: u32) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("kill -0 {pid} 2>/dev/null"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

async fn assert_killed(pid: u32) {
    for _ in 0..60 {
        if !process_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("assistant process {pid} still running");
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn envelope(result: &str) -> String {
    serde_json::json!({ "type": "result", "result": result }).to_string()
}

#[tokio::test]
async fn verdict_from_envelope_with_fence() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = fake_assistant(
        dir.path(),
        &envelope("```json\n{\"shouldNotify\": true, \"message\": \"Tests failed\"}\n```"),
        0,
    );

    let request = TriageRequest::new("cargo test", 101, "test result: FAILED. 3 passed; 1 failed")
        .with_cwd(dir.path());
    let handle = TriageClient::new(&assistant).triage(request.prompt(), request.cwd.clone());

    assert_eq!(
        handle.result().await,
        Some(TriageResult {
            should_notify: true,
            message: "Tests failed".into(),
        })
    );

    let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
    assert_eq!(
        args.lines().collect::<Vec<_>>(),
        vec!["-p", "--model", "haiku", "--output-format", "json"]
    );

    let stdin = std::fs::read_to_string(dir.path().join("stdin.txt")).unwrap();
    assert!(stdin.contains("Command: cargo test"));
    assert!(stdin.contains("Exit code: 101"));
    assert!(stdin.contains("1 failed"));

    let cwd = std::fs::read_to_string(dir.path().join("cwd.txt")).unwrap();
    let expected = std::fs::canonicalize(dir.path()).unwrap();
    assert_eq!(std::fs::canonicalize(cwd.trim()).unwrap(), expected);
}

#[tokio::test]
async fn declined_verdict_without_envelope() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = fake_assistant(
        dir.path(),
        r#"{"shouldNotify": false, "message": "Interrupted by user"}"#,
        0,
    );

    let result = TriageClient::new(&assistant)
        .triage("prompt", None)
        .result()
        .await;
    assert_eq!(
        result,
        Some(TriageResult {
            should_notify: false,
            message: "Interrupted by user".into(),
        })
    );
}

#[tokio::test]
async fn model_is_configurable() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = fake_assistant(dir.path(), r#"{"shouldNotify": true}"#, 0);

    let result = TriageClient::new(&assistant)
        .with_model("sonnet")
        .triage("prompt", None)
        .result()
        .await;
    assert_eq!(
        result,
        Some(TriageResult {
            should_notify: true,
            message: String::new(),
        })
    );

    let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
    assert!(args.lines().any(|a| a == "sonnet"));
}

#[tokio::test]
async fn nonzero_exit_resolves_none() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = fake_assistant(dir.path(), r#"{"shouldNotify": true, "message": "x"}"#, 1);

    let result = TriageClient::new(&assistant)
        .triage("prompt", None)
        .result()
        .await;
    assert_eq!(result, None);
}

#[tokio::test]
async fn malformed_reply_resolves_none() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    for response in ["I think you should notify", r#"{"message": "no flag"}"#, "[true]"] {
        let assistant = fake_assistant(dir.path(), response, 0);
        let result = TriageClient::new(&assistant)
            .triage("prompt", None)
            .result()
            .await;
        assert_eq!(result, None, "{response}");
    }
}

#[tokio::test]
async fn hanging_assistant_times_out() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = hanging_assistant(dir.path());

    let started = Instant::now();
    let result = TriageClient::new(&assistant)
        .with_timeout(Duration::from_millis(500))
        .triage("prompt", None)
        .result()
        .await;

    assert_eq!(result, None);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_killed(recorded_pid(dir.path()).await).await;
}

#[tokio::test]
async fn default_timeout_is_eight_seconds() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = hanging_assistant(dir.path());

    let started = Instant::now();
    let result = TriageClient::new(&assistant)
        .triage("prompt", None)
        .result()
        .await;
    let elapsed = started.elapsed();

    assert_eq!(result, None);
    assert!(elapsed >= Duration::from_millis(7900), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(12), "{elapsed:?}");
    assert_killed(recorded_pid(dir.path()).await).await;
}

#[tokio::test]
async fn cancel_resolves_none_promptly() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = hanging_assistant(dir.path());

    let handle = TriageClient::new(&assistant).triage("prompt", None);
    let pid = recorded_pid(dir.path()).await;
    assert!(process_alive(pid));

    let canceller = handle.canceller();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    assert_eq!(handle.result().await, None);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_killed(pid).await;
}

#[tokio::test]
async fn cancel_after_completion_keeps_verdict() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = fake_assistant(dir.path(), r#"{"shouldNotify": true, "message": "Build failed"}"#, 0);

    let handle = TriageClient::new(&assistant).triage("prompt", None);
    let canceller = handle.canceller();

    let result = handle.result().await;
    canceller.cancel();
    canceller.cancel();

    assert_eq!(
        result,
        Some(TriageResult {
            should_notify: true,
            message: "Build failed".into(),
        })
    );
}

#[tokio::test]
async fn concurrency_cap_queues_triages() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = fake_assistant(dir.path(), r#"{"shouldNotify": true, "message": "ok"}"#, 0);

    let client = TriageClient::new(&assistant).with_max_concurrent(1);
    let handles: Vec<_> = (0..3).map(|_| client.triage("prompt", None)).collect();

    for handle in handles {
        assert!(handle.result().await.is_some());
    }
}

#[tokio::test]
async fn classifier_triage_end_to_end() {
    let _guard = serial();
    let dir = TempDir::new().unwrap();
    let assistant = fake_assistant(
        dir.path(),
        &envelope(r#"{"shouldNotify": false, "message": "grep found no matches"}"#),
        0,
    );

    let classifier = IntentClassifier::new(
        KnownCommandRegistry::new(std::sync::Arc::new(SystemShell::new("/bin/sh"))),
        SubcommandRegistry::builtin(),
        TriageClient::new(&assistant),
    );

    let outcome = classifier
        .triage_failure(&TriageRequest::new("grep TODO src", 1, ""))
        .await;
    assert_eq!(
        outcome,
        TriageOutcome::Suppress {
            reason: SuppressReason::AssistantDeclined {
                message: "grep found no matches".into()
            }
        }
    );

    let stdin = std::fs::read_to_string(dir.path().join("stdin.txt")).unwrap();
    assert!(stdin.contains("(no output captured)"));
}
