//! Assistant response unwrapping
//!
//! The assistant CLI wraps its answer in a JSON envelope whose `result` field
//! holds the model's text, and models like to fence JSON in Markdown. Each
//! layer is optional; each step is tried in turn and any hard failure yields
//! `None`.

use super::TriageResult;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

lazy_static! {
    static ref CODE_FENCE: Option<Regex> = Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").ok();
}

#[derive(Deserialize)]
struct Envelope {
    result: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Verdict {
    #[serde(alias = "should_notify")]
    should_notify: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Parse raw assistant stdout into a verdict
pub fn parse_triage_response(raw: &str) -> Option<TriageResult> {
    let payload = unwrap_envelope(raw);
    let payload = strip_code_fence(&payload);
    parse_verdict(payload)
}

/// The envelope's `result` string, or the trimmed input when there is no envelope
pub fn unwrap_envelope(raw: &str) -> String {
    let trimmed = raw.trim();
    match serde_json::from_str::<Envelope>(trimmed) {
        Ok(envelope) => envelope.result,
        Err(_) => trimmed.to_string(),
    }
}

/// Contents of the first Markdown code fence, or the trimmed input
pub fn strip_code_fence(payload: &str) -> &str {
    let fenced = CODE_FENCE
        .as_ref()
        .and_then(|re| re.captures(payload))
        .and_then(|caps| caps.get(1));
    match fenced {
        Some(inner) => inner.as_str().trim(),
        None => payload.trim(),
    }
}

/// A JSON object with a boolean `shouldNotify`
pub fn parse_verdict(payload: &str) -> Option<TriageResult> {
    let value: Value = serde_json::from_str(payload).ok()?;
    if !value.is_object() {
        return None;
    }
    let verdict: Verdict = serde_json::from_value(value).ok()?;
    Some(TriageResult {
        should_notify: verdict.should_notify,
        message: verdict.message.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_payload() {
        let result = parse_triage_response(r#"{"shouldNotify": true, "message": "Build failed"}"#);
        assert_eq!(
            result,
            Some(TriageResult { should_notify: true, message: "Build failed".into() })
        );
    }

    #[test]
    fn test_envelope_with_fenced_payload() {
        let raw = r#"{"type":"result","is_error":false,"result":"```json\n{\"shouldNotify\": false, \"message\": \"Interrupted\"}\n```"}"#;
        let result = parse_triage_response(raw).unwrap();
        assert!(!result.should_notify);
        assert_eq!(result.message, "Interrupted");
    }

    #[test]
    fn test_envelope_without_fence() {
        let raw = r#"{"result":"{\"shouldNotify\":true}"}"#;
        let result = parse_triage_response(raw).unwrap();
        assert!(result.should_notify);
        assert_eq!(result.message, "");
    }

    #[test]
    fn test_fence_without_envelope_and_prose() {
        let raw = "Here is my answer:\n```\n{\"should_notify\": true, \"message\": \"x\"}\n```\nThanks";
        let result = parse_triage_response(raw).unwrap();
        assert!(result.should_notify);
    }

    #[test]
    fn test_missing_or_non_boolean_flag() {
        assert_eq!(parse_triage_response(r#"{"message": "hi"}"#), None);
        assert_eq!(parse_triage_response(r#"{"shouldNotify": "true"}"#), None);
        assert_eq!(parse_triage_response(r#"{"shouldNotify": 1}"#), None);
    }

    #[test]
    fn test_non_object_payloads() {
        assert_eq!(parse_triage_response(""), None);
        assert_eq!(parse_triage_response("not json"), None);
        assert_eq!(parse_triage_response("[true, \"msg\"]"), None);
        assert_eq!(parse_triage_response(r#"{"result": "I could not decide"}"#), None);
    }

    #[test]
    fn test_unwrap_steps() {
        assert_eq!(unwrap_envelope("  plain  "), "plain");
        assert_eq!(unwrap_envelope(r#"{"result":"inner"}"#), "inner");
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence(" {} "), "{}");
    }
}
