//! Error taxonomy for pipeline stage invocations.
//!
//! Three failure classes exist: precondition errors raised locally before any
//! network call, transport errors from the HTTP call itself, and tool errors
//! reported by the backend with a structured payload of varying shape.

use serde_json::Value;
use thiserror::Error;

/// Failure of a single stage invocation. Terminal for that invocation; no
/// automatic retry.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// Required input for the stage is missing. Raised synchronously, before
    /// any external call is made.
    #[error("{0}")]
    Precondition(String),

    /// The invocation call itself failed (unreachable backend, timeout).
    #[error("{0}")]
    Transport(String),

    /// The backend was reached but the invoked tool reported failure. The
    /// raw payload is kept so the expert view can show it unreduced.
    #[error("{}", normalize_detail(.0))]
    Tool(Value),
}

impl StageError {
    /// The unreduced tool error payload, when there is one.
    pub fn raw_detail(&self) -> Option<&Value> {
        match self {
            StageError::Tool(v) => Some(v),
            _ => None,
        }
    }
}

/// Reduce a tool error payload to a single display string.
///
/// The backend wraps structured errors in a `detail` member, which is
/// unwrapped first. String payloads pass through unchanged; objects yield
/// their `stderr` (when non-empty), then their `message`; anything else is
/// rendered as compact JSON.
pub fn normalize_detail(raw: &Value) -> String {
    let detail = raw.get("detail").unwrap_or(raw);
    if let Some(s) = detail.as_str() {
        return s.to_string();
    }
    if let Some(s) = detail.get("stderr").and_then(Value::as_str) {
        if !s.trim().is_empty() {
            return s.to_string();
        }
    }
    if let Some(s) = detail.get("message").and_then(Value::as_str) {
        return s.to_string();
    }
    detail.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn plain_string_passes_through() {
        assert_eq!(normalize_detail(&json!("boom")), "boom");
    }

    #[test]
    fn detail_envelope_is_unwrapped() {
        assert_eq!(normalize_detail(&json!({"detail": "not found"})), "not found");
    }

    #[test]
    fn stderr_wins_over_message() {
        let v = json!({"detail": {"message": "analysis failed", "stderr": "rule error at line 3"}});
        assert_eq!(normalize_detail(&v), "rule error at line 3");
    }

    #[test]
    fn empty_stderr_falls_back_to_message() {
        let v = json!({"detail": {"message": "analysis failed", "stderr": ""}});
        assert_eq!(normalize_detail(&v), "analysis failed");
    }

    #[test]
    fn opaque_object_renders_as_json() {
        let v = json!({"code": 42});
        assert_eq!(normalize_detail(&v), r#"{"code":42}"#);
    }

    #[test]
    fn tool_error_keeps_raw_payload() {
        let raw = json!({"detail": {"message": "nope"}});
        let err = StageError::Tool(raw.clone());
        assert_eq!(err.to_string(), "nope");
        assert_eq!(err.raw_detail(), Some(&raw));
    }

    #[test]
    fn precondition_and_transport_have_no_raw_payload() {
        assert_eq!(StageError::Precondition("no log".into()).raw_detail(), None);
        assert_eq!(StageError::Transport("timeout".into()).raw_detail(), None);
    }
}
