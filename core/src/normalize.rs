//! Per-endpoint rules that turn the service's status replies into errors.
//!
//! # Design
//! RemoteControl 2 reports many failures as a successful JSON-RPC response
//! whose `result` is `{"status": "<text>"}`, and reports an empty
//! participant table the same way. The raw `result` is classified once into
//! a `ResultShape`; each endpoint then matches on it and yields a `Reply`
//! (or a session key) in which a failure always shows up in `error`.
//!
//! Nothing here fails: every anomaly is an expected reply and is returned
//! as data.

use log::{error, info, warn};
use serde_json::{Map, Value};

use crate::types::{Reply, RpcError, APPLICATION_ERROR, APPLICATION_STATUS};

/// Status text meaning "this survey has no participants", not an error.
pub const NO_TOKENS_FOUND: &str = "No Tokens found";

/// A raw `result`, decoded once.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultShape {
    /// `null` or missing.
    Absent,
    /// A mapping carrying a `status` member.
    Status(String),
    /// Any other mapping.
    Mapping(Map<String, Value>),
    Other(Value),
}

impl From<Option<Value>> for ResultShape {
    fn from(result: Option<Value>) -> Self {
        match result {
            None | Some(Value::Null) => ResultShape::Absent,
            Some(Value::Object(map)) => match map.get("status") {
                Some(Value::String(text)) => ResultShape::Status(text.clone()),
                Some(other) => ResultShape::Status(other.to_string()),
                None => ResultShape::Mapping(map),
            },
            Some(other) => ResultShape::Other(other),
        }
    }
}

impl ResultShape {
    fn into_result(self) -> Option<Value> {
        match self {
            ResultShape::Absent => None,
            ResultShape::Status(text) => {
                let mut map = Map::new();
                map.insert("status".to_string(), Value::String(text));
                Some(Value::Object(map))
            }
            ResultShape::Mapping(map) => Some(Value::Object(map)),
            ResultShape::Other(value) => Some(value),
        }
    }
}

fn status_error(code: i64, method: &str, status: String) -> RpcError {
    error!("{method} returned status: {status}");
    RpcError::new(code, status)
}

fn shape_error(code: i64, method: &str, expected: &str, actual: &str) -> RpcError {
    let message = format!("JSON-RPC function \"{method}\" returned {actual}, expected {expected}");
    error!("{message}");
    RpcError::new(code, message)
}

/// `get_session_key`: a string result is the key; anything else leaves the
/// session without one.
pub fn session_key(reply: Reply) -> (Option<String>, Option<RpcError>) {
    const METHOD: &str = "get_session_key";
    match (ResultShape::from(reply.result), reply.error) {
        (ResultShape::Status(status), _) => (None, Some(status_error(APPLICATION_STATUS, METHOD, status))),
        (_, Some(err)) => {
            error!("{METHOD} failed to create a session key");
            (None, Some(err))
        }
        (ResultShape::Other(Value::String(key)), None) => {
            info!("new session key: {key}");
            (Some(key), None)
        }
        (ResultShape::Mapping(_), None) => (
            None,
            Some(shape_error(APPLICATION_STATUS, METHOD, "a string", "a dictionary")),
        ),
        (ResultShape::Absent, None) => (None, Some(shape_error(APPLICATION_STATUS, METHOD, "a string", "null"))),
        (ResultShape::Other(_), None) => (
            None,
            Some(shape_error(APPLICATION_STATUS, METHOD, "a string", "a non-string value")),
        ),
    }
}

/// `list_participants`: an empty survey is reported as the
/// `"No Tokens found"` status and becomes an empty list.
pub fn participants(reply: Reply) -> Reply {
    const METHOD: &str = "list_participants";
    match ResultShape::from(reply.result) {
        ResultShape::Status(status) if status == NO_TOKENS_FOUND => {
            if let Some(err) = reply.error {
                warn!("{METHOD}: discarding error {err} reported together with \"{NO_TOKENS_FOUND}\"");
            }
            Reply::empty_with(None)
        }
        ResultShape::Status(status) => Reply::empty_with(Some(status_error(APPLICATION_STATUS, METHOD, status))),
        ResultShape::Mapping(_) => Reply::empty_with(Some(shape_error(
            APPLICATION_STATUS,
            METHOD,
            "a list",
            "a dictionary",
        ))),
        shape => Reply {
            result: shape.into_result(),
            error: reply.error,
        },
    }
}

/// `delete_participants`: a status reply is an application error. Any other
/// mapping is the per-participant deletion report and passes through.
///
/// A mapping without "status" is never turned into an error here, since
/// the service sends exactly that shape when the deletion succeeds.
pub fn deleted(reply: Reply) -> Reply {
    const METHOD: &str = "delete_participants";
    match ResultShape::from(reply.result) {
        ResultShape::Status(status) => Reply::empty_with(Some(status_error(APPLICATION_ERROR, METHOD, status))),
        shape => Reply {
            result: shape.into_result(),
            error: reply.error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(result: Value, error: Option<RpcError>) -> Reply {
        Reply {
            result: Some(result),
            error,
        }
    }

    #[test]
    fn classify_distinguishes_shapes() {
        assert_eq!(ResultShape::from(None), ResultShape::Absent);
        assert_eq!(ResultShape::from(Some(Value::Null)), ResultShape::Absent);
        assert_eq!(
            ResultShape::from(Some(json!({"status": "OK"}))),
            ResultShape::Status("OK".to_string())
        );
        assert!(matches!(ResultShape::from(Some(json!({"3": "Deleted"}))), ResultShape::Mapping(_)));
        assert_eq!(ResultShape::from(Some(json!([1]))), ResultShape::Other(json!([1])));
    }

    #[test]
    fn non_string_status_is_still_a_status() {
        assert_eq!(
            ResultShape::from(Some(json!({"status": 7}))),
            ResultShape::Status("7".to_string())
        );
    }

    #[test]
    fn session_key_accepts_string() {
        let (key, err) = session_key(reply(json!("abc123"), None));
        assert_eq!(key.as_deref(), Some("abc123"));
        assert!(err.is_none());
    }

    #[test]
    fn session_key_status_becomes_error() {
        let (key, err) = session_key(reply(json!({"status": "Invalid user name or password"}), None));
        assert!(key.is_none());
        assert_eq!(err, Some(RpcError::new(APPLICATION_STATUS, "Invalid user name or password")));
    }

    #[test]
    fn session_key_mapping_without_status_is_shape_error() {
        let (key, err) = session_key(reply(json!({"key": "abc"}), None));
        assert!(key.is_none());
        let err = err.unwrap();
        assert_eq!(err.code, APPLICATION_STATUS);
        assert!(err.message.contains("get_session_key"));
        assert!(err.message.contains("expected a string"));
    }

    #[test]
    fn session_key_keeps_protocol_error() {
        let protocol = RpcError::new(-32603, "boom");
        let (key, err) = session_key(Reply {
            result: None,
            error: Some(protocol.clone()),
        });
        assert!(key.is_none());
        assert_eq!(err, Some(protocol));
    }

    #[test]
    fn participants_pass_through() {
        let list = json!([{"tid": "1", "token": "t1", "participant_info": {}}]);
        assert_eq!(participants(reply(list.clone(), None)), Reply::ok(list));
    }

    #[test]
    fn no_tokens_found_is_empty_success() {
        let normalized = participants(reply(json!({"status": NO_TOKENS_FOUND}), None));
        assert_eq!(normalized, Reply::ok(json!([])));
    }

    #[test]
    fn no_tokens_found_discards_protocol_error() {
        let normalized = participants(reply(
            json!({"status": NO_TOKENS_FOUND}),
            Some(RpcError::new(-32603, "inconsistent")),
        ));
        assert_eq!(normalized, Reply::ok(json!([])));
    }

    #[test]
    fn other_participant_status_is_error() {
        let normalized = participants(reply(json!({"status": "Invalid session key"}), None));
        assert_eq!(
            normalized,
            Reply::empty_with(Some(RpcError::new(APPLICATION_STATUS, "Invalid session key")))
        );
    }

    #[test]
    fn participant_mapping_without_status_is_shape_error() {
        let normalized = participants(reply(json!({"tid": "1"}), None));
        assert_eq!(normalized.result, Some(json!([])));
        let err = normalized.error.unwrap();
        assert_eq!(err.code, APPLICATION_STATUS);
        assert!(err.message.contains("list_participants"));
        assert!(err.message.contains("expected a list"));
    }

    #[test]
    fn participants_keep_protocol_error() {
        let protocol = RpcError::new(-32602, "Invalid params");
        let normalized = participants(Reply {
            result: None,
            error: Some(protocol.clone()),
        });
        assert_eq!(normalized.result, None);
        assert_eq!(normalized.error, Some(protocol));
    }

    #[test]
    fn delete_status_is_application_error() {
        let normalized = deleted(reply(json!({"status": "Error: Invalid survey ID"}), None));
        assert_eq!(
            normalized,
            Reply::empty_with(Some(RpcError::new(APPLICATION_ERROR, "Error: Invalid survey ID")))
        );
    }

    #[test]
    fn delete_report_passes_through() {
        let report = json!({"1": "Deleted", "9": "Invalid token ID"});
        assert_eq!(deleted(reply(report.clone(), None)), Reply::ok(report));
    }
}
