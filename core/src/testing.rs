//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::error::ClientError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// One scripted answer, consumed per request.
pub(crate) enum Script {
    /// Reply with the request's own id.
    Reply { result: Value, error: Value },
    /// Reply with an id that answers some other request.
    WrongId,
    Unreachable,
}

impl Script {
    pub(crate) fn result(result: Value) -> Self {
        Script::Reply {
            result,
            error: Value::Null,
        }
    }

    pub(crate) fn pair(result: Value, error: Value) -> Self {
        Script::Reply { result, error }
    }
}

/// Request bodies seen by a `ScriptedTransport`, shared with the test.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<Value>>>);

impl CallLog {
    pub(crate) fn requests(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

pub(crate) struct ScriptedTransport {
    script: VecDeque<Script>,
    log: CallLog,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Script>) -> Self {
        Self {
            script: script.into(),
            log: CallLog::default(),
        }
    }

    pub(crate) fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Transport for ScriptedTransport {
    fn post(&mut self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        let body: Value = serde_json::from_str(&request.body).unwrap();
        let id = body["id"].as_u64().unwrap();
        self.log.0.lock().unwrap().push(body);

        let reply = match self.script.pop_front() {
            Some(Script::Reply { result, error }) => json!({"id": id, "result": result, "error": error}),
            Some(Script::WrongId) => json!({"id": id + 1000, "result": null, "error": null}),
            Some(Script::Unreachable) | None => {
                return Err(ClientError::Transport("connection refused".to_string()))
            }
        };
        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: reply.to_string(),
        })
    }
}
