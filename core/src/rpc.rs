//! JSON-RPC 2.0 envelopes and the adapter that exchanges them over HTTP.
//!
//! # Design
//! Like the rest of the client, a call is split into `build_request`
//! (envelope to `HttpRequest`) and `parse_response` (`HttpResponse` to
//! `RpcResponse`); `call` runs both around the transport. A response whose
//! `id` differs from the request's is a fault, never a `Reply`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use log::{debug, error};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{Reply, RpcError};

const JSONRPC_VERSION: &str = "2.0";

/// Methods whose params carry credentials and stay out of the log.
const REDACTED_METHODS: &[&str] = &["get_session_key"];

/// Source of correlation ids. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RequestIds(Arc<AtomicU64>);

static PROCESS_IDS: OnceLock<RequestIds> = OnceLock::new();

impl RequestIds {
    /// A fresh counter, independent of every other one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The counter shared by every session of this process.
    pub fn global() -> Self {
        PROCESS_IDS.get_or_init(RequestIds::new).clone()
    }

    /// Increments the counter and returns the new value, so ids start at 1.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// A JSON-RPC request object. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: Vec<Value>,
}

impl Envelope {
    /// Stamps the next id from `ids` onto a request for `method`.
    pub fn build(ids: &RequestIds, method: &str, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: ids.next(),
            method: method.to_string(),
            params,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// A JSON-RPC response object as received.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

impl From<RpcResponse> for Reply {
    fn from(response: RpcResponse) -> Self {
        Reply {
            result: response.result,
            error: response.error,
        }
    }
}

/// Sends envelopes to one endpoint URL through a `Transport`.
#[derive(Debug)]
pub struct RpcClient<T> {
    url: String,
    transport: T,
    ids: RequestIds,
    strict: bool,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(url: &str, transport: T, ids: RequestIds) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            transport,
            ids,
            strict: false,
        }
    }

    /// Additionally require `id`, `result` and `error` in every response.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn envelope(&self, method: &str, params: Vec<Value>) -> Envelope {
        Envelope::build(&self.ids, method, params)
    }

    pub fn build_request(&self, envelope: &Envelope) -> Result<HttpRequest, ClientError> {
        let body = serde_json::to_string(envelope).map_err(|e| ClientError::Serialization(e.to_string()))?;
        if REDACTED_METHODS.contains(&envelope.method.as_str()) {
            debug!("JSON-RPC request: {} #{} (params redacted)", envelope.method, envelope.id);
        } else {
            debug!("JSON-RPC request: {body}");
        }
        Ok(HttpRequest {
            url: self.url.clone(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        })
    }

    pub fn parse_response(&self, envelope: &Envelope, response: HttpResponse) -> Result<RpcResponse, ClientError> {
        if response.status != 200 {
            return Err(ClientError::HttpError {
                status: response.status,
                body: response.body,
            });
        }
        debug!("JSON-RPC response: {}", response.body);

        let value: Value =
            serde_json::from_str(&response.body).map_err(|e| ClientError::Deserialization(e.to_string()))?;
        if self.strict {
            check_members(&value)?;
        }
        let parsed: RpcResponse =
            serde_json::from_value(value).map_err(|e| ClientError::Deserialization(e.to_string()))?;

        if parsed.id != Some(envelope.id) {
            return Err(ClientError::IdMismatch {
                expected: envelope.id,
                actual: parsed.id,
            });
        }
        if let Some(err) = &parsed.error {
            error!("{} failed: {err}", envelope.method);
        }
        Ok(parsed)
    }

    /// Sends `envelope` and returns the raw `(result, error)` pair.
    pub fn call(&mut self, envelope: &Envelope) -> Result<Reply, ClientError> {
        let request = self.build_request(envelope)?;
        let response = self.transport.post(&request)?;
        self.parse_response(envelope, response).map(Reply::from)
    }
}

fn check_members(value: &Value) -> Result<(), ClientError> {
    let object = value
        .as_object()
        .ok_or_else(|| ClientError::MalformedResponse("response is not an object".to_string()))?;
    for member in ["id", "result", "error"] {
        if !object.contains_key(member) {
            return Err(ClientError::MalformedResponse(format!("missing \"{member}\"")));
        }
    }
    Ok(())
}
