//! Data passed across the public API.
//!
//! # Design
//! Survey and participant records stay `serde_json::Value`: the client
//! forwards them untouched and only looks inside when deciding whether a
//! reply is really an error. The one shape it does own is the uniform
//! `Reply` pair every endpoint returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist or is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

/// A "status" text the service returned in place of a result, reported
/// as an error. Sits in the implementation-defined server error range.
pub const APPLICATION_STATUS: i64 = -32099;
/// A "status" text returned by `delete_participants`.
pub const APPLICATION_ERROR: i64 = -32500;

/// A JSON-RPC error object, either relayed from the service or synthesized
/// from one of its status replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// The `(result, error)` pair returned by every endpoint.
///
/// When `error` is `None` the call succeeded and `result` holds the
/// service's payload unmodified.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reply {
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

impl Reply {
    pub fn ok(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    /// A failure whose result slot holds an empty list, the way list
    /// endpoints report errors.
    pub fn empty_with(error: Option<RpcError>) -> Self {
        Self {
            result: Some(Value::Array(Vec::new())),
            error,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Option<Value>, RpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

/// Which extended participant attributes `list_participants` returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Attributes {
    /// Core fields only.
    #[default]
    None,
    /// Every extended attribute.
    All,
    /// The named attributes, e.g. `attribute_1`.
    Named(Vec<String>),
}

impl From<&Attributes> for Value {
    fn from(attributes: &Attributes) -> Self {
        match attributes {
            Attributes::None => Value::Bool(false),
            Attributes::All => Value::Bool(true),
            Attributes::Named(names) => {
                Value::Array(names.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Paging and projection options for `list_participants`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantQuery {
    pub offset: u64,
    pub limit: u64,
    /// Restrict the listing to participants whose token is still unused.
    pub include_unused: bool,
    pub attributes: Attributes,
}

impl Default for ParticipantQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 500,
            include_unused: false,
            attributes: Attributes::None,
        }
    }
}
