//! Transport-fault types for the RemoteControl 2 client.
//!
//! # Design
//! Only faults that abort a call live here. Errors the service reports,
//! including the ones it smuggles through the `result` slot, are data
//! (`RpcError` inside a `Reply`) and never become a `ClientError`.

use thiserror::Error;

/// Faults that prevent a call from producing a `(result, error)` pair.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never reached the server, or the reply could not be read.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a status other than 200.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request envelope could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body is not a JSON-RPC response object.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The response answers a different request than the one sent.
    #[error("response id {actual:?} does not match request id {expected}")]
    IdMismatch { expected: u64, actual: Option<u64> },

    /// Strict mode: the response object lacks a mandatory member.
    #[error("malformed JSON-RPC response: {0}")]
    MalformedResponse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
