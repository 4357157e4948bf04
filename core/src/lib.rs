//! Client for the LimeSurvey RemoteControl 2 JSON-RPC API.
//!
//! # Overview
//! A `Session` logs in with `get_session_key`, calls a handful of survey
//! and participant endpoints, and releases its key when closed or dropped.
//! Every endpoint returns a `Reply`, the `(result, error)` pair of JSON-RPC,
//! after the service's habit of reporting errors as `{"status": "..."}`
//! results has been turned into proper `RpcError`s.
//!
//! # Design
//! - `rpc` builds envelopes with process-unique ids and checks that each
//!   response echoes the id of its request.
//! - `normalize` holds the per-endpoint status rules; they never fail.
//! - `http::Transport` is the only I/O seam. `UreqTransport` is the default;
//!   tests script replies in memory.
//! - `ClientError` is reserved for faults that abort a call. Errors reported
//!   by the service, genuine or synthesized, are data inside `Reply`.
//!
//! ```no_run
//! use lsrc2::{ParticipantQuery, Session, SessionConfig};
//!
//! let config = SessionConfig::new("https://example.org/index.php/admin/remotecontrol", "admin", "secret");
//! let mut session = Session::connect(&config)?;
//! let surveys = session.list_surveys()?;
//! let participants = session.list_participants(123456, &ParticipantQuery::default())?;
//! session.close();
//! # Ok::<(), lsrc2::ClientError>(())
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod rpc;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::SessionConfig;
pub use error::ClientError;
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use rpc::{Envelope, RequestIds, RpcClient, RpcResponse};
pub use session::Session;
pub use types::{Attributes, ParticipantQuery, Reply, RpcError, APPLICATION_ERROR, APPLICATION_STATUS};
