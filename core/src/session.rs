//! Authenticated sessions and the RemoteControl 2 endpoints they expose.
//!
//! # Design
//! A `Session` owns its session key from `get_session_key` until
//! `release_session_key`. Release happens exactly once: on `close`, at the
//! end of `scoped`, or from `Drop` if the session is abandoned (including
//! while a panic unwinds). Release failures are logged and ignored.
//!
//! Every endpoint sends `[key, ...args]` and returns a `Reply`; only
//! transport faults are `Err`.

use log::{info, warn};
use serde_json::{json, Value};

use crate::config::SessionConfig;
use crate::error::ClientError;
use crate::http::{Transport, UreqTransport};
use crate::normalize;
use crate::rpc::{RequestIds, RpcClient};
use crate::types::{ParticipantQuery, Reply, RpcError};

/// A RemoteControl 2 session.
pub struct Session<T: Transport = UreqTransport> {
    rpc: RpcClient<T>,
    key: Option<String>,
    auth_error: Option<RpcError>,
    released: bool,
}

impl Session<UreqTransport> {
    /// Opens a session over HTTP.
    pub fn connect(config: &SessionConfig) -> Result<Self, ClientError> {
        Self::open(config, UreqTransport::new())
    }
}

impl<T: Transport> Session<T> {
    /// Opens a session through `transport`, drawing ids from the process-wide
    /// counter.
    ///
    /// A rejected login still yields a session; it has no key and
    /// `auth_error` says why.
    pub fn open(config: &SessionConfig, transport: T) -> Result<Self, ClientError> {
        let rpc = RpcClient::new(&config.url, transport, RequestIds::global()).strict(config.strict);
        Self::authenticate(rpc, &config.username, &config.password)
    }

    pub fn authenticate(mut rpc: RpcClient<T>, username: &str, password: &str) -> Result<Self, ClientError> {
        let envelope = rpc.envelope("get_session_key", vec![json!(username), json!(password)]);
        let (key, auth_error) = normalize::session_key(rpc.call(&envelope)?);
        Ok(Self {
            rpc,
            key,
            auth_error,
            released: false,
        })
    }

    /// Opens a session, runs `f` with it, then releases the key whatever
    /// `f` returned.
    pub fn scoped<R, E, F>(config: &SessionConfig, transport: T, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Self) -> Result<R, E>,
        E: From<ClientError>,
    {
        let mut session = Self::open(config, transport)?;
        let outcome = f(&mut session);
        session.close();
        outcome
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.key.is_some()
    }

    /// Why the login failed, if it did.
    pub fn auth_error(&self) -> Option<&RpcError> {
        self.auth_error.as_ref()
    }

    /// Releases the session key.
    pub fn close(mut self) {
        self.release();
    }

    /// `list_surveys`: all surveys for an administrator, otherwise those
    /// owned by the user.
    pub fn list_surveys(&mut self) -> Result<Reply, ClientError> {
        self.invoke("list_surveys", Vec::new())
    }

    /// `list_participants`. An empty survey yields an empty list, not an error.
    pub fn list_participants(&mut self, survey_id: u64, query: &ParticipantQuery) -> Result<Reply, ClientError> {
        let args = vec![
            json!(survey_id),
            json!(query.offset),
            json!(query.limit),
            json!(query.include_unused),
            Value::from(&query.attributes),
        ];
        self.invoke("list_participants", args).map(normalize::participants)
    }

    pub fn get_participant_properties(
        &mut self,
        survey_id: u64,
        participant_id: u64,
        attributes: &[&str],
    ) -> Result<Reply, ClientError> {
        let args = vec![json!(survey_id), json!(participant_id), json!(attributes)];
        self.invoke("get_participant_properties", args)
    }

    /// `delete_participants`. On success the result maps each participant
    /// id to the service's verdict for it.
    pub fn delete_participants(&mut self, survey_id: u64, participant_ids: &[u64]) -> Result<Reply, ClientError> {
        let args = vec![json!(survey_id), json!(participant_ids)];
        self.invoke("delete_participants", args).map(normalize::deleted)
    }

    fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Reply, ClientError> {
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(Value::from(self.key.clone()));
        params.extend(args);
        let envelope = self.rpc.envelope(method, params);
        self.rpc.call(&envelope)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let key = self.key.take();
        info!("release session key: {}", key.as_deref().unwrap_or("<none>"));

        // The service answers "OK" even for unknown keys.
        let envelope = self.rpc.envelope("release_session_key", vec![Value::from(key)]);
        match self.rpc.call(&envelope) {
            Ok(Reply { error: Some(err), .. }) => warn!("release_session_key: {err}"),
            Ok(_) => {}
            Err(err) => warn!("release_session_key failed: {err}"),
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.release();
    }
}
