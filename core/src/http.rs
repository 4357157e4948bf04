//! HTTP requests and responses as plain data, and the transport that moves them.
//!
//! # Design
//! The RPC layer builds an `HttpRequest` and parses an `HttpResponse`
//! without touching the network. Sending is delegated to a `Transport`,
//! so tests can script replies while `UreqTransport` does real I/O.
//! Connection reuse, TLS and timeouts are the transport's business.

use crate::error::ClientError;

/// An HTTP POST described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes HTTP POST requests on behalf of the RPC layer.
///
/// Implementations must return non-2xx replies as `Ok` data; only failures
/// to reach the server or read its reply are `Err`.
pub trait Transport {
    fn post(&mut self, request: &HttpRequest) -> Result<HttpResponse, ClientError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post(&mut self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        (**self).post(request)
    }
}

/// Blocking transport backed by a single `ureq::Agent`, which keeps
/// connections alive between calls of the same session.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn post(&mut self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
