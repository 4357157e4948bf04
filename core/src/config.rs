//! Connection settings for a session.

use std::fmt;

use crate::error::ClientError;

pub const URL_VAR: &str = "LSRC2_URL";
pub const USERNAME_VAR: &str = "LSRC2_USERNAME";
pub const PASSWORD_VAR: &str = "LSRC2_PASSWORD";
pub const STRICT_VAR: &str = "LSRC2_STRICT";

/// Where and as whom to open a RemoteControl 2 session.
///
/// The usual URL is `http://<host>/<limesurvey>/index.php/admin/remotecontrol`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Reject responses that lack `id`, `result` or `error`.
    pub strict: bool,
}

impl SessionConfig {
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reads `LSRC2_URL`, `LSRC2_USERNAME`, `LSRC2_PASSWORD` and the
    /// optional `LSRC2_STRICT`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let require = |name: &str| lookup(name).ok_or_else(|| ClientError::Config(format!("{name} is not set")));
        let url = require(URL_VAR)?;
        let username = require(USERNAME_VAR)?;
        let password = require(PASSWORD_VAR)?;
        let strict = match lookup(STRICT_VAR).as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ClientError::Config(format!("{STRICT_VAR} must be 1/true or 0/false, got {other:?}")))
            }
        };
        Ok(Self::new(&url, &username, &password).strict(strict))
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("strict", &self.strict)
            .finish()
    }
}
