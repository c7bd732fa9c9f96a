//! Admin portal guarded by HTTP Basic authentication
//!
//! A single credential pair, taken from configuration at startup and never
//! changed afterwards.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::config::AdminConfig;

/// Body returned to an authenticated admin
pub const ADMIN_GREETING: &str = "Super secret admin portal";

/// Body returned on any authentication failure
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Reasons an admin request is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingCredentials,

    #[error("malformed Basic credentials")]
    MalformedCredentials,

    #[error("invalid username or password")]
    InvalidCredentials,
}

/// Credential check for the admin route
#[derive(Debug, Clone)]
pub struct AdminPortal {
    username: String,
    password: String,
}

impl AdminPortal {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Check a raw `Authorization` header value
    pub fn authorize(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let header = authorization.ok_or(AuthError::MissingCredentials)?;
        let (user, pass) = parse_basic(header)?;

        if user != self.username || pass != self.password {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }
}

/// Split `Basic <base64(user:pass)>` into its parts
fn parse_basic(header: &str) -> Result<(String, String), AuthError> {
    let (scheme, encoded) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedCredentials)?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::MalformedCredentials);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::MalformedCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredentials)?;

    let (user, pass) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedCredentials)?;

    Ok((user.to_string(), pass.to_string()))
}
