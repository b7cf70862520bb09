//! Structured auth errors.

use std::fmt;

use serde_json::Value;

/// Error categories for auth operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The service rejected the request with a readable message.
    Api,
    /// Non-success HTTP status without a readable message.
    HttpStatus,
    /// Connection-level failure (DNS, TLS, refused).
    Network,
    /// Request exceeded the configured timeout.
    Timeout,
    /// Response body could not be decoded.
    Parse,
    /// Client-side configuration problem.
    Config,
}

impl AuthErrorKind {
    /// Whether retrying the same call later could succeed.
    pub fn is_transient(self) -> bool {
        matches!(self, AuthErrorKind::Network | AuthErrorKind::Timeout)
    }
}

/// Error returned by every backend operation.
///
/// `message` is what the user sees; `details` carries the raw body for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
    /// HTTP status when the error came from a response.
    pub status: Option<u16>,
    pub details: Option<String>,
}

// Fields checked, in order, for a human-readable message in error bodies.
const MESSAGE_FIELDS: [&str; 4] = ["msg", "error_description", "message", "error"];

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
        }
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Api, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Parse, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Config, message)
    }

    /// Builds an error from a non-success response.
    ///
    /// Uses the first non-empty string among `msg`, `error_description`,
    /// `message` and `error`; falls back to `HTTP <status>`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let extracted = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| extract_message(&json));

        let (kind, message) = match extracted {
            Some(msg) => (AuthErrorKind::Api, msg),
            None => (AuthErrorKind::HttpStatus, format!("HTTP {status}")),
        };

        Self {
            kind,
            message,
            status: Some(status),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Maps a transport error, keeping timeouts distinct.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout("The auth service did not respond in time.")
        } else if err.is_decode() {
            Self::parse(format!("Unreadable response from the auth service: {err}"))
        } else {
            let mut error = Self::network("Could not reach the auth service.");
            error.details = Some(err.to_string());
            error
        }
    }
}

fn extract_message(json: &Value) -> Option<String> {
    MESSAGE_FIELDS.iter().find_map(|field| {
        json.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    })
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthError {}

/// Result type for auth operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;
