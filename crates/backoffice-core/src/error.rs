//! Error types for the backoffice client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for backoffice operations.
///
/// Callers match on the variant to tell a dead session
/// ([`AuthError::ReauthenticationRequired`]) apart from an ordinary failed
/// request.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (invalid credentials, dead session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (non-success HTTP status).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (bad URL, bad path, malformed payload).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Credential store failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    /// Returns true if this is a 401 response from the backend.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Protocol(p) if p.is_unauthorized())
    }

    /// Returns true if the session can no longer be refreshed and the user
    /// has to log in again.
    pub fn is_reauthentication_required(&self) -> bool {
        matches!(self, Error::Auth(AuthError::ReauthenticationRequired { .. }))
    }

    /// Returns true if the request was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend rejected the login credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No session is stored.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The refresh credential could not produce a new access credential.
    #[error("reauthentication required: {reason}")]
    ReauthenticationRequired { reason: String },
}

/// Protocol-level errors from non-success HTTP responses.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Short error name from the response body (if present).
    pub error: Option<String>,
    /// Error message from the response body (if present).
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Build a protocol error from a status and a decoded error body.
    ///
    /// Understands `{"error": "...", "message": "..."}` bodies, where
    /// `message` may also be a list of strings.
    pub fn from_body(status: u16, body: &serde_json::Value) -> Self {
        let error = body
            .get("error")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let message = match body.get("message") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => None,
        };
        Self::new(status, error, message)
    }

    /// Check if this is an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Invalid request path.
    #[error("invalid path '{value}': {reason}")]
    Path { value: String, reason: String },

    /// A response payload did not have the expected shape.
    #[error("malformed response: {message}")]
    Payload { message: String },

    /// The resource does not support the requested operation.
    #[error("{resource} does not support {operation}")]
    Unsupported {
        resource: &'static str,
        operation: &'static str,
    },
}

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The persisted session could not be encoded or decoded.
    #[error("corrupt session data: {message}")]
    Corrupt { message: String },
}
