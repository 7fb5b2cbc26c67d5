//! Request and response descriptors.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, InvalidInputError};

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(InvalidInputError::Path {
                value: s.to_string(),
                reason: "unknown HTTP method".to_string(),
            }
            .into()),
        }
    }
}

/// An immutable description of one logical backend call.
///
/// The pipeline may send the same descriptor twice (original and replay
/// after a refresh); it never mutates it.
///
/// # Example
///
/// ```
/// use backoffice_core::{ApiRequest, Method};
///
/// let request = ApiRequest::get("/admin/users")
///     .with_query("page", "1")
///     .with_query("take", "10");
/// assert_eq!(request.method(), Method::Get);
/// assert_eq!(request.query().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Create a request with the given method and path.
    ///
    /// A missing leading `/` is added.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach any serializable value as the JSON body.
    pub fn with_json<T: Serialize>(self, body: &T) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Payload {
            message: e.to_string(),
        })?;
        Ok(self.with_body(value))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// A successful backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code (always 2xx).
    pub status: u16,
    /// Decoded body. Empty bodies decode to `null`, non-JSON bodies to a
    /// JSON string.
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    /// Decode a response body from raw text.
    pub fn from_text(status: u16, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
        };
        Self::new(status, body)
    }

    /// The `data` envelope most endpoints wrap their payload in, or the
    /// whole body when there is none.
    pub fn data(&self) -> &serde_json::Value {
        self.body.get("data").unwrap_or(&self.body)
    }
}
