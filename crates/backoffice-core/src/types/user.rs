//! Signed-in user identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The principal returned by the login endpoint.
///
/// The record is kept verbatim; only the common string fields get accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(serde_json::Value);

impl UserIdentity {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn id(&self) -> Option<&str> {
        self.field("id")
    }

    pub fn email(&self) -> Option<&str> {
        self.field("email")
    }

    pub fn role(&self) -> Option<&str> {
        self.field("role")
    }

    pub fn nickname(&self) -> Option<&str> {
        self.field("nickname")
    }

    /// Returns the underlying JSON record.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_str())
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.nickname(), self.email()) {
            (Some(nick), Some(email)) => write!(f, "{} <{}>", nick, email),
            (None, Some(email)) => f.write_str(email),
            (Some(nick), None) => f.write_str(nick),
            (None, None) => f.write_str("unknown user"),
        }
    }
}

/// Page selection for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub take: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, take: 10 }
    }
}
