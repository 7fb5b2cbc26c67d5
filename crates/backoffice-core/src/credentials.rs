//! Login credentials type.

use std::fmt;

use serde::Serialize;

/// Administrator login credentials.
///
/// Serializes to the `{email, password}` body the login endpoint expects.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use backoffice_core::Credentials;
///
/// let creds = Credentials::new("admin@example.com", "hunter2");
/// assert_eq!(creds.email(), "admin@example.com");
/// ```
#[derive(Clone, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns the account email.
    pub fn email(&self) -> &str {
        &self.email
    }
}

// Intentionally hide password in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
