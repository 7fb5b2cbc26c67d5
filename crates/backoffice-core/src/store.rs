//! Credential store contract and the in-memory implementation.
//!
//! A store holds three flat string entries under one namespace: the access
//! token (`at`), the refresh token (`rt`) and the JSON-serialized user
//! identity (`user`). They are written together on login, cleared together
//! on logout, and only the access token changes on refresh.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuthError, StorageError};
use crate::tokens::{AccessToken, RefreshToken};
use crate::types::UserIdentity;
use crate::Result;

/// Storage key of the access token.
pub const ACCESS_KEY: &str = "at";

/// Storage key of the refresh token.
pub const REFRESH_KEY: &str = "rt";

/// Storage key of the serialized user identity.
pub const USER_KEY: &str = "user";

/// The persisted session entries.
///
/// A partial state (exactly one token present) reads as logged out: both
/// token accessors return `None`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntries {
    #[serde(rename = "at", default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(rename = "rt", default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl SessionEntries {
    /// Returns true when both tokens are present.
    pub fn is_authenticated(&self) -> bool {
        self.access.is_some() && self.refresh.is_some()
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        if !self.is_authenticated() {
            return None;
        }
        self.access.as_deref().map(AccessToken::new)
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        if !self.is_authenticated() {
            return None;
        }
        self.refresh.as_deref().map(RefreshToken::new)
    }

    /// Returns the cached identity, if it decodes.
    pub fn user(&self) -> Option<UserIdentity> {
        let raw = self.user.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring undecodable cached user identity");
                None
            }
        }
    }

    /// Replace the access token of an existing session.
    ///
    /// Refused when no refresh token is stored, since that would leave
    /// exactly one token behind.
    pub fn set_access(&mut self, token: &AccessToken) -> Result<()> {
        if self.refresh.is_none() {
            return Err(AuthError::NotAuthenticated.into());
        }
        self.access = Some(token.as_str().to_string());
        Ok(())
    }

    /// Replace the access token only if the stored session is still the one
    /// that `issued_for` belongs to.
    ///
    /// Returns `Ok(false)` without writing when another session has been
    /// stored since. Refused when no refresh token is stored.
    pub fn set_access_for(
        &mut self,
        issued_for: &RefreshToken,
        token: &AccessToken,
    ) -> Result<bool> {
        if self.refresh.is_none() {
            return Err(AuthError::NotAuthenticated.into());
        }
        if self.refresh_token().as_ref() != Some(issued_for) {
            return Ok(false);
        }
        self.access = Some(token.as_str().to_string());
        Ok(true)
    }

    /// Replace the whole session.
    pub fn set_session(
        &mut self,
        user: Option<&UserIdentity>,
        access: &AccessToken,
        refresh: &RefreshToken,
    ) -> Result<()> {
        let user = user
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StorageError::Corrupt {
                message: e.to_string(),
            })?;
        self.access = Some(access.as_str().to_string());
        self.refresh = Some(refresh.as_str().to_string());
        self.user = user;
        Ok(())
    }

    /// Remove all three entries.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true when no entry is present.
    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none() && self.user.is_none()
    }
}

impl fmt::Debug for SessionEntries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("SessionEntries")
            .field(ACCESS_KEY, &redact(&self.access))
            .field(REFRESH_KEY, &redact(&self.refresh))
            .field(USER_KEY, &self.user)
            .finish()
    }
}

/// Persistent holder of the current session.
///
/// Implementations provide an atomic snapshot and an atomic
/// read-modify-write; every accessor is derived from those two, so no reader
/// can observe a half-applied update such as a partial clear.
pub trait CredentialStore: Send + Sync {
    /// Returns a consistent copy of the stored entries.
    fn snapshot(&self) -> SessionEntries;

    /// Apply `change` to a copy of the entries and commit it.
    ///
    /// Nothing is committed if `change` or persisting the result fails.
    fn update(&self, change: &mut dyn FnMut(&mut SessionEntries) -> Result<()>) -> Result<()>;

    fn access_token(&self) -> Option<AccessToken> {
        self.snapshot().access_token()
    }

    fn refresh_token(&self) -> Option<RefreshToken> {
        self.snapshot().refresh_token()
    }

    fn user(&self) -> Option<UserIdentity> {
        self.snapshot().user()
    }

    fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    fn set_access_token(&self, token: &AccessToken) -> Result<()> {
        self.update(&mut |entries| entries.set_access(token))
    }

    /// Commit a refreshed access token unless the session it was issued for
    /// has been replaced. Returns whether it was written.
    fn set_access_token_for(&self, issued_for: &RefreshToken, token: &AccessToken) -> Result<bool> {
        let mut written = false;
        self.update(&mut |entries| {
            written = entries.set_access_for(issued_for, token)?;
            Ok(())
        })?;
        Ok(written)
    }

    fn set_session(
        &self,
        user: Option<&UserIdentity>,
        access: &AccessToken,
        refresh: &RefreshToken,
    ) -> Result<()> {
        self.update(&mut |entries| entries.set_session(user, access, refresh))
    }

    fn clear(&self) -> Result<()> {
        self.update(&mut |entries| {
            entries.clear();
            Ok(())
        })
    }
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<SessionEntries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session.
    pub fn with_session(
        user: Option<&UserIdentity>,
        access: &AccessToken,
        refresh: &RefreshToken,
    ) -> Result<Self> {
        let mut entries = SessionEntries::default();
        entries.set_session(user, access, refresh)?;
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }
}

impl CredentialStore for MemoryStore {
    fn snapshot(&self) -> SessionEntries {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, change: &mut dyn FnMut(&mut SessionEntries) -> Result<()>) -> Result<()> {
        let mut guard = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        change(&mut next)?;
        *guard = next;
        Ok(())
    }
}
