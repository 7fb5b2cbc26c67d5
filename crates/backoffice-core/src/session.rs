//! Session lifecycle: login, logout and startup restore.

use std::sync::{Arc, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::credentials::Credentials;
use crate::endpoints::{LOGIN, LOGOUT, LoginResponse};
use crate::error::{AuthError, Error};
use crate::pipeline::AuthedClient;
use crate::tokens::RefreshToken;
use crate::types::{ApiRequest, ApiResponse, UserIdentity};
use crate::{Backend, Result};

/// Authentication state seen by the rest of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Authenticating,
    LoggedIn,
}

/// Owns the in-memory authentication state and keeps it in step with the
/// credential store.
///
/// Cheap to clone; clones share state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use backoffice_core::{AuthedClient, Backend, Credentials, MemoryStore, SessionManager};
///
/// # async fn example<B: Backend>(backend: B) {
/// let client = AuthedClient::new(backend, Arc::new(MemoryStore::new()));
/// let session = SessionManager::restore(client);
///
/// if session.login(&Credentials::new("admin@example.com", "secret")).await.is_ok() {
///     assert!(session.is_authenticated());
/// }
/// session.logout().await;
/// # }
/// ```
pub struct SessionManager<B> {
    inner: Arc<ManagerInner<B>>,
}

struct ManagerInner<B> {
    client: AuthedClient<B>,
    status: RwLock<Status>,
}

#[derive(Debug, Clone)]
struct Status {
    state: SessionState,
    user: Option<UserIdentity>,
    last_error: Option<String>,
}

impl<B> Clone for SessionManager<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> SessionManager<B> {
    /// Derive the initial state from the credential store.
    ///
    /// Both tokens present means `LoggedIn`; no network call is made to
    /// validate them. A stale token shows up on the first protected request.
    /// A partial session left behind by an interrupted write is cleared.
    pub fn restore(client: AuthedClient<B>) -> Self {
        let entries = client.store().snapshot();

        let status = if entries.is_authenticated() {
            Status {
                state: SessionState::LoggedIn,
                user: entries.user(),
                last_error: None,
            }
        } else {
            if !entries.is_empty() {
                warn!("Discarding incomplete stored session");
                if let Err(e) = client.store().clear() {
                    warn!(error = %e, "Failed to clear incomplete session");
                }
            }
            Status {
                state: SessionState::LoggedOut,
                user: None,
                last_error: None,
            }
        };

        info!(state = ?status.state, "Session restored");

        Self {
            inner: Arc::new(ManagerInner {
                client,
                status: RwLock::new(status),
            }),
        }
    }

    pub fn client(&self) -> &AuthedClient<B> {
        &self.inner.client
    }

    pub fn state(&self) -> SessionState {
        self.read_status().state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::LoggedIn
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.read_status().user
    }

    /// Message of the most recent login, logout or session failure.
    pub fn last_error(&self) -> Option<String> {
        self.read_status().last_error
    }

    /// Log in and persist the session.
    ///
    /// Failures are returned as values and recorded in
    /// [`last_error`](Self::last_error); the state ends in `LoggedOut` and
    /// nothing stays persisted.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Option<UserIdentity>> {
        self.set_status(SessionState::Authenticating, None, None);

        match self.authenticate(credentials).await {
            Ok(user) => {
                info!("Logged in");
                self.set_status(SessionState::LoggedIn, user.clone(), None);
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                if let Err(clear_err) = self.inner.client.store().clear() {
                    warn!(error = %clear_err, "Failed to clear session after failed login");
                }
                self.set_status(SessionState::LoggedOut, None, Some(e.to_string()));
                Err(e)
            }
        }
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<UserIdentity>> {
        let request = ApiRequest::post(LOGIN).with_json(credentials)?;

        // Login is unauthenticated; a 401 here means bad credentials, not an
        // expired session, so it bypasses the pipeline.
        let response = self
            .inner
            .client
            .backend()
            .execute(&request, None)
            .await
            .map_err(|e| match e {
                Error::Protocol(p) if p.is_unauthorized() => AuthError::InvalidCredentials.into(),
                other => other,
            })?;

        let output = LoginResponse::parse(&response)?;

        self.inner.client.store().set_session(
            output.user.as_ref(),
            &output.access_token,
            &output.refresh_token,
        )?;

        Ok(output.user)
    }

    /// Log out locally, telling the backend on a best-effort basis.
    ///
    /// The store is cleared and the state becomes `LoggedOut` whatever the
    /// backend answers.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let store = self.inner.client.store();

        if store.is_authenticated() {
            match self.inner.client.send(&ApiRequest::post(LOGOUT)).await {
                Ok(_) => debug!("Backend session invalidated"),
                Err(e) => warn!(error = %e, "Backend logout failed, clearing local session anyway"),
            }
        } else {
            debug!("No stored session, skipping backend logout");
        }

        let last_error = match store.clear() {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Failed to clear stored session");
                Some(e.to_string())
            }
        };

        info!("Logged out");
        self.set_status(SessionState::LoggedOut, None, last_error);
    }

    /// Send a request through the pipeline.
    ///
    /// When the access token can no longer be refreshed the local session
    /// is expired before the error is returned.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.send_cancellable(request, &CancellationToken::new())
            .await
    }

    pub async fn send_cancellable(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let sent_with = self.inner.client.store().refresh_token();
        let result = self.inner.client.send_cancellable(request, cancel).await;
        if let Err(ref e) = result
            && e.is_reauthentication_required()
        {
            self.expire_if_current(e, sent_with.as_ref());
        }
        result
    }

    /// Drop the local session without contacting the backend.
    pub fn expire(&self, reason: &Error) {
        warn!(reason = %reason, "Session expired");
        if let Err(e) = self.inner.client.store().clear() {
            warn!(error = %e, "Failed to clear expired session");
        }
        self.set_status(SessionState::LoggedOut, None, Some(reason.to_string()));
    }

    /// Expire only while the store still holds the session whose refresh
    /// token failed. A login that landed in the meantime is kept.
    fn expire_if_current(&self, reason: &Error, failed: Option<&RefreshToken>) {
        let mut cleared = false;
        let outcome = self.inner.client.store().update(&mut |entries| {
            let current = entries.refresh_token();
            if current.is_some() && current.as_ref() != failed {
                return Ok(());
            }
            entries.clear();
            cleared = true;
            Ok(())
        });

        if let Err(e) = outcome {
            warn!(error = %e, "Failed to clear expired session");
        } else if !cleared {
            debug!(reason = %reason, "Ignoring reauthentication failure of a replaced session");
            return;
        }

        warn!(reason = %reason, "Session expired");
        self.set_status(SessionState::LoggedOut, None, Some(reason.to_string()));
    }

    fn read_status(&self) -> Status {
        self.inner
            .status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_status(
        &self,
        state: SessionState,
        user: Option<UserIdentity>,
        last_error: Option<String>,
    ) {
        let mut status = self
            .inner
            .status
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *status = Status {
            state,
            user,
            last_error,
        };
    }
}

impl<B> std::fmt::Debug for SessionManager<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self
            .inner
            .status
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SessionManager")
            .field("state", &status.state)
            .field("user", &status.user)
            .finish()
    }
}
