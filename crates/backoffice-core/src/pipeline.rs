//! Authenticated request pipeline.
//!
//! [`AuthedClient`] attaches the stored access token to every request and
//! recovers from an expired access token by refreshing it once and replaying
//! the request. A refresh that fails surfaces as
//! [`AuthError::ReauthenticationRequired`]; the pipeline never logs the user
//! out itself.
//!
//! Concurrent refreshes are coalesced: refreshes run one at a time, and a
//! request that was rejected with an access token another request has
//! already replaced replays with the new token instead of refreshing again.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::endpoints::{REFRESH_TOKEN, RefreshResponse};
use crate::error::{AuthError, Error};
use crate::store::CredentialStore;
use crate::tokens::{AccessToken, RefreshToken};
use crate::types::{ApiRequest, ApiResponse};
use crate::{Backend, Result};

/// Where a logical call is in the refresh-retry protocol.
///
/// Advances at most once, so a replayed request that is rejected again is
/// never refreshed a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    Replay,
}

/// Client that authenticates requests from a [`CredentialStore`].
///
/// Cheap to clone; clones share the backend, the store and the refresh gate.
pub struct AuthedClient<B> {
    inner: Arc<ClientInner<B>>,
}

struct ClientInner<B> {
    backend: B,
    store: Arc<dyn CredentialStore>,
    refresh_gate: Mutex<()>,
}

impl<B> Clone for AuthedClient<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> AuthedClient<B> {
    pub fn new(backend: B, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                backend,
                store,
                refresh_gate: Mutex::new(()),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Send a request with the stored credentials.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.send_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Send a request that the caller may cancel.
    ///
    /// Cancelling resolves the call to [`Error::Cancelled`]. A cancelled
    /// call never starts a refresh, even when the backend already answered
    /// 401.
    #[instrument(skip(self, request, cancel), fields(method = %request.method(), path = request.path()))]
    pub async fn send_cancellable(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let mut attempt = Attempt::Initial;

        loop {
            // Read per attempt: a replay must carry the refreshed token.
            let access = self.inner.store.access_token();

            let err = match self.dispatch(request, access.as_ref(), cancel).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.is_unauthorized() || cancel.is_cancelled() {
                return Err(err);
            }
            if attempt == Attempt::Replay {
                debug!("Replayed request rejected again");
                return Err(err);
            }
            if self.inner.store.refresh_token().is_none() {
                debug!("Request rejected and no refresh token is stored");
                return Err(err);
            }

            attempt = Attempt::Replay;
            self.refresh_after(access.as_ref()).await?;
            debug!("Replaying request with refreshed access token");
        }
    }

    /// Force a refresh of the access token.
    pub async fn refresh(&self) -> Result<()> {
        let _gate = self.inner.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access: Option<&AccessToken>,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let bearer = access.map(AccessToken::as_str);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Request cancelled by caller");
                Err(Error::Cancelled)
            }
            result = self.inner.backend.execute(request, bearer) => result,
        }
    }

    /// Refresh unless the token that was rejected has already been replaced.
    async fn refresh_after(&self, rejected: Option<&AccessToken>) -> Result<()> {
        let _gate = self.inner.refresh_gate.lock().await;

        let current = self.inner.store.access_token();
        if current.is_some() && current.as_ref() != rejected {
            debug!("Access token already refreshed by a concurrent request");
            return Ok(());
        }

        self.refresh_locked().await
    }

    /// Call the refresh endpoint directly on the backend. Must hold the gate.
    async fn refresh_locked(&self) -> Result<()> {
        let refresh = self
            .inner
            .store
            .refresh_token()
            .ok_or_else(|| reauthentication("no refresh token stored"))?;

        info!("Refreshing access token");

        let outcome = match self
            .inner
            .backend
            .execute(&ApiRequest::post(REFRESH_TOKEN), Some(refresh.as_str()))
            .await
        {
            Ok(response) => RefreshResponse::parse(&response),
            Err(e) => Err(e),
        };

        let access = match outcome {
            Ok(access) => access,
            Err(e) if self.superseded(&refresh) => {
                debug!(error = %e, "Refresh failed for a replaced session, replaying with the current one");
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return Err(reauthentication(e));
            }
        };

        let written = self
            .inner
            .store
            .set_access_token_for(&refresh, &access)
            .map_err(|e| match e {
                Error::Auth(AuthError::NotAuthenticated) => {
                    reauthentication("session was cleared during refresh")
                }
                other => other,
            })?;

        if !written {
            debug!("Session replaced during refresh, discarding the refreshed token");
            return Ok(());
        }

        debug!("Access token refreshed");
        Ok(())
    }

    /// True when the store now holds a different session than the one
    /// `used` belongs to.
    fn superseded(&self, used: &RefreshToken) -> bool {
        self.inner.store.is_authenticated()
            && self.inner.store.refresh_token().as_ref() != Some(used)
    }
}

fn reauthentication(reason: impl ToString) -> Error {
    AuthError::ReauthenticationRequired {
        reason: reason.to_string(),
    }
    .into()
}

impl<B> std::fmt::Debug for AuthedClient<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthedClient")
            .field("store", &"[REDACTED]")
            .finish()
    }
}
