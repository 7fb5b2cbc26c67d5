//! Backend transport trait.

use async_trait::async_trait;

use crate::types::{ApiRequest, ApiResponse, ApiUrl};
use crate::Result;

/// A single HTTP exchange with the backend.
///
/// Implementations send exactly one request and report the outcome: a 2xx
/// response as `Ok`, any other status as [`Error::Protocol`], and network
/// failures as [`Error::Transport`]. They never retry and never look at the
/// credential store; authentication is the pipeline's concern.
///
/// [`Error::Protocol`]: crate::Error::Protocol
/// [`Error::Transport`]: crate::Error::Transport
#[async_trait]
pub trait Backend: Send + Sync {
    /// Returns the base URL requests are resolved against.
    fn base_url(&self) -> &ApiUrl;

    /// Send `request`, with `Authorization: Bearer <bearer>` when a bearer
    /// token is given.
    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse>;
}
