//! backoffice-core - Authenticated client core for the backoffice admin API.
//!
//! All protected calls flow through an [`AuthedClient`], which reads tokens
//! from a [`CredentialStore`] and refreshes an expired access token once per
//! request. [`SessionManager`] owns the login/logout/restore lifecycle on
//! top of it. The HTTP exchange itself is abstracted by [`Backend`].

pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod pipeline;
pub mod resources;
pub mod session;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

pub use credentials::Credentials;
pub use error::Error;
pub use pipeline::AuthedClient;
pub use resources::{Operation, Resource};
pub use session::{SessionManager, SessionState};
pub use store::{CredentialStore, MemoryStore, SessionEntries};
pub use tokens::{AccessToken, RefreshToken};
pub use traits::Backend;
pub use types::{ApiRequest, ApiResponse, ApiUrl, Method, Pagination, UserIdentity};

/// Cancellation handle accepted by the `send_cancellable` methods.
pub use tokio_util::sync::CancellationToken;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
