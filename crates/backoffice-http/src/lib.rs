//! backoffice-http - reqwest transport for the backoffice admin API.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use backoffice_core::{ApiUrl, AuthedClient, Credentials, MemoryStore, Resource, SessionManager};
//! use backoffice_http::HttpBackend;
//!
//! # async fn example() -> Result<(), backoffice_core::Error> {
//! let backend = HttpBackend::new(ApiUrl::new("https://api.example.com")?)?;
//! let client = AuthedClient::new(backend, Arc::new(MemoryStore::new()));
//! let session = SessionManager::restore(client);
//!
//! session.login(&Credentials::new("admin@example.com", "secret")).await?;
//! let users = session.send(&Resource::Users.list(Default::default())?).await?;
//! println!("{}", users.data());
//! # Ok(())
//! # }
//! ```

mod client;

pub use client::{DEFAULT_TIMEOUT, HttpBackend, HttpConfig};
