//! Session wiring for CLI commands.

pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use backoffice_core::{ApiUrl, AuthedClient, SessionManager};
use backoffice_http::{HttpBackend, HttpConfig};

use crate::cli::GlobalArgs;

pub type CliSession = SessionManager<HttpBackend>;

/// Build a session manager from the global flags and restore any stored
/// session.
pub fn connect(args: &GlobalArgs) -> Result<CliSession> {
    let api_url = args
        .api_url
        .as_deref()
        .context("No API URL configured. Pass --api-url or set BACKOFFICE_API_URL.")?;
    let api_url = ApiUrl::new(api_url).context("Invalid API URL")?;

    let config = HttpConfig {
        timeout: Duration::from_secs(args.timeout_secs),
        ..HttpConfig::default()
    };
    let backend = HttpBackend::with_config(api_url, config).context("Failed to build HTTP client")?;

    let store = storage::open_store(args.store.as_deref())?;
    debug!(path = %store.path().display(), "Using session file");

    Ok(SessionManager::restore(AuthedClient::new(
        backend,
        Arc::new(store),
    )))
}

/// Fail unless a session was restored.
pub fn require_login(session: &CliSession) -> Result<()> {
    if !session.is_authenticated() {
        bail!("No active session. Run 'backoffice login' first.");
    }
    Ok(())
}
