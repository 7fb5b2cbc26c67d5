//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use backoffice_core::CredentialStore;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session::storage;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the stored user record as JSON
    #[arg(long)]
    pub json: bool,
}

/// Reads the session file only; no request is made.
pub fn run(args: WhoamiArgs, global: &GlobalArgs) -> Result<()> {
    let store = storage::open_store(global.store.as_deref())?;

    if !store.is_authenticated() {
        anyhow::bail!("No active session. Run 'backoffice login' first.");
    }

    let user = store.user().context("Session has no stored user")?;

    if args.json {
        return output::json(user.as_value(), true);
    }

    output::field("User", &user.to_string());
    if let Some(id) = user.id() {
        output::field("ID", id);
    }
    if let Some(role) = user.role() {
        output::field("Role", role);
    }
    output::field("Session", &store.path().display().to_string());

    Ok(())
}
