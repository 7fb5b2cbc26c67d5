//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs, global: &GlobalArgs) -> Result<()> {
    let session = session::connect(global)?;
    session::require_login(&session)?;

    output::status("Refreshing session...");

    if let Err(e) = session.client().refresh().await {
        if e.is_reauthentication_required() {
            session.expire(&e);
        }
        return Err(e).context("Failed to refresh session");
    }

    output::success("Session refreshed successfully");
    Ok(())
}
