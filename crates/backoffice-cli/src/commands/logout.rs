//! Logout command implementation.

use anyhow::{Result, bail};
use clap::Args;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, global: &GlobalArgs) -> Result<()> {
    let session = session::connect(global)?;

    if !session.is_authenticated() {
        output::status("No active session.");
        return Ok(());
    }

    session.logout().await;

    // The backend call is best effort; only a local failure is reported.
    if let Some(err) = session.last_error() {
        bail!("Failed to clear session: {}", err);
    }

    output::success("Logged out");
    Ok(())
}
