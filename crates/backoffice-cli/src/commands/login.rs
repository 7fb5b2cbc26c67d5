//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use backoffice_core::Credentials;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Admin account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "BACKOFFICE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, global: &GlobalArgs) -> Result<()> {
    let session = session::connect(global)?;
    let credentials = Credentials::new(&args.email, &args.password);

    output::status("Logging in...");

    let user = session
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    match user {
        Some(user) => {
            output::field("Email", user.email().unwrap_or(args.email.as_str()));
            if let Some(role) = user.role() {
                output::field("Role", role);
            }
        }
        None => output::field("Email", &args.email),
    }

    Ok(())
}
