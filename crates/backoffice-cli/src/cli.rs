//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{login, logout, refresh_token, request, resource, whoami};

/// Command-line console for the backoffice admin API.
#[derive(Parser, Debug)]
#[command(name = "backoffice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and storage settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL of the admin API
    #[arg(long, env = "BACKOFFICE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Session file (defaults to the user data directory)
    #[arg(long, env = "BACKOFFICE_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10, global = true)]
    pub timeout_secs: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with an admin account
    Login(login::LoginArgs),

    /// End the session
    Logout(logout::LogoutArgs),

    /// Display the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new access token
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Send an arbitrary request to the API
    Request(request::RequestArgs),

    /// Manage admin resources (users, events, news, ...)
    Resource(resource::ResourceCommand),
}
