//! Subcommand implementations.

mod body;
pub mod login;
pub mod logout;
pub mod refresh_token;
pub mod request;
pub mod resource;
pub mod whoami;

use anyhow::Result;

use crate::cli::{Commands, GlobalArgs};

pub async fn handle(command: Commands, global: &GlobalArgs) -> Result<()> {
    match command {
        Commands::Login(args) => login::run(args, global).await,
        Commands::Logout(args) => logout::run(args, global).await,
        Commands::Whoami(args) => whoami::run(args, global),
        Commands::RefreshToken(args) => refresh_token::run(args, global).await,
        Commands::Request(args) => request::run(args, global).await,
        Commands::Resource(cmd) => resource::handle(cmd, global).await,
    }
}
