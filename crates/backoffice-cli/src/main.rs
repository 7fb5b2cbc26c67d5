//! backoffice - command-line console for the backoffice admin API.
//!
//! A thin consumer of `backoffice-core`: it keeps the admin session in a
//! file store and sends every call through the authenticated pipeline.

mod cli;
mod commands;
mod output;
mod session;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    if let Err(e) = commands::handle(cli.command, &cli.global).await {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays parseable JSON.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
