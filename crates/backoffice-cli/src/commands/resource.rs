//! Admin resource subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use backoffice_core::{ApiRequest, Pagination, Resource};

use super::body;
use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct ResourceCommand {
    #[command(subcommand)]
    pub command: ResourceSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ResourceSubcommand {
    /// List a page of items
    List {
        /// Resource name (users, events, news, courses, orders, student-says)
        resource: Resource,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Items per page
        #[arg(long, default_value_t = 10)]
        take: u32,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Fetch a single item
    Get {
        resource: Resource,
        id: String,
        #[arg(long)]
        pretty: bool,
    },

    /// Create an item
    Create {
        resource: Resource,

        /// JSON body: inline, @file, or - for stdin
        #[arg(long)]
        json: String,
    },

    /// Update an item
    Update {
        resource: Resource,
        id: String,

        /// JSON body: inline, @file, or - for stdin
        #[arg(long)]
        json: String,
    },

    /// Delete an item
    Delete { resource: Resource, id: String },
}

pub async fn handle(cmd: ResourceCommand, global: &GlobalArgs) -> Result<()> {
    let (request, pretty) = build(cmd.command)?;

    let session = session::connect(global)?;
    session::require_login(&session)?;

    let response = session
        .send(&request)
        .await
        .with_context(|| format!("{} {} failed", request.method(), request.path()))?;

    if response.data().is_null() {
        output::success(&format!("{} {}", request.method(), request.path()));
        return Ok(());
    }
    output::json(response.data(), pretty)
}

/// Build the request locally so unsupported operations fail before any
/// session is opened.
fn build(command: ResourceSubcommand) -> Result<(ApiRequest, bool)> {
    let built = match command {
        ResourceSubcommand::List {
            resource,
            page,
            take,
            pretty,
        } => (resource.list(Pagination { page, take })?, pretty),
        ResourceSubcommand::Get {
            resource,
            id,
            pretty,
        } => (resource.get(&id)?, pretty),
        ResourceSubcommand::Create { resource, json } => {
            (resource.create(body::read_json(&json)?)?, false)
        }
        ResourceSubcommand::Update { resource, id, json } => {
            (resource.update(&id, body::read_json(&json)?)?, false)
        }
        ResourceSubcommand::Delete { resource, id } => (resource.delete(&id)?, false),
    };
    Ok(built)
}
