//! Generic request command implementation.

use anyhow::{Context, Result};
use clap::Args;

use backoffice_core::{ApiRequest, Method};

use super::body;
use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: Method,

    /// Path relative to the API base URL (e.g. /admin/users)
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", short = 'q', value_parser = body::parse_key_value)]
    pub query: Vec<(String, String)>,

    /// JSON body: inline, @file, or - for stdin
    #[arg(long)]
    pub json: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: RequestArgs, global: &GlobalArgs) -> Result<()> {
    let session = session::connect(global)?;

    let mut request = ApiRequest::new(args.method, &args.path);
    for (key, value) in args.query {
        request = request.with_query(key, value);
    }
    if let Some(source) = &args.json {
        request = request.with_body(body::read_json(source)?);
    }

    let response = session
        .send(&request)
        .await
        .with_context(|| format!("{} {} failed", args.method, request.path()))?;

    output::json(&response.body, args.pretty)
}
