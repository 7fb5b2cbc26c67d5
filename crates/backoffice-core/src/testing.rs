//! Scripted in-memory backend for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{Error, ProtocolError, TransportError};
use crate::types::{ApiRequest, ApiResponse, ApiUrl, Method};
use crate::{Backend, Result};

type Handler = Box<dyn Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse> + Send + Sync>;

/// One call observed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
}

/// Backend that answers from per-route handlers and records every call.
pub struct ScriptedBackend {
    base: ApiUrl,
    routes: HashMap<(Method, String), Handler>,
    latency: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            base: ApiUrl::new("http://localhost:3000").unwrap(),
            routes: HashMap::new(),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on<F>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse> + Send + Sync + 'static,
    {
        self.routes
            .insert((method, path.to_string()), Box::new(handler));
        self
    }

    /// Delay every response, to let concurrent calls interleave.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn base_url(&self) -> &ApiUrl {
        &self.base
    }

    async fn execute(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method(),
            path: request.path().to_string(),
            bearer: bearer.map(str::to_string),
        });
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self
            .routes
            .get(&(request.method(), request.path().to_string()))
        {
            Some(handler) => handler(request, bearer),
            None => Err(status(404)),
        }
    }
}

pub fn ok(body: serde_json::Value) -> Result<ApiResponse> {
    Ok(ApiResponse::new(200, body))
}

pub fn status(code: u16) -> Error {
    Error::Protocol(ProtocolError::new(code, None, None))
}

pub fn unreachable_host() -> Error {
    Error::Transport(TransportError::Connection {
        message: "connection refused".to_string(),
    })
}

/// Handler for a protected route that accepts exactly one bearer token.
pub fn protected(accepted: &'static str) -> impl Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse> {
    move |_, bearer| {
        if bearer == Some(accepted) {
            ok(json!({"data": {"ok": true}}))
        } else {
            Err(status(401))
        }
    }
}

/// Handler for the refresh endpoint that hands out `access` for `refresh`.
pub fn refresh_to(
    refresh: &'static str,
    access: &'static str,
) -> impl Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse> {
    move |_, bearer| {
        if bearer == Some(refresh) {
            ok(json!({"data": {"access_token": access}}))
        } else {
            Err(status(401))
        }
    }
}
