//! Query execution against the external analysis engine.
//!
//! The verifier only needs [`QueryExecutor`]. [`GremlinHttpExecutor`] talks
//! to a Neo4j REST endpoint with the Gremlin plugin installed; tests swap in
//! an in-memory double.

use std::path::PathBuf;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::error::ExecutorError;

/// Path of the Gremlin plugin's script endpoint below the REST base URL.
pub const GREMLIN_SCRIPT_PATH: &str = "ext/GremlinPlugin/graphdb/execute_script";

const MAX_MESSAGE_LEN: usize = 300;

/// Runs query scripts and returns the engine's JSON result.
pub trait QueryExecutor {
    /// Executes `script` and returns the decoded result.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutorError`] if the engine cannot be reached, rejects
    /// the script, or answers with something that is not JSON.
    fn run(&self, script: &str) -> Result<Value, ExecutorError>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &E {
    fn run(&self, script: &str) -> Result<Value, ExecutorError> {
        (**self).run(script)
    }
}

/// Extracts the path strings from a query result.
///
/// # Errors
///
/// Returns [`ExecutorError::NotASequence`] unless `value` is a JSON array.
pub fn result_paths(value: Value) -> Result<Vec<String>, ExecutorError> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect()),
        other => Err(ExecutorError::NotASequence {
            found: json_type(&other),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Blocking client for the Gremlin plugin of a Neo4j REST server.
#[derive(Debug)]
pub struct GremlinHttpExecutor {
    client: Client,
    script_url: String,
    prelude: String,
}

impl GremlinHttpExecutor {
    /// Connects to the engine described by `config`.
    ///
    /// Checks once that the base URL answers, then reads the configured
    /// prelude scripts.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built, the base URL does not
    /// answer with a success status, or a prelude file cannot be read.
    pub fn connect(config: &EngineConfig) -> Result<Self, ExecutorError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let base = config.url.trim_end_matches('/');

        let root = client.get(base).header(ACCEPT, "application/json").send()?;
        let status = root.status();
        if !status.is_success() {
            return Err(ExecutorError::Status {
                status: status.as_u16(),
                message: engine_message(&root.text().unwrap_or_default()),
            });
        }
        tracing::debug!(url = base, "connected to engine");

        Ok(Self {
            client,
            script_url: format!("{base}/{GREMLIN_SCRIPT_PATH}"),
            prelude: read_prelude(&config.prelude)?,
        })
    }

    /// URL scripts are posted to.
    pub fn script_url(&self) -> &str {
        &self.script_url
    }
}

impl QueryExecutor for GremlinHttpExecutor {
    fn run(&self, script: &str) -> Result<Value, ExecutorError> {
        let body = json!({ "script": with_prelude(&self.prelude, script) });
        tracing::trace!(script, "running query");

        let response = self
            .client
            .post(&self.script_url)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(ExecutorError::Status {
                status: status.as_u16(),
                message: engine_message(&text),
            });
        }
        serde_json::from_str(&text).map_err(|e| ExecutorError::Decode(e.to_string()))
    }
}

fn read_prelude(paths: &[PathBuf]) -> Result<String, ExecutorError> {
    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(path).map_err(|e| ExecutorError::Prelude {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        parts.push(text);
    }
    Ok(parts.join("\n"))
}

fn with_prelude(prelude: &str, script: &str) -> String {
    if prelude.is_empty() {
        script.to_string()
    } else {
        format!("{prelude}\n{script}")
    }
}

/// Pulls the human-readable message out of a Neo4j error body.
fn engine_message(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if message.len() > MAX_MESSAGE_LEN {
        let cut = (0..=MAX_MESSAGE_LEN)
            .rev()
            .find(|&i| message.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}...", &message[..cut])
    } else {
        message
    }
}
