//! `qcorpus-verify` — Runs each specification entry's query against the
//! analysis engine and checks the matched files against the entry's
//! positive and negative snippets.
//!
//! **Usage:**
//! ```
//! qcorpus-verify [--config <file>] [--url <engine url>] [--timeout-secs <n>]
//!                [--prelude <script>]... <spec file>...
//! ```
//!
//! Prints one `.` per passing assertion on stdout and one line per failure
//! on stderr. Exits non-zero if any entry failed or errored.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use qcorpus_harness::report::format_failure;
use qcorpus_harness::{GremlinHttpExecutor, HarnessConfig, HarnessError, Progress, Verifier};
use tracing_subscriber::EnvFilter;

/// Verify query results against the test corpus.
#[derive(Parser)]
#[command(
    name = "qcorpus-verify",
    about = "Run query unit tests against the analysis engine"
)]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the engine's REST API.
    #[arg(long, env = "QCORPUS_ENGINE_URL")]
    url: Option<String>,

    /// Per-query timeout in seconds.
    #[arg(long, env = "QCORPUS_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Step-library script prepended to every query (repeatable).
    #[arg(long)]
    prelude: Vec<PathBuf>,

    /// Specification files to verify.
    #[arg(required = true)]
    spec_files: Vec<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };
        if let Some(url) = &self.url {
            config.engine.url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.engine.timeout_secs = secs;
        }
        config.engine.prelude.extend(self.prelude.iter().cloned());
        Ok(config)
    }
}

/// Dotted progress on `out`, failure lines on stderr.
///
/// Once writing a dot fails, no further dots are attempted.
struct StreamProgress<W> {
    out: W,
    closed: bool,
}

impl<W: Write> StreamProgress<W> {
    fn new(out: W) -> Self {
        Self { out, closed: false }
    }
}

impl<W: Write> Progress for StreamProgress<W> {
    fn assertion_passed(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.out.write_all(b".").and_then(|()| self.out.flush()) {
            tracing::debug!(error = %err, "progress output closed");
            self.closed = true;
        }
    }

    fn entry_failed(&mut self, file: &Path, index: usize, error: &HarnessError) {
        eprintln!("{}", format_failure(file, index, error));
    }

    fn document_failed(&mut self, error: &HarnessError) {
        eprintln!("Error: {error}");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = args.resolve_config()?;
    tracing::debug!(?config, "resolved configuration");
    let engine = GremlinHttpExecutor::connect(&config.engine)
        .with_context(|| format!("Failed to connect to engine at {}", config.engine.url))?;

    tracing::debug!(url = engine.script_url(), "posting queries");
    let verifier = Verifier::connect(engine)
        .context("Failed to list the files ingested by the engine")?;
    tracing::info!(known = verifier.universe().len(), "engine ready");

    println!("Running tests:");
    let mut progress = StreamProgress::new(io::stdout());
    let report = verifier.verify_files(&args.spec_files, &mut progress);
    println!();
    println!("{}", report.summary());

    if !report.all_passed() {
        process::exit(1);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
