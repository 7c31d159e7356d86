//! `qcorpus-materialize` — Writes every test snippet of the given
//! specification files into a content store, one `<md5>.c` file per snippet.
//!
//! **Usage:**
//! ```
//! qcorpus-materialize <output directory> <spec file>...
//! ```
//!
//! The output directory is created if missing. A malformed specification
//! file aborts the run with a non-zero exit status.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Materialize test snippets into a content store.
#[derive(Parser)]
#[command(
    name = "qcorpus-materialize",
    about = "Write test snippets to disk, named by their MD5 hash"
)]
struct Args {
    /// Directory the snippet files are written to.
    output_dir: PathBuf,

    /// Specification files to read.
    #[arg(required = true)]
    spec_files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();
    tracing::debug!(
        output = %args.output_dir.display(),
        files = args.spec_files.len(),
        "materializing"
    );

    let summary = qcorpus_harness::materialize(&args.output_dir, &args.spec_files)?;

    println!(
        "Materialized {} snippets ({} distinct) from {} entries in {} files into {}",
        summary.snippets,
        summary.identities.len(),
        summary.entries,
        summary.documents,
        args.output_dir.display()
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
