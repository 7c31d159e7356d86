//! Query test corpus harness.
//!
//! Prepares inputs for a graph-based static analysis engine and checks its
//! answers. Test cases are declared in YAML specification documents; each
//! carries a query plus snippets the query must and must not match.
//!
//! # Phases
//!
//! | Phase | Entry point | Output |
//! |-------|-------------|--------|
//! | Materialize | [`materialize()`] | one `<md5>.c` file per snippet |
//! | (engine ingests the store) | external | analysis graph |
//! | Verify | [`verify_files()`] | [`VerificationReport`] |
//!
//! The two phases share nothing but the content identity: the MD5 of a
//! snippet names its file, and the engine's file paths are reduced back to
//! that name when query results are checked.
//!
//! # Entry Point
//!
//! ```no_run
//! use std::path::PathBuf;
//! use qcorpus_harness::{materialize, verify_files, EngineConfig, GremlinHttpExecutor};
//!
//! let specs = vec![PathBuf::from("demos/strcpy.yaml")];
//! materialize(&PathBuf::from("intermediates"), &specs).expect("materialize");
//!
//! let engine = GremlinHttpExecutor::connect(&EngineConfig::default()).expect("engine");
//! let report = verify_files(engine, &specs, &mut ()).expect("universe");
//! assert!(report.all_passed());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod document;
pub mod error;
pub mod executor;
pub mod identity;
pub mod materialize;
pub mod query;
pub mod report;
pub mod store;
pub mod verify;

#[cfg(test)]
mod tests;

pub use config::{EngineConfig, HarnessConfig};
pub use document::{MalformedEntry, QuerySource, SpecDocument, TestCase};
pub use error::{ErrorKind, ExecutorError, HarnessError};
pub use executor::{GremlinHttpExecutor, QueryExecutor};
pub use identity::ContentId;
pub use materialize::{materialize, MaterializeSummary};
pub use report::{EntryReport, EntryStatus, VerificationReport};
pub use store::ContentStore;
pub use verify::{verify_files, KnownIdentities, Progress, Verifier};
