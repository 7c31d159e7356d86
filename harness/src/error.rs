//! Error taxonomy for materialization and verification.
//!
//! Every per-entry problem the verifier can report is one of the
//! [`HarnessError`] variants; callers match on [`ErrorKind`] to tell a
//! stale corpus apart from a genuinely failing query.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::identity::ContentId;

/// Discriminant of a [`HarnessError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A specification document or entry could not be read or understood.
    Parse,
    /// A test identity was never ingested by the engine.
    Integrity,
    /// A positive snippet was not matched by the query.
    PositiveAssertion,
    /// A negative snippet was matched by the query.
    NegativeAssertion,
    /// The engine rejected the query or returned an unusable result.
    Executor,
}

/// Failures raised while materializing or verifying a test corpus.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The specification document (or one of its entries) is malformed.
    #[error("{}: {detail}", .path.display())]
    Parse {
        /// Document the problem was found in.
        path: PathBuf,
        /// What went wrong.
        detail: String,
    },

    /// Test identities that the engine has no file for.
    #[error(
        "Unit test for hashes {} are not present in your database, re-create intermediates",
        render_ids(.missing)
    )]
    Integrity {
        /// Identities absent from the known-identity universe.
        missing: BTreeSet<ContentId>,
    },

    /// Positive snippets the query did not return.
    #[error("Positive test failure {}", render_ids(.missing))]
    PositiveAssertion {
        /// Identities expected in the result but absent.
        missing: BTreeSet<ContentId>,
    },

    /// Negative snippets the query returned.
    #[error("Negative test failure {}", render_ids(.matched))]
    NegativeAssertion {
        /// Identities present in the result that should not be.
        matched: BTreeSet<ContentId>,
    },

    /// The engine could not answer the query.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl HarnessError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::PositiveAssertion { .. } => ErrorKind::PositiveAssertion,
            Self::NegativeAssertion { .. } => ErrorKind::NegativeAssertion,
            Self::Executor(_) => ErrorKind::Executor,
        }
    }

    /// Returns true for assertion failures, false for errors that prevented
    /// the assertion from being decided.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::PositiveAssertion | ErrorKind::NegativeAssertion
        )
    }

    /// Identities named by this error, if any.
    pub fn identities(&self) -> Option<&BTreeSet<ContentId>> {
        match self {
            Self::Integrity { missing } | Self::PositiveAssertion { missing } => Some(missing),
            Self::NegativeAssertion { matched } => Some(matched),
            Self::Parse { .. } | Self::Executor(_) => None,
        }
    }
}

/// Failures talking to the external query engine.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The request could not be delivered or timed out.
    #[error("engine request failed: {0}")]
    Transport(String),

    /// The engine answered with a non-success status.
    #[error("engine returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// The response body was not valid JSON.
    #[error("cannot decode engine response: {0}")]
    Decode(String),

    /// The query result was not an enumerable collection.
    #[error("query returned {found} instead of a list of paths")]
    NotASequence {
        /// JSON type that came back.
        found: &'static str,
    },

    /// A step-library prelude file could not be read.
    #[error("cannot read prelude {}: {detail}", .path.display())]
    Prelude {
        /// Prelude file.
        path: PathBuf,
        /// Underlying I/O error.
        detail: String,
    },
}

impl From<reqwest::Error> for ExecutorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

fn render_ids(ids: &BTreeSet<ContentId>) -> String {
    let inner: Vec<&str> = ids.iter().map(ContentId::as_str).collect();
    format!("{{{}}}", inner.join(", "))
}
