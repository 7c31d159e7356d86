//! Verification report types: per-entry outcomes and run aggregation.

use std::path::PathBuf;

use crate::error::{ErrorKind, HarnessError};

/// Outcome of one test case entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Every assertion of the entry passed.
    Passed,
    /// At least one assertion failed; nothing prevented evaluation.
    Failed,
    /// The entry could not be fully evaluated (parse, integrity or engine error).
    Errored,
}

/// Result of verifying a single test case entry.
#[derive(Debug)]
pub struct EntryReport {
    /// Specification file the entry came from.
    pub file: PathBuf,
    /// 1-based position of the entry in its file.
    pub index: usize,
    /// The entry's description, if it has one.
    pub description: Option<String>,
    /// Number of assertions that passed.
    pub passes: usize,
    /// Failures and errors, in evaluation order.
    pub errors: Vec<HarnessError>,
}

impl EntryReport {
    /// Creates an empty report for the entry at `index` of `file`.
    pub fn new(file: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            file: file.into(),
            index,
            description: None,
            passes: 0,
            errors: Vec::new(),
        }
    }

    /// Classifies the entry.
    pub fn status(&self) -> EntryStatus {
        let mut status = EntryStatus::Passed;
        for err in &self.errors {
            match err.kind() {
                ErrorKind::Parse | ErrorKind::Integrity | ErrorKind::Executor => {
                    return EntryStatus::Errored
                }
                ErrorKind::PositiveAssertion | ErrorKind::NegativeAssertion => {
                    status = EntryStatus::Failed
                }
            }
        }
        status
    }

    /// One report line per error: `Error (<file>:entry <n>): <detail>`.
    pub fn failure_lines(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|err| format_failure(&self.file, self.index, err))
            .collect()
    }
}

/// Formats a failure line for the entry at `index` of `file`.
pub fn format_failure(file: &std::path::Path, index: usize, err: &HarnessError) -> String {
    format!("Error ({}:entry {}): {}", file.display(), index, err)
}

/// Aggregated results of a verification run.
#[derive(Debug, Default)]
pub struct VerificationReport {
    /// Every verified entry, in processing order.
    pub entries: Vec<EntryReport>,
    /// Documents that could not be loaded at all.
    pub document_errors: Vec<HarnessError>,
}

impl VerificationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry result.
    pub fn push(&mut self, entry: EntryReport) {
        self.entries.push(entry);
    }

    /// Extends this report with results from another report.
    pub fn extend(&mut self, other: VerificationReport) {
        self.entries.extend(other.entries);
        self.document_errors.extend(other.document_errors);
    }

    fn count(&self, status: EntryStatus) -> usize {
        self.entries.iter().filter(|e| e.status() == status).count()
    }

    /// Entries whose assertions all passed.
    pub fn passed_count(&self) -> usize {
        self.count(EntryStatus::Passed)
    }

    /// Entries with at least one assertion failure.
    pub fn failed_count(&self) -> usize {
        self.count(EntryStatus::Failed)
    }

    /// Entries that could not be evaluated.
    pub fn errored_count(&self) -> usize {
        self.count(EntryStatus::Errored)
    }

    /// Assertions that passed across all entries.
    pub fn assertion_pass_count(&self) -> usize {
        self.entries.iter().map(|e| e.passes).sum()
    }

    /// Returns true if no entry failed or errored and every document loaded.
    pub fn all_passed(&self) -> bool {
        self.document_errors.is_empty() && self.passed_count() == self.entries.len()
    }

    /// All failure lines, documents first, then entries in order.
    pub fn failure_lines(&self) -> Vec<String> {
        self.document_errors
            .iter()
            .map(|err| format!("Error: {err}"))
            .chain(self.entries.iter().flat_map(EntryReport::failure_lines))
            .collect()
    }

    /// One-line count summary.
    pub fn summary(&self) -> String {
        format!(
            "Summary: {} passed, {} failed, {} errored ({} assertions passed, {} unreadable documents)",
            self.passed_count(),
            self.failed_count(),
            self.errored_count(),
            self.assertion_pass_count(),
            self.document_errors.len()
        )
    }
}
