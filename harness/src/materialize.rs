//! Corpus materializer: writes every test snippet into the content store.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::document::SpecDocument;
use crate::error::HarnessError;
use crate::identity::ContentId;
use crate::store::ContentStore;

/// Counts produced by a materialization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    /// Specification files processed.
    pub documents: usize,
    /// Test case entries seen across all documents.
    pub entries: usize,
    /// Snippet writes performed, duplicates included.
    pub snippets: usize,
    /// Distinct identities written.
    pub identities: BTreeSet<ContentId>,
}

/// Writes every positive and negative snippet of `spec_files` into a content
/// store rooted at `output_dir`, creating it if needed.
///
/// Files are processed in order. The first document that fails to load, or
/// that holds a malformed entry, aborts the run; snippets written before it
/// stay on disk.
///
/// # Errors
///
/// Returns the document's or entry's parse error, or an I/O error if the
/// store cannot be created or a snippet cannot be written.
pub fn materialize(output_dir: &Path, spec_files: &[PathBuf]) -> Result<MaterializeSummary> {
    let store = ContentStore::create(output_dir)?;
    let mut summary = MaterializeSummary::default();

    for path in spec_files {
        let document = SpecDocument::load(path)?;
        let written = materialize_document(&store, &document, &mut summary)?;
        tracing::info!(
            path = %path.display(),
            entries = document.cases.len(),
            snippets = written,
            "materialized document"
        );
    }

    Ok(summary)
}

/// Writes the snippets of one loaded document and returns how many were written.
///
/// # Errors
///
/// Returns [`HarnessError::Parse`] for the first malformed entry, or an
/// error if a snippet cannot be written.
pub fn materialize_document(
    store: &ContentStore,
    document: &SpecDocument,
    summary: &mut MaterializeSummary,
) -> Result<usize> {
    let mut written = 0usize;
    for (idx, case) in document.cases.iter().enumerate() {
        let case = case.as_ref().map_err(|bad| HarnessError::Parse {
            path: document.path.clone(),
            detail: format!("entry {}: {bad}", idx + 1),
        })?;
        for snippet in case.snippets() {
            summary.identities.insert(store.put(snippet)?);
            written += 1;
        }
    }
    summary.documents += 1;
    summary.entries += document.cases.len();
    summary.snippets += written;
    Ok(written)
}
