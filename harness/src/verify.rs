//! Verification runner: executes each entry's query and checks that the
//! returned files cover the positive snippets and none of the negative ones.
//!
//! Results are correlated purely by [`ContentId`]: the engine reports file
//! paths, each path reduces to the identity the snippet was stored under.
//! A problem with one entry never stops the run; it is recorded in that
//! entry's [`EntryReport`] and the next entry is processed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::document::{SpecDocument, TestCase};
use crate::error::{ExecutorError, HarnessError};
use crate::executor::{result_paths, QueryExecutor};
use crate::identity::ContentId;
use crate::query;
use crate::report::{EntryReport, VerificationReport};

/// Identities of every file the engine has ingested, captured once per run.
#[derive(Debug, Clone, Default)]
pub struct KnownIdentities {
    ids: BTreeSet<ContentId>,
}

impl KnownIdentities {
    /// Queries the engine for all ingested files.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or does not return a list.
    pub fn fetch(executor: &impl QueryExecutor) -> Result<Self, ExecutorError> {
        let paths = result_paths(executor.run(query::ALL_FILES_QUERY)?)?;
        let known = Self::from_paths(paths.as_slice());
        let foreign = known.ids.iter().filter(|id| !id.is_well_formed()).count();
        if foreign > 0 {
            tracing::debug!(foreign, "engine holds files not named by a content hash");
        }
        tracing::info!(files = known.len(), "captured known identities");
        Ok(known)
    }

    /// Builds the universe from engine file paths.
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        Self {
            ids: paths
                .iter()
                .map(|p| ContentId::from_path(p.as_ref()))
                .collect(),
        }
    }

    /// Returns true if the engine holds a file for `id`.
    pub fn contains(&self, id: &ContentId) -> bool {
        self.ids.contains(id)
    }

    /// Members of `ids` the engine has never seen.
    pub fn missing(&self, ids: &BTreeSet<ContentId>) -> BTreeSet<ContentId> {
        ids.difference(&self.ids).cloned().collect()
    }

    /// Number of distinct identities.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the engine holds no files.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Observer notified as assertions are decided.
pub trait Progress {
    /// An assertion passed.
    fn assertion_passed(&mut self) {}

    /// An assertion of entry `index` in `file` failed or could not be decided.
    fn entry_failed(&mut self, _file: &Path, _index: usize, _error: &HarnessError) {}

    /// A whole document could not be loaded.
    fn document_failed(&mut self, _error: &HarnessError) {}
}

impl Progress for () {}

/// Identities of a list of snippets.
pub fn identities_of(snippets: &[String]) -> BTreeSet<ContentId> {
    snippets.iter().map(|s| ContentId::of(s)).collect()
}

/// Checks that every expected identity was returned by the query.
///
/// # Errors
///
/// [`HarnessError::Integrity`] if an expected identity is unknown to the
/// engine, otherwise [`HarnessError::PositiveAssertion`] naming the
/// identities missing from `matched`.
pub fn check_positive(
    universe: &KnownIdentities,
    expected: &BTreeSet<ContentId>,
    matched: &BTreeSet<ContentId>,
) -> Result<(), HarnessError> {
    let unknown = universe.missing(expected);
    if !unknown.is_empty() {
        return Err(HarnessError::Integrity { missing: unknown });
    }
    let missing: BTreeSet<ContentId> = expected.difference(matched).cloned().collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::PositiveAssertion { missing })
    }
}

/// Checks that no forbidden identity was returned by the query.
///
/// # Errors
///
/// [`HarnessError::Integrity`] if a forbidden identity is unknown to the
/// engine, otherwise [`HarnessError::NegativeAssertion`] naming the
/// identities present in `matched`.
pub fn check_negative(
    universe: &KnownIdentities,
    forbidden: &BTreeSet<ContentId>,
    matched: &BTreeSet<ContentId>,
) -> Result<(), HarnessError> {
    let unknown = universe.missing(forbidden);
    if !unknown.is_empty() {
        return Err(HarnessError::Integrity { missing: unknown });
    }
    let hit: BTreeSet<ContentId> = forbidden.intersection(matched).cloned().collect();
    if hit.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::NegativeAssertion { matched: hit })
    }
}

/// Runs entries against one executor and a fixed identity universe.
pub struct Verifier<E> {
    executor: E,
    universe: KnownIdentities,
}

impl<E: QueryExecutor> Verifier<E> {
    /// Creates a verifier with an already captured universe.
    pub fn new(executor: E, universe: KnownIdentities) -> Self {
        Self { executor, universe }
    }

    /// Captures the universe from `executor` and creates a verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the universe query fails.
    pub fn connect(executor: E) -> Result<Self, ExecutorError> {
        let universe = KnownIdentities::fetch(&executor)?;
        Ok(Self::new(executor, universe))
    }

    /// The identity universe this verifier checks against.
    pub fn universe(&self) -> &KnownIdentities {
        &self.universe
    }

    /// Runs the entry's query and returns the identities of matched files.
    ///
    /// # Errors
    ///
    /// [`HarnessError::Parse`] if the entry has no query, or
    /// [`HarnessError::Executor`] if the engine fails or returns a non-list.
    pub fn matched_identities(
        &self,
        file: &Path,
        case: &TestCase,
    ) -> Result<BTreeSet<ContentId>, HarnessError> {
        let source = case.query.as_ref().ok_or_else(|| HarnessError::Parse {
            path: file.to_path_buf(),
            detail: "entry has no QUERY".to_string(),
        })?;
        let script = query::compose(&query::normalize(&source.raw()));
        let paths = result_paths(self.executor.run(&script)?)?;
        tracing::debug!(matches = paths.len(), "query answered");
        Ok(paths.iter().map(|p| ContentId::from_path(p)).collect())
    }

    /// Verifies one entry. `index` is the entry's 1-based position.
    ///
    /// Positive and negative assertions are decided independently; a
    /// failing positive check still lets the negative one pass.
    pub fn verify_entry(
        &self,
        file: &Path,
        index: usize,
        case: &TestCase,
        progress: &mut dyn Progress,
    ) -> EntryReport {
        let mut report = EntryReport::new(file, index);
        report.description = case.description.clone();

        let matched = match self.matched_identities(file, case) {
            Ok(matched) => matched,
            Err(err) => {
                record(&mut report, Err(err), progress);
                return report;
            }
        };

        if !case.positives().is_empty() {
            let expected = identities_of(case.positives());
            let outcome = check_positive(&self.universe, &expected, &matched);
            record(&mut report, outcome, progress);
        }
        if !case.negatives().is_empty() {
            let forbidden = identities_of(case.negatives());
            let outcome = check_negative(&self.universe, &forbidden, &matched);
            record(&mut report, outcome, progress);
        }
        report
    }

    /// Verifies every entry of a loaded document. A malformed entry is
    /// recorded as a parse error for its position and the rest still run.
    pub fn verify_document(
        &self,
        document: &SpecDocument,
        progress: &mut dyn Progress,
    ) -> VerificationReport {
        let file = document.path.as_path();
        let mut report = VerificationReport::new();
        for (idx, case) in document.cases.iter().enumerate() {
            let entry = match case {
                Ok(case) => self.verify_entry(file, idx + 1, case, progress),
                Err(bad) => {
                    let mut entry = EntryReport::new(file, idx + 1);
                    record(&mut entry, Err(bad.to_error(file)), progress);
                    entry
                }
            };
            report.push(entry);
        }
        tracing::info!(
            path = %document.path.display(),
            passed = report.passed_count(),
            failed = report.failed_count(),
            errored = report.errored_count(),
            "verified document"
        );
        report
    }

    /// Loads and verifies each file in order. Unreadable documents are
    /// recorded and skipped.
    pub fn verify_files(
        &self,
        files: &[PathBuf],
        progress: &mut dyn Progress,
    ) -> VerificationReport {
        let mut report = VerificationReport::new();
        for path in files {
            match SpecDocument::load(path) {
                Ok(document) => report.extend(self.verify_document(&document, progress)),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable document");
                    progress.document_failed(&err);
                    report.document_errors.push(err);
                }
            }
        }
        report
    }
}

/// Captures the universe once, then verifies every file.
///
/// # Errors
///
/// Returns an error only if the universe cannot be captured; everything
/// after that is reported in the returned [`VerificationReport`].
pub fn verify_files<E: QueryExecutor>(
    executor: E,
    files: &[PathBuf],
    progress: &mut dyn Progress,
) -> Result<VerificationReport, ExecutorError> {
    let verifier = Verifier::connect(executor)?;
    Ok(verifier.verify_files(files, progress))
}

fn record(
    report: &mut EntryReport,
    outcome: Result<(), HarnessError>,
    progress: &mut dyn Progress,
) {
    match outcome {
        Ok(()) => {
            report.passes += 1;
            progress.assertion_passed();
        }
        Err(err) => {
            tracing::debug!(
                file = %report.file.display(),
                entry = report.index,
                error = %err,
                "entry did not pass"
            );
            progress.entry_failed(&report.file, report.index, &err);
            report.errors.push(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::*;
    use crate::error::ErrorKind;
    use crate::report::{format_failure, EntryStatus};
    use crate::tests::fixtures;

    /// In-memory engine: answers the universe query from `files` and every
    /// other query from `answers`, keyed by the normalized query text.
    #[derive(Default)]
    struct FakeEngine {
        files: Vec<String>,
        answers: HashMap<String, Value>,
        scripts: RefCell<Vec<String>>,
    }

    impl FakeEngine {
        fn ingest(mut self, snippets: &[&str]) -> Self {
            self.files.extend(
                snippets
                    .iter()
                    .map(|s| format!("/corpus/{}", ContentId::of(s).file_name())),
            );
            self
        }

        fn answer(mut self, query: &str, matched: &[&str]) -> Self {
            let paths: Vec<String> = matched
                .iter()
                .map(|s| format!("/corpus/{}", ContentId::of(s).file_name()))
                .collect();
            self.answers.insert(query.to_string(), json!(paths));
            self
        }

        fn answer_raw(mut self, query: &str, value: Value) -> Self {
            self.answers.insert(query.to_string(), value);
            self
        }
    }

    impl QueryExecutor for FakeEngine {
        fn run(&self, script: &str) -> Result<Value, ExecutorError> {
            self.scripts.borrow_mut().push(script.to_string());
            if script == query::ALL_FILES_QUERY {
                return Ok(json!(self.files));
            }
            let suffix = format!("\n{}", query::PATH_PROJECTION);
            let normalized = script.strip_suffix(&suffix).unwrap_or(script);
            self.answers
                .get(normalized)
                .cloned()
                .ok_or_else(|| ExecutorError::Status {
                    status: 500,
                    message: format!("unknown query {normalized}"),
                })
        }
    }

    #[derive(Default)]
    struct Recorder {
        stream: String,
        lines: Vec<String>,
    }

    impl Progress for Recorder {
        fn assertion_passed(&mut self) {
            self.stream.push('.');
        }

        fn entry_failed(&mut self, file: &Path, index: usize, error: &HarnessError) {
            self.lines.push(format_failure(file, index, error));
        }

        fn document_failed(&mut self, error: &HarnessError) {
            self.lines.push(format!("Error: {error}"));
        }
    }

    const STRCPY_QUERY: &str = "getCallsTo('strcpy')";

    fn strcpy_doc() -> SpecDocument {
        match SpecDocument::parse(Path::new("strcpy.yaml"), fixtures::STRCPY) {
            Ok(doc) => doc,
            Err(err) => panic!("fixture must parse: {err}"),
        }
    }

    fn strcpy_engine() -> FakeEngine {
        FakeEngine::default().ingest(&[fixtures::STRCPY_POSITIVE, fixtures::STRCPY_NEGATIVE])
    }

    fn verifier(engine: FakeEngine) -> Verifier<FakeEngine> {
        match Verifier::connect(engine) {
            Ok(v) => v,
            Err(err) => panic!("universe must load: {err}"),
        }
    }

    #[test]
    fn matching_query_reports_two_passes() {
        let v = verifier(strcpy_engine().answer(STRCPY_QUERY, &[fixtures::STRCPY_POSITIVE]));
        let mut progress = Recorder::default();

        let report = v.verify_document(&strcpy_doc(), &mut progress);

        assert_eq!(progress.stream, "..");
        assert!(progress.lines.is_empty());
        assert_eq!(report.entries[0].status(), EntryStatus::Passed);
        assert!(report.all_passed());
    }

    #[test]
    fn missing_positive_fails_but_negative_still_passes() {
        let v = verifier(strcpy_engine().answer(STRCPY_QUERY, &[]));
        let mut progress = Recorder::default();

        let report = v.verify_document(&strcpy_doc(), &mut progress);

        let positive = ContentId::of(fixtures::STRCPY_POSITIVE);
        assert_eq!(progress.stream, ".");
        assert_eq!(
            progress.lines,
            vec![format!(
                "Error (strcpy.yaml:entry 1): Positive test failure {{{positive}}}"
            )]
        );
        let entry = &report.entries[0];
        assert_eq!(entry.status(), EntryStatus::Failed);
        assert_eq!(entry.errors[0].kind(), ErrorKind::PositiveAssertion);
        let expected: BTreeSet<ContentId> = [positive].into_iter().collect();
        assert_eq!(entry.errors[0].identities(), Some(&expected));
        assert!(!report.all_passed());
    }

    #[test]
    fn matched_negative_names_exactly_the_intersection() {
        let v = verifier(strcpy_engine().answer(
            STRCPY_QUERY,
            &[fixtures::STRCPY_POSITIVE, fixtures::STRCPY_NEGATIVE],
        ));

        let report = v.verify_document(&strcpy_doc(), &mut ());

        let entry = &report.entries[0];
        assert_eq!(entry.passes, 1);
        assert_eq!(entry.errors.len(), 1);
        assert_eq!(entry.errors[0].kind(), ErrorKind::NegativeAssertion);
        let expected: BTreeSet<ContentId> =
            [ContentId::of(fixtures::STRCPY_NEGATIVE)].into_iter().collect();
        assert_eq!(entry.errors[0].identities(), Some(&expected));
    }

    #[test]
    fn uningested_snippet_is_an_integrity_error_even_when_matched() {
        let engine = FakeEngine::default()
            .ingest(&[fixtures::STRCPY_NEGATIVE])
            .answer(STRCPY_QUERY, &[fixtures::STRCPY_POSITIVE]);
        let v = verifier(engine);

        let report = v.verify_document(&strcpy_doc(), &mut ());

        let entry = &report.entries[0];
        assert_eq!(entry.status(), EntryStatus::Errored);
        assert_eq!(entry.errors[0].kind(), ErrorKind::Integrity);
        let expected: BTreeSet<ContentId> =
            [ContentId::of(fixtures::STRCPY_POSITIVE)].into_iter().collect();
        assert_eq!(entry.errors[0].identities(), Some(&expected));
        assert_eq!(entry.passes, 1);
        assert_eq!(report.errored_count(), 1);
    }

    #[test]
    fn query_is_normalized_and_projected() {
        let v = verifier(strcpy_engine().answer(STRCPY_QUERY, &[fixtures::STRCPY_POSITIVE]));
        v.verify_document(&strcpy_doc(), &mut ());

        let scripts = v.executor.scripts.borrow();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0], query::ALL_FILES_QUERY);
        assert_eq!(scripts[1], query::compose(STRCPY_QUERY));
    }

    #[test]
    fn one_bad_entry_does_not_stop_the_batch() {
        let batch = match SpecDocument::parse(Path::new("batch.yaml"), fixtures::BATCH) {
            Ok(doc) => doc,
            Err(err) => panic!("fixture must parse: {err}"),
        };
        let memcpy = [
            "void g(){ memcpy(d,s,n); }",
            "void h(){ memcpy(d,s,4); }",
        ];
        let engine = FakeEngine::default()
            .ingest(&memcpy)
            .ingest(&["void g(){ memmove(d,s,n); }"])
            .answer_raw("getCallsTo('memcpy')", json!({"unexpected": true}))
            .answer("getCallsTo('free')", &[]);
        let v = verifier(engine);
        let mut progress = Recorder::default();

        let report = v.verify_document(&batch, &mut progress);

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.entries[0].status(), EntryStatus::Errored);
        assert_eq!(report.entries[0].errors[0].kind(), ErrorKind::Executor);
        assert_eq!(report.entries[1].status(), EntryStatus::Passed);
        assert_eq!(report.entries[1].passes, 0);
        assert_eq!(report.entries[2].errors[0].kind(), ErrorKind::Parse);
        assert_eq!(
            progress.lines,
            vec![
                "Error (batch.yaml:entry 1): query returned an object instead of a list of paths"
                    .to_string(),
                "Error (batch.yaml:entry 3): batch.yaml: entry has no QUERY".to_string(),
            ]
        );
    }

    #[test]
    fn malformed_entry_is_reported_and_neighbours_still_run() {
        let doc = match SpecDocument::parse(Path::new("mixed.yaml"), fixtures::MIXED) {
            Ok(doc) => doc,
            Err(err) => panic!("fixture must parse: {err}"),
        };
        let [first, third] = fixtures::MIXED_POSITIVES;
        let engine = FakeEngine::default()
            .ingest(&fixtures::MIXED_POSITIVES)
            .answer("getCallsTo('memcpy')", &[first])
            .answer("getCallsTo('memset')", &[third]);
        let v = verifier(engine);
        let mut progress = Recorder::default();

        let report = v.verify_document(&doc, &mut progress);

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.entries[0].status(), EntryStatus::Passed);
        assert_eq!(report.entries[1].status(), EntryStatus::Errored);
        assert_eq!(report.entries[1].errors[0].kind(), ErrorKind::Parse);
        assert_eq!(report.entries[2].status(), EntryStatus::Passed);
        assert_eq!(progress.stream, "..");
        assert_eq!(progress.lines.len(), 1);
        assert!(
            progress.lines[0].starts_with("Error (mixed.yaml:entry 2): mixed.yaml: "),
            "{}",
            progress.lines[0]
        );
        // Only the two well-formed queries reach the engine.
        assert_eq!(v.executor.scripts.borrow().len(), 3);
    }

    #[test]
    fn engine_errors_are_reported_per_entry() {
        let v = verifier(strcpy_engine());
        let report = v.verify_document(&strcpy_doc(), &mut ());
        let entry = &report.entries[0];
        assert_eq!(entry.passes, 0);
        assert_eq!(entry.errors.len(), 1);
        assert_eq!(entry.errors[0].kind(), ErrorKind::Executor);
    }

    #[test]
    fn unreadable_documents_are_skipped() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let good = dir.path().join("strcpy.yaml");
        std::fs::write(&good, fixtures::STRCPY)?;
        let files = vec![dir.path().join("missing.yaml"), good];
        let engine = strcpy_engine().answer(STRCPY_QUERY, &[fixtures::STRCPY_POSITIVE]);
        let mut progress = Recorder::default();

        let report = verify_files(&engine, &files, &mut progress)?;

        assert_eq!(report.document_errors.len(), 1);
        assert_eq!(report.passed_count(), 1);
        assert_eq!(progress.stream, "..");
        assert_eq!(progress.lines.len(), 1);
        assert!(!report.all_passed());
        assert_eq!(
            engine
                .scripts
                .borrow()
                .iter()
                .filter(|s| s.as_str() == query::ALL_FILES_QUERY)
                .count(),
            1
        );
        Ok(())
    }

    #[test]
    fn universe_failure_aborts_the_run() {
        struct Down;
        impl QueryExecutor for Down {
            fn run(&self, _script: &str) -> Result<Value, ExecutorError> {
                Err(ExecutorError::Transport("connection refused".to_string()))
            }
        }
        assert!(verify_files(Down, &[PathBuf::from("x.yaml")], &mut ()).is_err());
    }

    #[test]
    fn universe_reduces_paths_to_identities() {
        let id = ContentId::of("int z;");
        let known = KnownIdentities::from_paths(&[
            format!("/a/b/{}", id.file_name()),
            format!("rel/{}", id.file_name()),
        ]);
        assert_eq!(known.len(), 1);
        assert!(known.contains(&id));
        assert!(!KnownIdentities::default().contains(&id));
        assert!(KnownIdentities::default().is_empty());
    }

    #[test]
    fn checks_are_pure_set_comparisons() {
        let a = ContentId::of("a");
        let b = ContentId::of("b");
        let universe = KnownIdentities::from_paths(&[a.file_name(), b.file_name()]);
        let both: BTreeSet<ContentId> = [a.clone(), b.clone()].into_iter().collect();
        let only_a: BTreeSet<ContentId> = [a.clone()].into_iter().collect();

        assert!(check_positive(&universe, &only_a, &both).is_ok());
        assert!(check_positive(&universe, &both, &only_a).is_err());
        assert!(check_negative(&universe, &only_a, &BTreeSet::new()).is_ok());
        match check_negative(&universe, &both, &only_a) {
            Err(HarnessError::NegativeAssertion { matched }) => assert_eq!(matched, only_a),
            other => panic!("expected negative failure, got {other:?}"),
        }
    }
}
