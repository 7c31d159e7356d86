//! Test specification documents.
//!
//! A document is a YAML sequence of test cases:
//!
//! ```yaml
//! - DESCRIPTION: calls to strcpy are flagged
//!   QUERY: |
//!     // every call site of strcpy
//!     getCallsTo('strcpy')
//!   POSITIVE_TESTS:
//!     - "void f(){ strcpy(a,b); }"
//!   NEGATIVE_TESTS:
//!     - "void f(){ strncpy(a,b,1); }"
//! ```
//!
//! `QUERY` may also be given as a list of fragments, one per line. Snippets
//! must be YAML strings; quote snippets that would otherwise read as numbers
//! or booleans.
//!
//! Entries are decoded one at a time, so a badly shaped entry is reported on
//! its own and the rest of the document stays usable.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::error::HarnessError;

/// Query source as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum QuerySource {
    /// A single, possibly multi-line, string.
    Text(String),
    /// One fragment per line.
    Lines(Vec<String>),
}

impl QuerySource {
    /// Returns the raw query text with fragments joined by newlines.
    pub fn raw(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Lines(lines) => lines.join("\n"),
        }
    }
}

/// One test case entry: a query and the snippets it must and must not match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TestCase {
    /// Free-form explanation of what the query checks.
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
    /// Query to run against the engine.
    #[serde(rename = "QUERY", default)]
    pub query: Option<QuerySource>,
    /// Snippets the query is expected to match.
    #[serde(rename = "POSITIVE_TESTS", default, deserialize_with = "snippet_list")]
    pub positive_tests: Option<Vec<String>>,
    /// Snippets the query is expected not to match.
    #[serde(rename = "NEGATIVE_TESTS", default, deserialize_with = "snippet_list")]
    pub negative_tests: Option<Vec<String>>,
}

/// Accepts only string snippets; numbers, booleans and nested values are
/// rejected instead of being coerced.
fn snippet_list<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<String>>, D::Error> {
    let Some(items) = Option::<Vec<Value>>::deserialize(de)? else {
        return Ok(None);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s),
            other => Err(D::Error::custom(format!(
                "snippet {} is {}, expected a string",
                i + 1,
                yaml_type(&other)
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn yaml_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

impl TestCase {
    /// Positive snippets; empty when absent or null.
    pub fn positives(&self) -> &[String] {
        self.positive_tests.as_deref().unwrap_or_default()
    }

    /// Negative snippets; empty when absent or null.
    pub fn negatives(&self) -> &[String] {
        self.negative_tests.as_deref().unwrap_or_default()
    }

    /// All snippets of this entry, positives first.
    pub fn snippets(&self) -> impl Iterator<Item = &String> {
        self.positives().iter().chain(self.negatives())
    }
}

/// An entry that could not be decoded into a [`TestCase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedEntry {
    /// Decoder message.
    pub detail: String,
}

impl MalformedEntry {
    /// Converts into a [`HarnessError::Parse`] attributed to `path`.
    pub fn to_error(&self, path: &Path) -> HarnessError {
        HarnessError::Parse {
            path: path.to_path_buf(),
            detail: self.detail.clone(),
        }
    }
}

impl fmt::Display for MalformedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

/// A loaded specification file.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    /// File the document was read from.
    pub path: PathBuf,
    /// Entries in file order; malformed entries keep their position.
    pub cases: Vec<Result<TestCase, MalformedEntry>>,
}

impl SpecDocument {
    /// Reads and parses a specification file.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Parse`] if the file cannot be read or is not a
    /// YAML sequence of test cases.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::Parse {
            path: path.to_path_buf(),
            detail: format!("cannot read: {e}"),
        })?;
        Self::parse(path, &text)
    }

    /// Parses specification text attributed to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Parse`] if the text is not YAML or its top
    /// level is not a sequence. Individual entries that fail to decode are
    /// kept as [`MalformedEntry`] values instead.
    pub fn parse(path: &Path, text: &str) -> Result<Self, HarnessError> {
        let parse_error = |detail: String| HarnessError::Parse {
            path: path.to_path_buf(),
            detail,
        };
        let raw = if text.trim().is_empty() {
            Vec::new()
        } else {
            serde_yaml::from_str::<Option<Vec<Value>>>(text)
                .map_err(|e| parse_error(e.to_string()))?
                .unwrap_or_default()
        };
        let cases: Vec<Result<TestCase, MalformedEntry>> = raw
            .into_iter()
            .map(|value| {
                serde_yaml::from_value::<TestCase>(value).map_err(|e| MalformedEntry {
                    detail: e.to_string(),
                })
            })
            .collect();
        tracing::debug!(
            path = %path.display(),
            entries = cases.len(),
            malformed = cases.iter().filter(|c| c.is_err()).count(),
            "parsed specification"
        );
        Ok(Self {
            path: path.to_path_buf(),
            cases,
        })
    }

    /// Well-formed entries, skipping malformed ones.
    pub fn valid_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter().filter_map(|c| c.as_ref().ok())
    }
}
