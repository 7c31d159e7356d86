//! Content store: a flat directory of snippet files named by identity.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::identity::{ContentId, CONTENT_SUFFIX};

/// Directory holding one `<identity>.c` file per materialized snippet.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Opens the store at `root`, creating the directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create directory: {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for `id`.
    pub fn path_for(&self, id: &ContentId) -> PathBuf {
        self.root.join(id.file_name())
    }

    /// Writes `snippet` verbatim under its identity and returns the identity.
    ///
    /// Writing the same snippet again rewrites identical bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn put(&self, snippet: &str) -> Result<ContentId> {
        let id = ContentId::of(snippet);
        let path = self.path_for(&id);
        fs::write(&path, snippet)
            .with_context(|| format!("Failed to write snippet: {}", path.display()))?;
        tracing::trace!(%id, "stored snippet");
        Ok(id)
    }

    /// Reads back the snippet stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no such entry or it cannot be read.
    pub fn get(&self, id: &ContentId) -> Result<String> {
        let path = self.path_for(id);
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snippet: {}", path.display()))
    }

    /// Returns true if an entry for `id` exists.
    pub fn contains(&self, id: &ContentId) -> bool {
        self.path_for(id).is_file()
    }

    /// Identities of every entry currently in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store directory cannot be listed.
    pub fn identities(&self) -> Result<BTreeSet<ContentId>> {
        let mut ids = BTreeSet::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry
                .with_context(|| format!("Failed to list store: {}", self.root.display()))?;
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_file() && name.ends_with(CONTENT_SUFFIX) {
                ids.insert(ContentId::from_path(&name));
            }
        }
        Ok(ids)
    }
}
