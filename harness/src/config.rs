//! Harness configuration, optionally loaded from a TOML file.
//!
//! ```toml
//! [engine]
//! url = "http://localhost:7474/db/data"
//! timeout_secs = 30
//! prelude = ["steps/joern.groovy"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default engine endpoint: a local Neo4j REST API.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:7474/db/data";

/// Default per-query timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Query engine connection settings.
    pub engine: EngineConfig,
}

/// Connection settings for the external query engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Base URL of the engine's REST API.
    pub url: String,
    /// Timeout applied to every request, in seconds.
    pub timeout_secs: u64,
    /// Step-library scripts prepended to every query.
    pub prelude: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENGINE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            prelude: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl HarnessConfig {
    /// Reads a configuration file. Relative prelude paths are resolved
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        if let Some(base) = path.parent() {
            for prelude in &mut config.engine.prelude {
                if prelude.is_relative() {
                    *prelude = base.join(&*prelude);
                }
            }
        }
        Ok(config)
    }
}
