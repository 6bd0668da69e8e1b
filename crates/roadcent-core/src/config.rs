//! Run configuration loaded from TOML.
//!
//! ```toml
//! [input]
//! path = "data/road_graph.csv"
//! max_rows = 1000000
//!
//! [centrality]
//! pivots = 1000
//! exact = false
//! normalized = true
//! weight = "length"   # or "hops"
//! endpoints = false
//! seed = 42           # omit to draw one per run
//!
//! [output]
//! top = 10
//! ```
//!
//! Every field is optional. Resolution order: explicit `--config` path,
//! `./roadcent.toml`, `<user config dir>/roadcent/config.toml`, built-in
//! defaults. CLI flags override whatever the file says.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::edges::DEFAULT_MAX_ROWS;
use crate::error::ErrorCode;
use crate::metrics::betweenness::{BetweennessConfig, DEFAULT_PIVOTS, EdgeWeight};

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "roadcent.toml";

/// Default edge list location, relative to the working directory.
pub const DEFAULT_INPUT_PATH: &str = "data/road_graph.csv";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub centrality: CentralityConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            max_rows: default_max_rows(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CentralityConfig {
    #[serde(default = "default_pivots")]
    pub pivots: usize,
    /// Ignore `pivots` and use every vertex as a source.
    #[serde(default)]
    pub exact: bool,
    #[serde(default = "default_true")]
    pub normalized: bool,
    #[serde(default)]
    pub weight: EdgeWeight,
    #[serde(default)]
    pub endpoints: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            pivots: default_pivots(),
            exact: false,
            normalized: default_true(),
            weight: EdgeWeight::default(),
            endpoints: false,
            seed: None,
        }
    }
}

impl CentralityConfig {
    /// Translate into estimator parameters.
    #[must_use]
    pub fn to_betweenness(&self) -> BetweennessConfig {
        BetweennessConfig {
            pivots: (!self.exact).then_some(self.pivots),
            normalized: self.normalized,
            weight: self.weight,
            endpoints: self.endpoints,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Number of highest-scoring vertices to print.
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { top: default_top() }
    }
}

fn default_true() -> bool {
    true
}

fn default_input_path() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT_PATH)
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_pivots() -> usize {
    DEFAULT_PIVOTS
}

fn default_top() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or is not valid TOML
/// for [`RunConfig`].
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<RunConfig>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the effective config. Returns the file it came from, if any.
///
/// An explicit path must exist; the implicit locations are skipped when
/// absent.
///
/// # Errors
///
/// Returns [`ConfigError`] if the chosen file cannot be read or parsed.
pub fn resolve_config(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<(RunConfig, Option<PathBuf>), ConfigError> {
    let user_file = dirs::config_dir().map(|dir| dir.join("roadcent/config.toml"));
    resolve_config_inner(
        explicit,
        &working_dir.join(PROJECT_CONFIG_FILE),
        user_file.as_deref(),
    )
}

fn resolve_config_inner(
    explicit: Option<&Path>,
    project_file: &Path,
    user_file: Option<&Path>,
) -> Result<(RunConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }

    for candidate in std::iter::once(project_file).chain(user_file) {
        if candidate.exists() {
            debug!(path = %candidate.display(), "using config file");
            return Ok((load_config(candidate)?, Some(candidate.to_path_buf())));
        }
    }

    Ok((RunConfig::default(), None))
}
