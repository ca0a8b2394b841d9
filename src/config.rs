//! Harness defaults, optionally overridden by a `benchrun.toml` file.
//!
//! Lookup order: an explicit `--config` path, then `./benchrun.toml`, then
//! `<user config dir>/benchrun/config.toml`. A missing file means defaults.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::errors::BenchError;
use crate::footer::FooterKind;

pub const CONFIG_FILE_NAME: &str = "benchrun.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Time value pinned by the final row of the aggregated CSV.
    pub horizon_secs: f64,
    /// Directory holding the locally built algorithm binaries.
    pub bin_dir: PathBuf,
    /// Time-measurement wrapper placed between the timeout tool and the algorithm.
    pub timer: Vec<String>,
    /// Footer shape `timer` prints: `time-p` or `bsd-time`.
    pub footer: FooterKind,
    /// How many trailing log lines a bounded run keeps for classification.
    pub tail_lines: usize,
    /// Environment variable holding the external tool's executable path.
    pub cabean_env: String,
    /// Fixed flags passed to the external tool.
    pub cabean_flags: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            horizon_secs: 3600.0,
            bin_dir: PathBuf::from("./target/release"),
            timer: vec!["time".to_string(), "-p".to_string()],
            footer: FooterKind::TimeP,
            tail_lines: 16,
            cabean_env: "CABEAN_BIN".to_string(),
            cabean_flags: vec!["-compositional".to_string(), "2".to_string()],
        }
    }
}

impl HarnessConfig {
    /// Parse a config file. Fields absent from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    fn from_toml(text: &str, path: &Path) -> Result<Self> {
        let config: HarnessConfig = toml::from_str(text).map_err(|e| BenchError::ConfigParse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        // A footer recognizer needs at least the label, timing, user and sys lines.
        if config.tail_lines < 4 {
            return Err(BenchError::ConfigParse {
                path: path.to_path_buf(),
                detail: format!("tail_lines must be at least 4, got {}", config.tail_lines),
            }
            .into());
        }
        Ok(config)
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist; the implicit locations are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in default_locations() {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Self::from_file(&candidate);
            }
        }
        Ok(Self::default())
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("benchrun").join("config.toml"));
    }
    locations
}
