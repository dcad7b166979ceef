//! Fixture loading and management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which escape callbacks a case runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// No `%q`/`%Q` callbacks: those directives pass through literally.
    #[default]
    None,
    /// SQL literal and identifier quoting.
    Sql,
}

/// A single fixture test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    /// Case identifier.
    pub name: String,
    /// Behavior area the case covers (e.g. "retype", "passthrough").
    pub section: String,
    /// Format string.
    pub format: String,
    /// Arguments as `kind:value` specs.
    #[serde(default)]
    pub args: Vec<String>,
    /// Expected rendered output.
    pub expected_output: String,
    #[serde(default)]
    pub escapes: EscapeMode,
    /// Stack capacity override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_capacity: Option<usize>,
    /// Growth ceiling override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_ceiling: Option<usize>,
}

/// A collection of fixture cases for one behavior family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    /// Schema version.
    pub version: String,
    /// Family name.
    pub family: String,
    /// UTC timestamp of capture.
    pub captured_at: String,
    /// Individual test cases.
    pub cases: Vec<FixtureCase>,
}

/// Errors from loading fixture files.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no fixture JSON files found in {0}")]
    Empty(PathBuf),
}

impl FixtureSet {
    /// Load fixture set from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize fixture set to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load fixture set from a file path.
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load every `*.json` set in `dir`, sorted by file name. Files that fail
    /// to parse are skipped with a warning.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>, FixtureError> {
        let read_err = |source| FixtureError::Read {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(read_err)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut sets = Vec::new();
        for path in paths {
            match Self::from_file(&path) {
                Ok(set) => sets.push(set),
                Err(err) => log::warn!("skipping fixture: {err}"),
            }
        }
        if sets.is_empty() {
            return Err(FixtureError::Empty(dir.to_path_buf()));
        }
        Ok(sets)
    }
}
