// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Policy knobs for the path walk

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Symlink traversals allowed in a single walk before giving up.
pub const DEFAULT_MAX_SYMLINKS: u32 = 255;

/// Walk policy.
///
/// There is no superuser bypass: uid 0 is evaluated against
/// the mode bits like any other principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    /// Symlinks followed before the walk fails with a loop error
    pub max_symlinks: u32,
    /// Base for relative input paths; the metadata source's current
    /// directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            max_symlinks: DEFAULT_MAX_SYMLINKS,
            base_dir: None,
        }
    }
}

impl AccessPolicy {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let policy: AccessPolicy = toml::from_str(s)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.base_dir {
            Some(dir) if !dir.is_absolute() => Err(ConfigError::RelativeBaseDir(dir.clone())),
            _ => Ok(()),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read policy file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid policy: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("base_dir must be absolute, got {}", .0.display())]
    RelativeBaseDir(PathBuf),
}
