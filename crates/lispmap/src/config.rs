// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Map Server configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Registration-policy configuration for a Map Server.
///
/// Both flags default to enabled, the safe posture for a production map
/// server: registers are authenticated and a shorter prefix's secret
/// governs its sub-prefixes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapServerConfig {
    /// Authenticate inbound registers and MAC outbound notifies.
    #[serde(default = "default_true")]
    pub authenticate: bool,

    /// During secret resolution, continue past an entry that exists but
    /// carries no secret. Missing entries are always walked past.
    #[serde(default = "default_true")]
    pub iterate_mask: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MapServerConfig {
    fn default() -> Self {
        Self {
            authenticate: true,
            iterate_mask: true,
        }
    }
}

impl MapServerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration loading errors.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// File could not be read.
    Io(String),
    /// File contents are not a valid configuration.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "config read error: {}", msg),
            Self::Parse(msg) => write!(f, "config parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
