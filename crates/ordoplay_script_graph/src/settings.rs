// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution settings, stored as RON.

use serde::{Deserialize, Serialize};

/// Upper bound on `max_data_depth`; larger values are clamped when a run starts
pub const MAX_DATA_DEPTH: usize = 256;

/// Limits and checks applied when running a script graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Maximum number of execution steps in one run
    pub max_steps: usize,
    /// Maximum nesting when evaluating pure data nodes on demand, at most
    /// [`MAX_DATA_DEPTH`]
    pub max_data_depth: usize,
    /// Refuse to step instances compiled before their node last changed.
    ///
    /// When disabled, stale instances are recompiled on the fly instead.
    pub strict_revision_check: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_data_depth: 64,
            strict_revision_check: true,
        }
    }
}

impl ExecutionSettings {
    /// Parse settings from RON; missing fields take their defaults
    pub fn from_ron(s: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(s)?)
    }

    /// Serialize settings to RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }
}

/// Error parsing or serializing settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings text is not valid
    #[error("Invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
}
