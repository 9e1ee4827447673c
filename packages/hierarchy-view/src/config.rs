//! Hierarchy configuration
//!
//! ```rust,ignore
//! use hierarchy_view::config::HierarchyConfig;
//!
//! let config = HierarchyConfig::from_yaml_str("max_probe_steps: 20\nverify_ranges: false\n")?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{HierarchyError, HierarchyResult};

/// Upper bound for `max_probe_steps` (enough for any `usize`-indexed source)
pub const MAX_PROBE_STEPS_LIMIT: u32 = 64;

/// Default bisection budget per boundary search
pub const DEFAULT_MAX_PROBE_STEPS: u32 = 32;

pub const DEFAULT_ENTITY_ID_FIELD: &str = "id";

/// Tuning for the child range index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Bisection steps allowed per boundary search (1..=64)
    pub max_probe_steps: u32,

    /// Check every row of a found range before caching it
    pub verify_ranges: bool,

    /// Key holding the identity of entity-like parent link values
    pub entity_id_field: String,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_probe_steps: DEFAULT_MAX_PROBE_STEPS,
            verify_ranges: true,
            entity_id_field: DEFAULT_ENTITY_ID_FIELD.to_string(),
        }
    }
}

impl HierarchyConfig {
    /// Validate configuration
    pub fn validate(&self) -> HierarchyResult<()> {
        if self.max_probe_steps < 1 || self.max_probe_steps > MAX_PROBE_STEPS_LIMIT {
            return Err(HierarchyError::configuration(format!(
                "Invalid range for field 'max_probe_steps': {} not in 1..={}",
                self.max_probe_steps, MAX_PROBE_STEPS_LIMIT
            )));
        }

        if self.entity_id_field.trim().is_empty() {
            return Err(HierarchyError::configuration(
                "Field 'entity_id_field' must not be empty",
            ));
        }

        Ok(())
    }

    pub fn with_max_probe_steps(mut self, steps: u32) -> Self {
        self.max_probe_steps = steps;
        self
    }

    pub fn with_verify_ranges(mut self, verify: bool) -> Self {
        self.verify_ranges = verify;
        self
    }

    pub fn with_entity_id_field(mut self, field: impl Into<String>) -> Self {
        self.entity_id_field = field.into();
        self
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> HierarchyResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> HierarchyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> HierarchyResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
