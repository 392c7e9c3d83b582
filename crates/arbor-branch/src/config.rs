use arbor_types::DEFAULT_AUTHOR;
use serde::{Deserialize, Serialize};

use crate::error::{BranchError, BranchResult};

/// Tuning knobs for a [`BranchStore`](crate::BranchStore).
///
/// Every field has a default, so a config file only needs the keys it
/// overrides:
///
/// ```
/// use arbor_branch::BranchConfig;
///
/// let config = BranchConfig::from_toml_str("watch_buffer = 8").unwrap();
/// assert_eq!(config.watch_buffer, 8);
/// assert_eq!(config.max_update_retries, 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    /// Compare-and-set attempts per head update or merge.
    pub max_update_retries: usize,
    /// Capacity of the downstream channel of each watch stream.
    pub watch_buffer: usize,
    /// Author recorded when an operation builds its own provenance.
    pub default_author: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            max_update_retries: 16,
            watch_buffer: 64,
            default_author: DEFAULT_AUTHOR.to_string(),
        }
    }
}

impl BranchConfig {
    pub fn from_toml_str(s: &str) -> BranchResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| BranchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> BranchResult<String> {
        toml::to_string(self).map_err(|e| BranchError::Config(e.to_string()))
    }

    pub fn validate(&self) -> BranchResult<()> {
        if self.max_update_retries == 0 {
            return Err(BranchError::Config(
                "max_update_retries must be at least 1".into(),
            ));
        }
        if self.watch_buffer == 0 {
            return Err(BranchError::Config("watch_buffer must be at least 1".into()));
        }
        Ok(())
    }
}
