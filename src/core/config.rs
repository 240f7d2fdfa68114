//! Run configuration
//!
//! Loaded from TOML; every field is optional. Example:
//!
//! ```toml
//! quality_order = "higher"
//! wrap_input = true
//! wrap_output = false
//! record_order = false
//! progress = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::engine::GrowOptions;
use crate::core::error::{Error, Result};
use crate::core::frontier::QualityOrder;

/// Options for one unwrapping run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnwrapConfig {
    /// Direction of the quality scale that is resolved first
    pub quality_order: QualityOrder,
    /// Map the input phase into [0, 2π) before growing
    pub wrap_input: bool,
    /// Map the resolved phase into [0, 2π) afterwards
    pub wrap_output: bool,
    /// Keep the extraction order in the outcome
    pub record_order: bool,
    /// Show a progress bar (CLI only)
    pub progress: bool,
}

impl Default for UnwrapConfig {
    fn default() -> Self {
        Self {
            quality_order: QualityOrder::default(),
            wrap_input: false,
            wrap_output: false,
            record_order: false,
            progress: true,
        }
    }
}

impl UnwrapConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Engine options carried by this config
    pub fn grow_options(&self) -> GrowOptions {
        GrowOptions {
            quality_order: self.quality_order,
            record_order: self.record_order,
        }
    }
}
