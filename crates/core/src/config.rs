//! Compaction configuration.
//!
//! Passed explicitly to every compaction call — the engine never stores
//! configuration globally, so independent conversations can run with
//! different thresholds concurrently.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Thresholds governing when and how aggressively content is compacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Minimum size in chars a block must reach before compaction is
    /// attempted. Anything smaller is kept verbatim.
    #[serde(default = "default_verbatim_threshold")]
    pub verbatim_threshold: usize,

    /// Maximum chars each section body keeps during section compaction.
    #[serde(default = "default_preview_chars")]
    pub preview_chars_per_section: usize,

    /// Maximum number of sections emitted per block.
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,
}

fn default_verbatim_threshold() -> usize {
    2000
}

fn default_preview_chars() -> usize {
    200
}

fn default_max_sections() -> usize {
    10
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            verbatim_threshold: default_verbatim_threshold(),
            preview_chars_per_section: default_preview_chars(),
            max_sections: default_max_sections(),
        }
    }
}

impl CompactionConfig {
    /// Set the verbatim threshold.
    #[must_use]
    pub fn with_verbatim_threshold(mut self, chars: usize) -> Self {
        self.verbatim_threshold = chars;
        self
    }

    /// Set the per-section preview size.
    #[must_use]
    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars_per_section = chars;
        self
    }

    /// Set the section cap.
    #[must_use]
    pub fn with_max_sections(mut self, sections: usize) -> Self {
        self.max_sections = sections;
        self
    }

    /// Validate the configuration. All three fields must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.verbatim_threshold == 0 {
            return Err(Error::Config {
                message: "verbatim_threshold must be greater than zero".into(),
            });
        }
        if self.preview_chars_per_section == 0 {
            return Err(Error::Config {
                message: "preview_chars_per_section must be greater than zero".into(),
            });
        }
        if self.max_sections == 0 {
            return Err(Error::Config {
                message: "max_sections must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
