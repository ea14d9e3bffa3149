//! Error types for the contextfold domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The compaction pipeline
//! itself never surfaces errors — malformed input degrades to returning the
//! data unchanged — so this enum only covers configuration validation and
//! serialization at the crate boundary.

use thiserror::Error;

/// The top-level error type for contextfold operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_message() {
        let err = Error::Config {
            message: "verbatim_threshold must be greater than zero".into(),
        };
        assert!(err.to_string().contains("verbatim_threshold"));
    }
}
