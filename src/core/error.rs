//! Error types for quality-unwrap
//!
//! Precondition failures are reported before any engine state exists. Invariant
//! failures indicate a bookkeeping defect and are never retried.

use thiserror::Error;

/// Main error type for unwrapping operations
#[derive(Debug, Error)]
pub enum Error {
    /// Extent has no dimensions, a zero-length dimension, or overflows `usize`
    #[error("Invalid extent {dims:?}: {reason}")]
    InvalidExtent {
        dims: Vec<usize>,
        reason: &'static str,
    },

    /// Buffer length does not match the extent's sample count
    #[error("Data length mismatch: extent holds {expected} samples, got {actual}")]
    DataLengthMismatch {
        expected: usize,
        actual: usize,
    },

    /// Two grids that must share an extent do not
    #[error("Extent mismatch between {what}: {left:?} vs {right:?}")]
    ExtentMismatch {
        what: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    /// Seed has a different number of coordinates than the grid has dimensions
    #[error("Seed {seed:?} has {} coordinates, grid has {rank} dimensions", .seed.len())]
    SeedRankMismatch { seed: Vec<usize>, rank: usize },

    /// Seed lies outside the grid extent
    #[error("Seed {seed:?} is outside extent {dims:?}")]
    SeedOutOfBounds {
        seed: Vec<usize>,
        dims: Vec<usize>,
    },

    /// Engine bookkeeping reached a state that must be impossible
    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed JSON or TOML document
    #[error("Format error: {0}")]
    Format(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Format(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Format(err.to_string())
    }
}

impl Error {
    /// True for errors caused by the caller's inputs rather than engine state
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::InvalidExtent { .. }
                | Error::DataLengthMismatch { .. }
                | Error::ExtentMismatch { .. }
                | Error::SeedRankMismatch { .. }
                | Error::SeedOutOfBounds { .. }
        )
    }
}

/// Convenience result type for unwrapping operations
pub type Result<T> = std::result::Result<T, Error>;
