//! Error types for scene building and tessellation.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::GeometryHash;

/// Main error type for cadscene operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Adapter returned a mesh whose normals do not line up with its positions
    #[error("Wrong number of normals for shape {hash}: {normals} normals, {positions} positions")]
    NormalsMismatch {
        hash: GeometryHash,
        positions: usize,
        normals: usize,
    },

    /// Geometry adapter failed (tessellation, discretization, transfer format)
    #[error("Geometry adapter error: {0}")]
    Adapter(String),

    /// Shape list mixes primitive kinds (e.g. a solid inside an edge list)
    #[error("Mixed payload: expected only {expected} items, found {found} at index {index}")]
    MixedPayload {
        expected: &'static str,
        found: &'static str,
        index: usize,
    },

    /// Transfer file could not be created or written
    #[error("Transfer file {path}: {source}")]
    Transfer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tessellation worker panicked
    #[error("Tessellation worker failed: {0}")]
    WorkerFailed(String),

    /// Worker pool could not be created
    #[error("Worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Color value could not be parsed
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Render option out of its valid range
    #[error("Invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a geometry adapter error.
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Adapter(msg.into())
    }

    /// Create an invalid option error.
    pub fn invalid_option(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption { name, reason: reason.into() }
    }
}

/// Result type alias for cadscene operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::NormalsMismatch { hash: GeometryHash(42), positions: 3, normals: 2 };
        let msg = e.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("2 normals"));
        assert!(msg.contains("3 positions"));

        let e = Error::MixedPayload { expected: "edge", found: "solid", index: 2 };
        assert!(e.to_string().contains("index 2"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
