//! Error and warning types for the generation engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed descriptor or builder input. Never recovered.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Atlas too small for the requested fragments and padding.
    #[error("Packing overflow: {0}")]
    PackingOverflow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

/// Degenerate geometry recovered locally with a safe default.
///
/// Warnings are logged where they happen and never abort a pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    #[error("zero-length direction at node {node}, bend skipped")]
    ZeroLengthDirection { node: usize },

    #[error("fragment '{name}' has zero area, emitted empty polygon")]
    ZeroAreaFragment { name: String },

    #[error("fragment '{name}' hull is collinear, OBB falls back to AABB")]
    CollinearHull { name: String },

    #[error("sprout map area {index} exceeds the unit square, clamped")]
    MapAreaClamped { index: usize },

    #[error("adaptive root integration found no root branches")]
    MissingRoots,
}

impl Warning {
    /// Log this warning through the `log` facade
    pub fn emit(&self) {
        log::warn!("{}", self);
    }
}
