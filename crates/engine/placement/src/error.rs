//! Error types for the placement system

use std::path::PathBuf;
use thiserror::Error;

use crate::session::Variant;

/// Errors surfaced by [`crate::ArSession`]
#[derive(Error, Debug)]
pub enum SessionError {
    /// The camera or immersive session could not be acquired
    #[error("failed to start capture: {0}")]
    Acquire(#[from] AcquireError),

    /// A frame arrived while no capture source is running
    #[error("session is not started")]
    NotStarted,

    /// A frame for the other variant was submitted
    #[error("frame for {actual:?} variant submitted to a {expected:?} session")]
    VariantMismatch { expected: Variant, actual: Variant },
}

/// Failure to acquire a camera stream or immersive session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("capture source not found: {0}")]
    NotFound(String),

    #[error("not supported on this device: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

/// The platform declined to create a spatial anchor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("spatial anchors are not supported")]
    Unsupported,

    #[error("anchor creation rejected: {0}")]
    Rejected(String),
}

/// Depth map construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepthMapError {
    #[error("depth map has {actual} values, expected {width}x{height}")]
    SizeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    #[error("depth map must not be empty")]
    Empty,
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("invalid value: {0}")]
    Invalid(String),
}
