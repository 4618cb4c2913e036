//! # Worldgen Error Types
//!
//! Only wiring and configuration failures are errors. Running out of
//! placement retries, or finding no valid cell, is normal control flow and
//! surfaces as a short list or `None`.

use thiserror::Error;

/// Errors that can occur while configuring or initializing the world.
#[derive(Error, Debug)]
pub enum WorldgenError {
    /// Configuration is structurally unusable (not merely imperfect).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text failed to parse.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A layer was built or queried before the layer it depends on.
    #[error("{layer} is not ready: requires {dependency}")]
    DependencyNotReady {
        /// The layer being initialized.
        layer: &'static str,
        /// The missing upstream layer.
        dependency: &'static str,
    },

    /// A service slot was already filled; the first registration wins.
    #[error("service already registered: {0}")]
    AlreadyRegistered(&'static str),
}

/// Result type for worldgen operations.
pub type WorldgenResult<T> = Result<T, WorldgenError>;
