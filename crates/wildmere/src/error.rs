//! # Runtime Error Types

use thiserror::Error;
use wildmere_procedural::WorldgenError;

/// Errors surfaced by the world runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Layer construction, configuration or registration failed.
    #[error(transparent)]
    Worldgen(#[from] WorldgenError),

    /// A regeneration request was rejected; the current world stays.
    #[error("regeneration rejected: {0}")]
    RegenerationRejected(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
