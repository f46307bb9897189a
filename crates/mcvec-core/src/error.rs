//! Error types for the sampling benchmark

use std::io;
use thiserror::Error;

use crate::driver::Phase;

/// Result type alias for sampling operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running the sampler
#[derive(Error, Debug)]
pub enum Error {
    /// The population buffers could not be allocated
    #[error("Out of memory: failed to allocate {requested} particles")]
    OutOfMemory {
        requested: usize,
    },

    /// Configuration value outside its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A driver phase was requested out of order
    #[error("Invalid phase: expected {expected:?}, driver is in {found:?}")]
    InvalidPhase {
        expected: Phase,
        found: Phase,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
