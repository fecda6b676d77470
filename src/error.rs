//! # Engine Errors
//!
//! Error type for the fallible setup paths of the engine: loading and validating
//! configuration, and spawning the background chunk loader.
//!
//! Streaming itself never fails. Chunks that are absent or not ready yet are
//! expected during normal operation and are handled by skipping work or by
//! returning a default value, so they never show up here.

use std::io;

use thiserror::Error;

/// Errors produced while setting up or driving the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    /// The configuration file is not valid JSON for [`crate::EngineConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but holds values the engine cannot run with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The background loader thread could not be started.
    #[error("failed to spawn chunk loader thread: {0}")]
    ThreadSpawn(#[source] io::Error),

    /// The background loader hung up while batches were still being sent.
    #[error("chunk loader disconnected")]
    LoaderDisconnected,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
