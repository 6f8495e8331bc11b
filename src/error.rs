/*
 * Error Module
 *
 * Every failure the simulation core can report. Errors are surfaced
 * synchronously to the caller of the violated operation; a neighbourhood with
 * no flockmates is not an error and never shows up here.
 */

use std::path::PathBuf;

use thiserror::Error;

use crate::flock::FlockId;

/// Errors emitted by the flocking core.
#[derive(Debug, Error)]
pub enum FlockError {
    /// A flock, bounds or scheduler setting that cannot be simulated.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A population-mutating call was made while a tick was in flight.
    #[error("concurrency violation: {0} while a tick is in flight")]
    ConcurrencyViolation(&'static str),

    #[error("unknown flock {0}")]
    UnknownFlock(FlockId),

    /// The configuration file could not be read or parsed.
    #[error("failed to load configuration from {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigSource,
    },
}

/// Underlying cause of a configuration load failure.
#[derive(Debug, Error)]
pub enum ConfigSource {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FlockError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FlockError>;
