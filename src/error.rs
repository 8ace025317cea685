//! Error types for PetalSonic entity audio

use crate::world::OwnerId;
use thiserror::Error;

/// Hard errors surfaced to the host.
///
/// Everything recoverable (unknown proxy ids, dispatch on an empty owner, ...)
/// is logged and reported as `Ok(false)` instead.
#[derive(Error, Debug)]
pub enum EntityAudioError {
    #[error("Exceeded proxy id limits on owner {0}")]
    ProxyIdExhausted(OwnerId),

    #[error("Owner not found: {0}")]
    OwnerNotFound(OwnerId),

    #[error("Owner {0} cannot follow its transform and be a listener at the same time")]
    InvalidOwnerFlags(OwnerId),

    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, EntityAudioError>;
