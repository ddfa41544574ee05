//! Error types for abk-player
//!
//! Transport errors are `Clone + PartialEq` because they travel back into the
//! reducer inside `Intent::TransportFailed`. They never cross into the reducer
//! any other way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by an [`AudioTransport`](crate::transport::AudioTransport)
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum TransportError {
    /// Media could not be opened or decoded. Surfaced to the user as an alert
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// A seek/rate/pause/resume call was not acknowledged. Non-fatal
    #[error("Transport acknowledgement failed: {0}")]
    AckFailed(String),

    /// The transport is not able to serve requests
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Main error type for abk-player
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog or configuration errors from abk-common
    #[error(transparent)]
    Common(#[from] abk_common::Error),

    /// Audio transport errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The player's runner task is gone
    #[error("Player channel closed")]
    ChannelClosed,

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using abk-player Error
pub type Result<T> = std::result::Result<T, Error>;
