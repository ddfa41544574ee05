//! Audio transport boundary
//!
//! The player never decodes audio itself. It talks to an [`AudioTransport`]
//! injected at construction: `play` opens a live stream of
//! [`ProgressEvent`]s, the other calls steer the playhead.
//!
//! Dropping a [`ProgressStream`] is the teardown signal. Implementations must
//! stop playback and release resources when their stream is dropped.

use crate::error::TransportError;
use crate::playback::intent::Intent;
use crate::playback::types::PlaybackSpeed;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

pub mod simulated;

pub use simulated::{SimulatedMedia, SimulatedTransport};

/// Progress report from the transport: (finished, elapsed, total)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// End of media reached. The final event of a stream
    pub finished: bool,
    /// Elapsed seconds
    pub progress: f64,
    /// Total seconds
    pub duration: f64,
}

impl ProgressEvent {
    pub fn tick(progress: f64, duration: f64) -> Self {
        Self {
            finished: false,
            progress,
            duration,
        }
    }

    pub fn finished(duration: f64) -> Self {
        Self {
            finished: true,
            progress: duration,
            duration,
        }
    }

    /// The one intent this event feeds back into the reducer
    pub fn into_intent(self) -> Intent {
        if self.finished {
            Intent::TransportFinished {
                duration: self.duration,
            }
        } else {
            Intent::TransportTick {
                progress: self.progress,
                duration: self.duration,
            }
        }
    }
}

/// Live, cancellable stream of progress events
pub type ProgressStream =
    Pin<Box<dyn Stream<Item = Result<ProgressEvent, TransportError>> + Send>>;

/// Audio transport trait - start, steer and stop playback
#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Start playing `url` at `rate`.
    ///
    /// The stream emits at bounded intervals while playing, a final
    /// `finished` event at end of media, then completes. A decode failure is
    /// reported as an `Err` item (or as an `Err` from `play` itself when the
    /// media cannot be opened at all).
    async fn play(&self, url: &str, rate: PlaybackSpeed) -> Result<ProgressStream, TransportError>;

    /// Move the playhead. Idempotent
    async fn seek(&self, time: f64) -> Result<bool, TransportError>;

    /// Change speed without restarting
    async fn set_rate(&self, rate: PlaybackSpeed) -> Result<bool, TransportError>;

    /// Transport-level pause, independent of the player's own play/pause
    async fn pause(&self) -> Result<bool, TransportError>;

    /// Transport-level resume from `time`
    async fn resume(&self, time: f64) -> Result<bool, TransportError>;
}
