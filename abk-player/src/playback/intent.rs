//! Intents into the reducer and effects out of it
//!
//! Intent names and payloads are the stable API for driving the player from
//! any front-end. They serialize as tagged JSON, e.g.
//! `{"intent":"seek_to","time":12.5}`.

use crate::error::TransportError;
use crate::playback::types::PlaybackSpeed;
use serde::{Deserialize, Serialize};

/// Default skip-ahead distance in seconds
pub const JUMP_FORWARD_SECS: f64 = 10.0;

/// Default skip-back distance in seconds
pub const JUMP_BACKWARD_SECS: f64 = 5.0;

/// A user- or system-originated request to change player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Play button: starts or stops playback of the current track
    PlayPauseTapped,

    /// Start playback unless already playing
    Play,

    /// Stop playback unless already stopped
    Pause,

    /// Slider moved to `time` seconds
    SeekTo { time: f64 },

    /// User grabbed the slider
    BeginSeek,

    /// User released the slider
    EndSeek,

    /// Transport acknowledged the seek numbered `seq`
    ClearSeekSettle { seq: u64 },

    /// Cycle to the next playback speed
    ChangeRateNext,

    /// Select a playback speed directly
    SetRate { rate: PlaybackSpeed },

    SkipNext,
    SkipPrev,

    JumpForward {
        #[serde(default = "default_jump_forward")]
        delta: f64,
    },
    JumpBackward {
        #[serde(default = "default_jump_backward")]
        delta: f64,
    },

    TitleChanged { text: String },

    /// Transport progress: elapsed and total seconds
    TransportTick { progress: f64, duration: f64 },

    /// Transport reached end of media
    TransportFinished { duration: f64 },

    /// Transport stream failed
    TransportFailed { error: TransportError },

    /// Playback task is up and about to open the transport stream
    PlaybackStarted,

    ToggleReaderPanel { enabled: bool },

    DismissAlert,
}

fn default_jump_forward() -> f64 {
    JUMP_FORWARD_SECS
}

fn default_jump_backward() -> f64 {
    JUMP_BACKWARD_SECS
}

impl Intent {
    /// Jump forward by the default distance
    pub fn jump_forward() -> Self {
        Intent::JumpForward {
            delta: JUMP_FORWARD_SECS,
        }
    }

    /// Jump backward by the default distance
    pub fn jump_backward() -> Self {
        Intent::JumpBackward {
            delta: JUMP_BACKWARD_SECS,
        }
    }

    /// Intents produced by the transport or the runner rather than by a user
    pub fn is_transport_feedback(&self) -> bool {
        matches!(
            self,
            Intent::TransportTick { .. }
                | Intent::TransportFinished { .. }
                | Intent::TransportFailed { .. }
                | Intent::PlaybackStarted
                | Intent::ClearSeekSettle { .. }
        )
    }
}

/// Side-effecting operation issued by the reducer and run by the player's runner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Open a transport stream in the playback slot, replacing any prior one
    StartPlayback { url: String, rate: PlaybackSpeed },

    /// Tear down the playback slot
    CancelPlayback,

    /// Move the transport playhead, then report `ClearSeekSettle { seq }`
    SeekTransport { time: f64, seq: u64 },

    /// Change transport speed. Applied in order with seeks, never acknowledged
    SetRateTransport { rate: PlaybackSpeed },
}
