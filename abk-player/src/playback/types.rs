//! Playback types shared across modules
//!
//! Everything here is plain data: the reducer owns all transitions.

use abk_common::{Track, TrackCatalog};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback speed, one of a fixed ordered set that cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub enum PlaybackSpeed {
    #[default]
    X1,
    X1_5,
    X2,
    X2_5,
}

impl PlaybackSpeed {
    /// All speeds in cycle order
    pub const ALL: [PlaybackSpeed; 4] = [
        PlaybackSpeed::X1,
        PlaybackSpeed::X1_5,
        PlaybackSpeed::X2,
        PlaybackSpeed::X2_5,
    ];

    /// Next speed in the cycle, wrapping from 2.5 back to 1.0
    pub fn next(self) -> Self {
        match self {
            PlaybackSpeed::X1 => PlaybackSpeed::X1_5,
            PlaybackSpeed::X1_5 => PlaybackSpeed::X2,
            PlaybackSpeed::X2 => PlaybackSpeed::X2_5,
            PlaybackSpeed::X2_5 => PlaybackSpeed::X1,
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            PlaybackSpeed::X1 => 1.0,
            PlaybackSpeed::X1_5 => 1.5,
            PlaybackSpeed::X2 => 2.0,
            PlaybackSpeed::X2_5 => 2.5,
        }
    }

    /// Exact match against the four supported factors
    pub fn from_factor(factor: f32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|speed| (speed.as_f32() - factor).abs() < f32::EPSILON)
    }

    /// Label for the speed button
    pub fn title(self) -> &'static str {
        match self {
            PlaybackSpeed::X1 => "Speed x1",
            PlaybackSpeed::X1_5 => "Speed x1.5",
            PlaybackSpeed::X2 => "Speed x2",
            PlaybackSpeed::X2_5 => "Speed x2.5",
        }
    }
}

impl TryFrom<f32> for PlaybackSpeed {
    type Error = String;

    fn try_from(factor: f32) -> Result<Self, Self::Error> {
        Self::from_factor(factor).ok_or_else(|| format!("unsupported playback speed {}", factor))
    }
}

impl From<PlaybackSpeed> for f32 {
    fn from(speed: PlaybackSpeed) -> Self {
        speed.as_f32()
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.as_f32())
    }
}

/// Player mode
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Mode {
    #[default]
    NotPlaying,
    Playing {
        /// Seconds elapsed in the current track
        progress: f64,
    },
}

impl Mode {
    pub fn is_playing(&self) -> bool {
        matches!(self, Mode::Playing { .. })
    }

    /// Elapsed seconds while playing, `None` otherwise
    pub fn progress(&self) -> Option<f64> {
        match self {
            Mode::Playing { progress } => Some(*progress),
            Mode::NotPlaying => None,
        }
    }
}

/// Slider seek state
///
/// - `Idle`: transport progress drives the displayed time
/// - `Dragging`: the user holds the slider, transport ticks are dropped
/// - `Settling`: a seek was issued, the next time update is discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekState {
    #[default]
    Idle,
    Dragging,
    Settling,
}

/// Alert waiting to be shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertMessage(String);

impl AlertMessage {
    pub const PLAYBACK_FAILED: &'static str = "Voice memo playback failed.";

    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn playback_failed() -> Self {
        Self::new(Self::PLAYBACK_FAILED)
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The active track and its playback position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPlayback {
    pub track_index: usize,
    pub title: String,
    pub artwork_id: String,
    pub url: String,
    /// Media length in seconds, 0 until the transport reports it
    pub duration: f64,
    pub current_time: f64,
    pub slide_value: f64,
    pub seek_state: SeekState,
    pub backward_available: bool,
    pub forward_available: bool,
}

impl CurrentPlayback {
    /// Fresh playback for `catalog[index]`, `None` when out of range
    pub fn for_track(catalog: &TrackCatalog, index: usize) -> Option<Self> {
        let track = catalog.get(index)?;
        Some(Self::from_track(track, index, catalog.len()))
    }

    fn from_track(track: &Track, index: usize, len: usize) -> Self {
        Self {
            track_index: index,
            title: track.title.clone(),
            artwork_id: track.artwork_id.clone(),
            url: track.url.clone(),
            duration: 0.0,
            current_time: 0.0,
            slide_value: 0.0,
            seek_state: SeekState::Idle,
            backward_available: index > 0,
            forward_available: index + 1 < len,
        }
    }

    /// Placeholder used when the catalog is empty
    pub fn blank() -> Self {
        Self {
            track_index: 0,
            title: String::new(),
            artwork_id: String::new(),
            url: String::new(),
            duration: 0.0,
            current_time: 0.0,
            slide_value: 0.0,
            seek_state: SeekState::Idle,
            backward_available: false,
            forward_available: false,
        }
    }
}

/// Root player state. Mutated only by the reducer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub current: CurrentPlayback,
    pub mode: Mode,
    pub rate: PlaybackSpeed,
    pub reader_panel_enabled: bool,
    pub pending_alert: Option<AlertMessage>,
    /// Sequence number of the last seek sent to the transport. Only the
    /// acknowledgement carrying this number ends a settle
    pub seek_seq: u64,
    pub catalog: TrackCatalog,
}

impl PlayerState {
    /// Initial state: first track current, not playing
    pub fn new(catalog: TrackCatalog, rate: PlaybackSpeed) -> Self {
        let current =
            CurrentPlayback::for_track(&catalog, 0).unwrap_or_else(CurrentPlayback::blank);
        Self {
            current,
            mode: Mode::NotPlaying,
            rate,
            reader_panel_enabled: false,
            pending_alert: None,
            seek_seq: 0,
            catalog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> TrackCatalog {
        let tracks = (0..n)
            .map(|i| {
                Track::new(
                    format!("t{i}"),
                    format!("Track {i}"),
                    format!("t{i}.aac"),
                    format!("art{i}"),
                )
            })
            .collect();
        TrackCatalog::new(tracks).unwrap()
    }

    #[test]
    fn test_speed_cycle_wraps() {
        let mut speed = PlaybackSpeed::default();
        assert_eq!(speed, PlaybackSpeed::X1);
        for expected in [
            PlaybackSpeed::X1_5,
            PlaybackSpeed::X2,
            PlaybackSpeed::X2_5,
            PlaybackSpeed::X1,
        ] {
            speed = speed.next();
            assert_eq!(speed, expected);
        }
    }

    #[test]
    fn test_speed_factors() {
        assert_eq!(PlaybackSpeed::from_factor(1.5), Some(PlaybackSpeed::X1_5));
        assert_eq!(PlaybackSpeed::from_factor(2.5), Some(PlaybackSpeed::X2_5));
        assert_eq!(PlaybackSpeed::from_factor(3.0), None);
        assert_eq!(PlaybackSpeed::X2.as_f32(), 2.0);
        assert_eq!(PlaybackSpeed::X1_5.title(), "Speed x1.5");
        assert_eq!(PlaybackSpeed::X1.to_string(), "x1");
    }

    #[test]
    fn test_speed_serializes_as_number() {
        let json = serde_json::to_string(&PlaybackSpeed::X2_5).unwrap();
        assert_eq!(json, "2.5");
        let parsed: PlaybackSpeed = serde_json::from_str("1.5").unwrap();
        assert_eq!(parsed, PlaybackSpeed::X1_5);
        assert!(serde_json::from_str::<PlaybackSpeed>("0.75").is_err());
    }

    #[test]
    fn test_mode_helpers() {
        assert!(!Mode::NotPlaying.is_playing());
        assert_eq!(Mode::NotPlaying.progress(), None);
        let playing = Mode::Playing { progress: 4.0 };
        assert!(playing.is_playing());
        assert_eq!(playing.progress(), Some(4.0));
    }

    #[test]
    fn test_initial_state_uses_first_track() {
        let state = PlayerState::new(catalog(3), PlaybackSpeed::X1);
        assert_eq!(state.current.track_index, 0);
        assert_eq!(state.current.title, "Track 0");
        assert_eq!(state.current.url, "t0.aac");
        assert!(!state.current.backward_available);
        assert!(state.current.forward_available);
        assert_eq!(state.mode, Mode::NotPlaying);
        assert_eq!(state.pending_alert, None);
        assert_eq!(state.seek_seq, 0);
    }

    #[test]
    fn test_single_track_has_no_navigation() {
        let state = PlayerState::new(catalog(1), PlaybackSpeed::X1);
        assert!(!state.current.backward_available);
        assert!(!state.current.forward_available);
    }

    #[test]
    fn test_empty_catalog_gets_blank_current() {
        let state = PlayerState::new(TrackCatalog::default(), PlaybackSpeed::X2);
        assert_eq!(state.current, CurrentPlayback::blank());
        assert_eq!(state.rate, PlaybackSpeed::X2);
    }

    #[test]
    fn test_for_track_out_of_range() {
        assert!(CurrentPlayback::for_track(&catalog(2), 2).is_none());
        let last = CurrentPlayback::for_track(&catalog(2), 1).unwrap();
        assert!(last.backward_available);
        assert!(!last.forward_available);
    }
}
