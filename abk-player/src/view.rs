//! Render projection of the player state
//!
//! Everything a front-end needs to draw the player screen, derived from a
//! [`PlayerState`] without touching it.

use crate::playback::types::{PlayerState, SeekState};
use abk_common::human_time::format_clock;
use serde::Serialize;
use std::fmt;

pub const PLAY_GLYPH: &str = "▶";
pub const PAUSE_GLYPH: &str = "⏸";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub title: String,
    pub artwork_id: String,
    /// "KEY POINT 2 OF 5", empty when the catalog is empty
    pub position_label: String,
    pub elapsed_label: String,
    pub total_label: String,
    pub slider_value: f64,
    pub slider_max: f64,
    pub rate_title: &'static str,
    pub play_pause_glyph: &'static str,
    pub backward_enabled: bool,
    pub forward_enabled: bool,
    pub reader_panel_enabled: bool,
    pub alert: Option<String>,
}

impl From<&PlayerState> for PlayerView {
    fn from(state: &PlayerState) -> Self {
        let current = &state.current;
        let elapsed = state.mode.progress().unwrap_or(current.current_time);

        // The thumb follows the finger while dragging and the playhead otherwise
        let slider_value = match current.seek_state {
            SeekState::Dragging => current.slide_value,
            SeekState::Idle | SeekState::Settling => current.current_time,
        };

        let position_label = if state.catalog.is_empty() {
            String::new()
        } else {
            format!("KEY POINT {} OF {}", current.track_index + 1, state.catalog.len())
        };

        Self {
            title: current.title.clone(),
            artwork_id: current.artwork_id.clone(),
            position_label,
            elapsed_label: format_clock(elapsed),
            total_label: format_clock(current.duration),
            slider_value,
            slider_max: current.duration,
            rate_title: state.rate.title(),
            play_pause_glyph: if state.mode.is_playing() {
                PAUSE_GLYPH
            } else {
                PLAY_GLYPH
            },
            backward_enabled: current.backward_available,
            forward_enabled: current.forward_available,
            reader_panel_enabled: state.reader_panel_enabled,
            alert: state.pending_alert.as_ref().map(|alert| alert.text().to_string()),
        }
    }
}

impl fmt::Display for PlayerView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} | {} {} / {} | {} | {}{}",
            self.position_label,
            self.title,
            self.play_pause_glyph,
            self.elapsed_label,
            self.total_label,
            self.rate_title,
            if self.backward_enabled { "<<" } else { "--" },
            if self.forward_enabled { " >>" } else { " --" },
        )?;
        if self.reader_panel_enabled {
            write!(f, " | reader")?;
        }
        if let Some(alert) = &self.alert {
            write!(f, " | ALERT: {}", alert)?;
        }
        Ok(())
    }
}
