//! Playback state machine
//!
//! `reduce` is the only place `PlayerState` changes. It is pure and
//! synchronous: it never awaits and never touches the transport. Anything
//! asynchronous is described as an [`Effect`] and handed back to the runner.
//!
//! Composite intents (track skips while playing, jumps) are expanded here by
//! re-applying their constituent intents, so they share exactly the same
//! transitions as their parts.

use crate::playback::intent::{Effect, Intent};
use crate::playback::types::{
    AlertMessage, CurrentPlayback, Mode, PlaybackSpeed, PlayerState, SeekState,
};
use tracing::{debug, trace, warn};

/// Apply one intent, returning the next state and the effects to run
pub fn reduce(mut state: PlayerState, intent: Intent) -> (PlayerState, Vec<Effect>) {
    let mut effects = Vec::new();
    apply(&mut state, intent, &mut effects);
    (state, effects)
}

fn apply(state: &mut PlayerState, intent: Intent, effects: &mut Vec<Effect>) {
    match intent {
        Intent::PlayPauseTapped => play_pause(state, effects),

        Intent::Play => {
            if !state.mode.is_playing() {
                play_pause(state, effects);
            }
        }

        Intent::Pause => {
            if state.mode.is_playing() {
                play_pause(state, effects);
            }
        }

        Intent::SeekTo { time } => {
            update_time(state, time);
            state.current.slide_value = time;
        }

        Intent::BeginSeek => {
            // A new drag supersedes any settle still pending from an earlier seek
            state.current.seek_state = SeekState::Dragging;
        }

        Intent::EndSeek => {
            state.seek_seq += 1;
            effects.push(Effect::SeekTransport {
                time: state.current.slide_value,
                seq: state.seek_seq,
            });
            state.current.seek_state = SeekState::Settling;
        }

        Intent::ClearSeekSettle { seq } => {
            // Acks for superseded seeks must not end the newest settle
            if seq != state.seek_seq {
                trace!("Ignoring ack for seek {} (latest {})", seq, state.seek_seq);
            } else if state.current.seek_state == SeekState::Settling {
                state.current.seek_state = SeekState::Idle;
            }
        }

        Intent::ChangeRateNext => set_rate(state, state.rate.next(), effects),

        Intent::SetRate { rate } => set_rate(state, rate, effects),

        Intent::SkipNext => skip(state, true, effects),

        Intent::SkipPrev => skip(state, false, effects),

        Intent::JumpForward { delta } => {
            let target = state.current.current_time + delta;
            jump(state, target, effects);
        }

        Intent::JumpBackward { delta } => {
            let target = state.current.current_time - delta;
            jump(state, target, effects);
        }

        Intent::TitleChanged { text } => {
            state.current.title = text;
        }

        Intent::TransportTick { progress, duration } => {
            state.current.duration = sanitize_seconds(duration);
            if state.current.seek_state == SeekState::Dragging {
                trace!("Dropping tick at {:.2}s while slider is held", progress);
            } else {
                update_time(state, progress);
            }
        }

        Intent::TransportFinished { duration } => {
            state.current.duration = sanitize_seconds(duration);
            state.mode = Mode::NotPlaying;
            effects.push(Effect::CancelPlayback);
            debug!("Track {} finished", state.current.track_index);
        }

        Intent::TransportFailed { error } => {
            warn!("Playback of {} failed: {}", state.current.url, error);
            state.mode = Mode::NotPlaying;
            effects.push(Effect::CancelPlayback);
            state.pending_alert = Some(AlertMessage::playback_failed());
        }

        Intent::PlaybackStarted => {
            trace!("Playback started for {}", state.current.url);
        }

        Intent::ToggleReaderPanel { enabled } => {
            state.reader_panel_enabled = enabled;
        }

        Intent::DismissAlert => {
            state.pending_alert = None;
        }
    }
}

fn play_pause(state: &mut PlayerState, effects: &mut Vec<Effect>) {
    match state.mode {
        Mode::NotPlaying => {
            if state.catalog.is_empty() {
                debug!("Play ignored: catalog is empty");
                return;
            }
            state.mode = Mode::Playing { progress: 0.0 };
            effects.push(Effect::StartPlayback {
                url: state.current.url.clone(),
                rate: state.rate,
            });
        }
        Mode::Playing { .. } => {
            state.mode = Mode::NotPlaying;
            effects.push(Effect::CancelPlayback);
        }
    }
}

fn set_rate(state: &mut PlayerState, rate: PlaybackSpeed, effects: &mut Vec<Effect>) {
    state.rate = rate;
    effects.push(Effect::SetRateTransport { rate });
}

fn skip(state: &mut PlayerState, forward: bool, effects: &mut Vec<Effect>) {
    let index = state.current.track_index;
    let target = if forward {
        index.checked_add(1)
    } else {
        index.checked_sub(1)
    };

    let Some(next) = target.and_then(|i| CurrentPlayback::for_track(&state.catalog, i)) else {
        debug!("No track {} index {}", if forward { "after" } else { "before" }, index);
        return;
    };

    let was_playing = state.mode.is_playing();
    state.current = next;
    state.mode = Mode::NotPlaying;

    if was_playing {
        effects.push(Effect::CancelPlayback);
        play_pause(state, effects);
    }
}

/// Jumps reuse the slider path so exactly one transport seek is issued
fn jump(state: &mut PlayerState, target: f64, effects: &mut Vec<Effect>) {
    let target = clamp_time(target, state.current.duration);
    apply(state, Intent::BeginSeek, effects);
    apply(state, Intent::SeekTo { time: target }, effects);
    apply(state, Intent::EndSeek, effects);
}

/// Shared by slider moves and transport ticks.
///
/// The first update after a seek is discarded: it may still carry the
/// pre-seek playhead.
fn update_time(state: &mut PlayerState, time: f64) {
    if state.current.seek_state == SeekState::Settling {
        state.current.seek_state = SeekState::Idle;
        return;
    }

    let time = clamp_time(time, state.current.duration);
    state.current.current_time = time;
    if state.mode.is_playing() {
        state.mode = Mode::Playing { progress: time };
    }
}

fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    }
}

fn clamp_time(time: f64, duration: f64) -> f64 {
    sanitize_seconds(time).min(sanitize_seconds(duration))
}
