//! Playback core: state model, intents, reducer and effect runner

pub mod intent;
pub mod reducer;
pub mod runner;
pub mod types;

pub use intent::{Effect, Intent, JUMP_BACKWARD_SECS, JUMP_FORWARD_SECS};
pub use reducer::reduce;
pub use runner::{PlaybackStats, Player};
pub use types::{AlertMessage, CurrentPlayback, Mode, PlaybackSpeed, PlayerState, SeekState};
