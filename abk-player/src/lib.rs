//! # Audiobook Key-Point Player Library (abk-player)
//!
//! Playback core for short voice-memo tracks.
//!
//! **Purpose:** Reduce user and transport intents into a single player state,
//! run the resulting effects against an injected [`AudioTransport`], and
//! publish a snapshot after every change.
//!
//! **Architecture:** pure reducer + single-writer runner task + cancellable
//! transport progress stream

pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod playback;
pub mod state;
pub mod transport;
pub mod view;

pub use error::{Error, Result, TransportError};
pub use events::StateSnapshot;
pub use playback::{Intent, Player};
pub use state::SharedState;
pub use transport::AudioTransport;
pub use view::PlayerView;
