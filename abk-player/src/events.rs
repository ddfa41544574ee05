//! Event types for the player
//!
//! # Architecture
//!
//! - **Intent queue** (tokio::mpsc): every intent, from the UI or from an
//!   effect task, is funnelled to the single runner task as a [`Dispatch`]
//! - **Snapshot bus** (tokio::broadcast): one [`StateSnapshot`] per reduction,
//!   fanned out to any number of observers
//! - **Shared state** (Arc<RwLock<T>>): latest snapshot for polling readers

use crate::playback::intent::Intent;
use crate::playback::types::PlayerState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Immutable view of the player after one reduction
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    /// Number of reductions applied so far; 0 is the initial state
    pub revision: u64,
    pub timestamp: DateTime<Utc>,
    pub state: Arc<PlayerState>,
}

impl StateSnapshot {
    pub fn initial(state: PlayerState) -> Self {
        Self {
            revision: 0,
            timestamp: Utc::now(),
            state: Arc::new(state),
        }
    }
}

/// Where a queued intent came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Front-end, or a seek/rate effect acknowledgement
    External,
    /// The playback task of the given generation
    Playback { generation: u64 },
}

/// Internal message on the intent queue (not exposed to observers)
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub origin: Origin,
    pub intent: Intent,
}

impl Dispatch {
    pub fn external(intent: Intent) -> Self {
        Self {
            origin: Origin::External,
            intent,
        }
    }

    pub fn from_playback(generation: u64, intent: Intent) -> Self {
        Self {
            origin: Origin::Playback { generation },
            intent,
        }
    }
}
