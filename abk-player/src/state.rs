//! Shared snapshot state
//!
//! The runner is the single writer. Readers either poll the latest snapshot
//! or subscribe to the broadcast of every snapshot.

use crate::events::StateSnapshot;
use crate::playback::runner::PlaybackStats;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};

/// Snapshot buffer per subscriber before lagging receivers drop old entries
const SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

/// Shared state accessible by the runner and all observers
///
/// Uses RwLock for concurrent read access with rare writes
pub struct SharedState {
    /// Most recently published snapshot
    latest: RwLock<StateSnapshot>,

    /// Snapshot broadcaster
    snapshot_tx: broadcast::Sender<StateSnapshot>,

    /// Playback tasks spawned
    playbacks_started: AtomicU64,

    /// Live playback tasks cancelled through the slot
    playbacks_cancelled: AtomicU64,

    /// Playback intents discarded for a stale generation
    stale_dropped: AtomicU64,
}

impl SharedState {
    pub fn new(initial: StateSnapshot) -> Self {
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            latest: RwLock::new(initial),
            snapshot_tx,
            playbacks_started: AtomicU64::new(0),
            playbacks_cancelled: AtomicU64::new(0),
            stale_dropped: AtomicU64::new(0),
        }
    }

    /// Store and broadcast a snapshot
    pub async fn publish(&self, snapshot: StateSnapshot) {
        *self.latest.write().await = snapshot.clone();
        // Ignore send errors (no receivers is OK)
        let _ = self.snapshot_tx.send(snapshot);
    }

    /// Subscribe to every future snapshot
    pub fn subscribe(&self) -> broadcast::Receiver<StateSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Get the latest snapshot
    pub async fn latest(&self) -> StateSnapshot {
        self.latest.read().await.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.snapshot_tx.receiver_count()
    }

    pub fn record_started(&self) {
        self.playbacks_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.playbacks_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_dropped(&self) {
        self.stale_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn playback_stats(&self) -> PlaybackStats {
        PlaybackStats {
            started: self.playbacks_started.load(Ordering::Relaxed),
            cancelled: self.playbacks_cancelled.load(Ordering::Relaxed),
            stale_dropped: self.stale_dropped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("subscribers", &self.subscriber_count())
            .field("stats", &self.playback_stats())
            .finish()
    }
}
