//! Test helper modules for abk-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - ScriptedTransport: streams fed by the test, call recorder, teardown counter
//! - Snapshot waiters with a timeout

#![allow(dead_code)]

pub mod scripted_transport;

pub use scripted_transport::{ScriptedTransport, Session, TransportCall};

use abk_common::{Track, TrackCatalog};
use abk_player::playback::PlayerState;
use abk_player::{Player, StateSnapshot};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

pub const WAIT: Duration = Duration::from_secs(2);

/// Catalog of `n` tracks with urls `memo://0`, `memo://1`, ...
pub fn catalog(n: usize) -> TrackCatalog {
    let tracks = (0..n)
        .map(|i| {
            Track::new(
                format!("kp-{i}"),
                format!("Key point {i}"),
                format!("memo://{i}"),
                "cover",
            )
        })
        .collect();
    TrackCatalog::new(tracks).unwrap()
}

/// Wait until a published snapshot satisfies `predicate`
pub async fn wait_for<F>(player: &Player, what: &str, predicate: F) -> StateSnapshot
where
    F: Fn(&PlayerState) -> bool,
{
    // Subscribe before reading the latest so nothing published in between is missed
    let mut snapshots = player.subscribe();
    let latest = player.snapshot().await;
    if predicate(&latest.state) {
        return latest;
    }

    let found = tokio::time::timeout(WAIT, async {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) if predicate(&snapshot.state) => return snapshot,
                Ok(_) => continue,
                Err(e) => panic!("snapshot stream failed while waiting for {what}: {e}"),
            }
        }
    })
    .await;

    match found {
        Ok(snapshot) => snapshot,
        Err(_) => {
            let latest = player.snapshot().await;
            panic!("timed out waiting for {what}; latest state: {:?}", latest.state)
        }
    }
}

/// Poll `condition` until it holds
pub async fn eventually<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    let polled = tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {what}");
}

/// Next stream the player opened
pub async fn next_session(sessions: &mut mpsc::UnboundedReceiver<Session>) -> Session {
    within("the next play call", sessions.recv())
        .await
        .expect("transport dropped")
}

/// First snapshot on `snapshots` published after `revision`
pub async fn next_after(
    snapshots: &mut broadcast::Receiver<StateSnapshot>,
    revision: u64,
) -> StateSnapshot {
    within("a newer snapshot", async {
        loop {
            let snapshot = snapshots.recv().await.unwrap();
            if snapshot.revision > revision {
                return snapshot;
            }
        }
    })
    .await
}

pub async fn within<T>(what: &str, future: impl Future<Output = T>) -> T {
    match tokio::time::timeout(WAIT, future).await {
        Ok(value) => value,
        Err(_) => panic!("timed out waiting for {what}"),
    }
}
