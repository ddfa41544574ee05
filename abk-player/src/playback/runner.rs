//! Effect runner and playback slot
//!
//! **Responsibilities:**
//! - Serialise every intent through one queue and reduce them one at a time
//! - Publish a snapshot after each reduction
//! - Execute effects: open/cancel the transport stream, seek, change rate
//! - Feed transport progress back as intents
//!
//! Seeks and rate changes go through one control queue drained by a single
//! worker, so the transport sees them in the order the reducer issued them.
//! Each seek is acknowledged with `ClearSeekSettle` carrying its sequence
//! number once the transport call returns.
//!
//! There is one playback slot per player. Starting playback cancels the
//! slot's previous task and waits for it to finish, which drops its transport
//! stream, before the next task is spawned. Every intent a playback task
//! forwards carries its generation; intents from a generation that no longer
//! owns the slot are discarded.

use crate::config::PlayerSettings;
use crate::error::{Error, Result};
use crate::events::{Dispatch, Origin, StateSnapshot};
use crate::playback::intent::{Effect, Intent};
use crate::playback::reducer::reduce;
use crate::playback::types::{PlaybackSpeed, PlayerState};
use crate::state::SharedState;
use crate::transport::AudioTransport;
use abk_common::TrackCatalog;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, trace, warn};

/// Handle to a running player
///
/// Dropping the handle stops the runner. Use [`Player::shutdown`] to also
/// wait for it.
pub struct Player {
    intent_tx: mpsc::UnboundedSender<Dispatch>,
    shared: Arc<SharedState>,
    transport: Arc<dyn AudioTransport>,
    shutdown: CancellationToken,
    _shutdown_guard: DropGuard,
    task: JoinHandle<()>,
    control_task: JoinHandle<()>,
}

impl Player {
    /// Build the initial state and start the runner task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        catalog: TrackCatalog,
        transport: Arc<dyn AudioTransport>,
        settings: &PlayerSettings,
    ) -> Self {
        let track_count = catalog.len();
        let initial = StateSnapshot::initial(PlayerState::new(catalog, settings.initial_rate));
        let state = Arc::clone(&initial.state);
        let shared = Arc::new(SharedState::new(initial));

        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let control_task = tokio::spawn(drive_control(
            Arc::clone(&transport),
            control_rx,
            intent_tx.downgrade(),
            shutdown.clone(),
        ));

        let runner = Runner {
            state,
            revision: 0,
            shared: Arc::clone(&shared),
            transport: Arc::clone(&transport),
            intent_tx: intent_tx.downgrade(),
            control_tx,
            slot: PlaybackSlot::default(),
        };
        let task = tokio::spawn(runner.run(intent_rx, shutdown.clone()));

        info!(
            "Player started ({} tracks, rate {})",
            track_count, settings.initial_rate
        );

        Self {
            intent_tx,
            shared,
            transport,
            _shutdown_guard: shutdown.clone().drop_guard(),
            shutdown,
            task,
            control_task,
        }
    }

    /// Queue an intent for reduction
    pub fn dispatch(&self, intent: Intent) -> Result<()> {
        self.intent_tx
            .send(Dispatch::external(intent))
            .map_err(|_| Error::ChannelClosed)
    }

    /// Subscribe to every future snapshot
    pub fn subscribe(&self) -> broadcast::Receiver<StateSnapshot> {
        self.shared.subscribe()
    }

    /// Latest published snapshot
    pub async fn snapshot(&self) -> StateSnapshot {
        self.shared.latest().await
    }

    /// Playback slot counters
    pub fn stats(&self) -> PlaybackStats {
        self.shared.playback_stats()
    }

    /// The injected transport, for transport-level pause/resume
    pub fn transport(&self) -> &Arc<dyn AudioTransport> {
        &self.transport
    }

    /// Stop the runner, tear down any live playback and wait for it
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Player runner failed: {}", e)))?;
        self.control_task
            .await
            .map_err(|e| Error::Internal(format!("Transport control worker failed: {}", e)))
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("shared", &self.shared)
            .field("stopped", &self.shutdown.is_cancelled())
            .finish()
    }
}

/// Counters kept by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStats {
    /// Playback tasks spawned
    pub started: u64,
    /// Live playback tasks torn down through the slot
    pub cancelled: u64,
    /// Intents discarded because their playback generation was gone
    pub stale_dropped: u64,
}

struct ActivePlayback {
    generation: u64,
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// The single named playback slot
#[derive(Default)]
struct PlaybackSlot {
    last_generation: u64,
    active: Option<ActivePlayback>,
}

impl PlaybackSlot {
    fn is_live(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    /// Cancel the live task and wait until its stream is dropped.
    ///
    /// Returns false when the slot was already empty.
    async fn cancel(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        active.token.cancel();
        if let Err(e) = active.task.await {
            error!("Playback task {} failed: {}", active.generation, e);
        }
        debug!("Playback {} torn down", active.generation);
        true
    }

    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }
}

/// Transport call queued for the control worker
#[derive(Debug, Clone, Copy, PartialEq)]
enum TransportControl {
    Seek { time: f64, seq: u64 },
    SetRate(PlaybackSpeed),
}

struct Runner {
    state: Arc<PlayerState>,
    revision: u64,
    shared: Arc<SharedState>,
    transport: Arc<dyn AudioTransport>,
    /// Weak so a dropped `Player` closes the queue
    intent_tx: mpsc::WeakUnboundedSender<Dispatch>,
    control_tx: mpsc::UnboundedSender<TransportControl>,
    slot: PlaybackSlot,
}

impl Runner {
    async fn run(
        mut self,
        mut intent_rx: mpsc::UnboundedReceiver<Dispatch>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Player shutting down");
                    break;
                }
                dispatch = intent_rx.recv() => match dispatch {
                    Some(dispatch) => self.handle(dispatch).await,
                    None => {
                        debug!("Intent queue closed");
                        break;
                    }
                }
            }
        }

        if self.slot.cancel().await {
            self.shared.record_cancelled();
        }
    }

    async fn handle(&mut self, dispatch: Dispatch) {
        if let Origin::Playback { generation } = dispatch.origin {
            if !self.slot.is_live(generation) {
                trace!("Dropping {:?} from stale playback {}", dispatch.intent, generation);
                self.shared.record_stale_dropped();
                return;
            }
        }

        let (next, effects) = reduce((*self.state).clone(), dispatch.intent);
        self.state = Arc::new(next);
        self.revision += 1;

        self.shared
            .publish(StateSnapshot {
                revision: self.revision,
                timestamp: chrono::Utc::now(),
                state: Arc::clone(&self.state),
            })
            .await;

        for effect in effects {
            self.run_effect(effect).await;
        }
    }

    async fn run_effect(&mut self, effect: Effect) {
        trace!("Running effect {:?}", effect);
        match effect {
            Effect::StartPlayback { url, rate } => self.start_playback(url, rate).await,

            Effect::CancelPlayback => {
                if self.slot.cancel().await {
                    self.shared.record_cancelled();
                }
            }

            Effect::SeekTransport { time, seq } => {
                self.send_control(TransportControl::Seek { time, seq })
            }

            Effect::SetRateTransport { rate } => self.send_control(TransportControl::SetRate(rate)),
        }
    }

    fn send_control(&self, control: TransportControl) {
        if let Err(e) = self.control_tx.send(control) {
            warn!("Transport control worker gone, dropping {:?}", e.0);
        }
    }

    async fn start_playback(&mut self, url: String, rate: PlaybackSpeed) {
        if self.slot.cancel().await {
            self.shared.record_cancelled();
        }

        let Some(intent_tx) = self.intent_tx.upgrade() else {
            return;
        };

        let generation = self.slot.next_generation();
        let token = CancellationToken::new();
        info!("Starting playback {} of {} at {}", generation, url, rate);
        self.shared.record_started();

        let task = tokio::spawn(drive_playback(
            Arc::clone(&self.transport),
            url,
            rate,
            generation,
            token.clone(),
            intent_tx,
        ));
        self.slot.active = Some(ActivePlayback {
            generation,
            token,
            task,
        });
    }
}

/// Body of the control worker: apply queued transport calls one at a time
async fn drive_control(
    transport: Arc<dyn AudioTransport>,
    mut control_rx: mpsc::UnboundedReceiver<TransportControl>,
    intent_tx: mpsc::WeakUnboundedSender<Dispatch>,
    shutdown: CancellationToken,
) {
    loop {
        let control = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            control = control_rx.recv() => match control {
                Some(control) => control,
                None => break,
            },
        };

        match control {
            TransportControl::Seek { time, seq } => {
                match transport.seek(time).await {
                    Ok(true) => debug!("Seek {} to {:.2}s acknowledged", seq, time),
                    Ok(false) => debug!("Seek {} to {:.2}s not applied", seq, time),
                    Err(e) => warn!("Seek {} to {:.2}s failed: {}", seq, time, e),
                }
                let Some(intent_tx) = intent_tx.upgrade() else {
                    break;
                };
                let _ = intent_tx.send(Dispatch::external(Intent::ClearSeekSettle { seq }));
            }
            TransportControl::SetRate(rate) => {
                if let Err(e) = transport.set_rate(rate).await {
                    warn!("Rate change to {} failed: {}", rate, e);
                }
            }
        }
    }
    debug!("Transport control worker stopped");
}

/// Body of a playback task: open the stream and forward each event
async fn drive_playback(
    transport: Arc<dyn AudioTransport>,
    url: String,
    rate: PlaybackSpeed,
    generation: u64,
    token: CancellationToken,
    intent_tx: mpsc::UnboundedSender<Dispatch>,
) {
    let forward = |intent: Intent| -> bool {
        if token.is_cancelled() {
            return false;
        }
        intent_tx
            .send(Dispatch::from_playback(generation, intent))
            .is_ok()
    };

    if !forward(Intent::PlaybackStarted) {
        return;
    }

    let opened = tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("Playback {} cancelled while opening", generation);
            return;
        }
        opened = transport.play(&url, rate) => opened,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(error) => {
            warn!("Could not open {}: {}", url, error);
            forward(Intent::TransportFailed { error });
            return;
        }
    };

    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            item = stream.next() => item,
        };

        match item {
            Some(Ok(event)) => {
                let finished = event.finished;
                if !forward(event.into_intent()) || finished {
                    break;
                }
            }
            Some(Err(error)) => {
                forward(Intent::TransportFailed { error });
                break;
            }
            None => {
                debug!("Playback {} stream completed", generation);
                break;
            }
        }
    }

    drop(stream);
    debug!("Playback {} task finished", generation);
}
