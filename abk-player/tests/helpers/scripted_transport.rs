//! Transport whose streams are driven by the test
//!
//! Every `play` call hands a [`Session`] to the test through a channel. The
//! test pushes progress events into the session; the player receives them
//! through the stream it opened. Dropping the stream marks the session torn
//! down.

use abk_player::playback::PlaybackSpeed;
use abk_player::transport::{AudioTransport, ProgressEvent, ProgressStream};
use abk_player::TransportError;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// A call the player made on the transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Play { url: String, rate: PlaybackSpeed },
    Seek(f64),
    SetRate(PlaybackSpeed),
    Pause,
    Resume(f64),
}

/// One opened stream, as seen from the test
#[derive(Debug)]
pub struct Session {
    pub url: String,
    pub rate: PlaybackSpeed,
    events: mpsc::UnboundedSender<Result<ProgressEvent, TransportError>>,
    torn_down: Arc<AtomicBool>,
}

impl Session {
    /// Returns false once the player dropped the stream
    pub fn tick(&self, progress: f64, duration: f64) -> bool {
        self.events.send(Ok(ProgressEvent::tick(progress, duration))).is_ok()
    }

    pub fn finish(&self, duration: f64) -> bool {
        self.events.send(Ok(ProgressEvent::finished(duration))).is_ok()
    }

    pub fn fail(&self, error: TransportError) -> bool {
        self.events.send(Err(error)).is_ok()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

struct Teardown {
    torn_down: Arc<AtomicBool>,
    teardowns: Arc<AtomicUsize>,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.torn_down.store(true, Ordering::SeqCst);
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct ScriptedTransport {
    sessions_tx: mpsc::UnboundedSender<Session>,
    calls: Mutex<Vec<TransportCall>>,
    teardowns: Arc<AtomicUsize>,
    unplayable: Mutex<HashSet<String>>,
    fail_seeks: AtomicBool,
    first_rate_delay: Mutex<Option<Duration>>,
    applied_rate: Mutex<Option<PlaybackSpeed>>,
    hold_seeks: AtomicBool,
    seek_permits: Semaphore,
}

impl ScriptedTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Session>) {
        let (sessions_tx, sessions_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            sessions_tx,
            calls: Mutex::new(Vec::new()),
            teardowns: Arc::new(AtomicUsize::new(0)),
            unplayable: Mutex::new(HashSet::new()),
            fail_seeks: AtomicBool::new(false),
            first_rate_delay: Mutex::new(None),
            applied_rate: Mutex::new(None),
            hold_seeks: AtomicBool::new(false),
            seek_permits: Semaphore::new(0),
        });
        (transport, sessions_rx)
    }

    /// Make `play(url)` fail with a decode error
    pub fn refuse(&self, url: &str) {
        self.unplayable.lock().unwrap().insert(url.to_string());
    }

    /// Make every seek fail with an ack error
    pub fn fail_seeks(&self) {
        self.fail_seeks.store(true, Ordering::SeqCst);
    }

    /// Make the next `set_rate` call take `delay` before it applies
    pub fn delay_first_rate_change(&self, delay: Duration) {
        *self.first_rate_delay.lock().unwrap() = Some(delay);
    }

    /// Rate set by the last `set_rate` call to complete
    pub fn applied_rate(&self) -> Option<PlaybackSpeed> {
        *self.applied_rate.lock().unwrap()
    }

    /// Block every seek until [`ScriptedTransport::release_seek`] lets it through
    pub fn hold_seeks(&self) {
        self.hold_seeks.store(true, Ordering::SeqCst);
    }

    pub fn release_seek(&self) {
        self.seek_permits.add_permits(1);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Seek(time) => Some(time),
                _ => None,
            })
            .collect()
    }

    pub fn plays(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Play { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioTransport for ScriptedTransport {
    async fn play(
        &self,
        url: &str,
        rate: PlaybackSpeed,
    ) -> Result<ProgressStream, TransportError> {
        self.record(TransportCall::Play {
            url: url.to_string(),
            rate,
        });
        if self.unplayable.lock().unwrap().contains(url) {
            return Err(TransportError::Decode(format!("cannot decode {}", url)));
        }

        let (events, events_rx) = mpsc::unbounded_channel();
        let torn_down = Arc::new(AtomicBool::new(false));
        let guard = Teardown {
            torn_down: Arc::clone(&torn_down),
            teardowns: Arc::clone(&self.teardowns),
        };

        let _ = self.sessions_tx.send(Session {
            url: url.to_string(),
            rate,
            events,
            torn_down,
        });

        // The guard lives exactly as long as the stream
        let stream = UnboundedReceiverStream::new(events_rx).map(move |event| {
            let _guard = &guard;
            event
        });
        Ok(Box::pin(stream))
    }

    async fn seek(&self, time: f64) -> Result<bool, TransportError> {
        self.record(TransportCall::Seek(time));
        if self.hold_seeks.load(Ordering::SeqCst) {
            self.seek_permits.acquire().await.unwrap().forget();
        }
        if self.fail_seeks.load(Ordering::SeqCst) {
            return Err(TransportError::AckFailed("seek rejected".to_string()));
        }
        Ok(true)
    }

    async fn set_rate(&self, rate: PlaybackSpeed) -> Result<bool, TransportError> {
        self.record(TransportCall::SetRate(rate));
        let delay = self.first_rate_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        *self.applied_rate.lock().unwrap() = Some(rate);
        Ok(true)
    }

    async fn pause(&self) -> Result<bool, TransportError> {
        self.record(TransportCall::Pause);
        Ok(true)
    }

    async fn resume(&self, time: f64) -> Result<bool, TransportError> {
        self.record(TransportCall::Resume(time));
        Ok(true)
    }
}
