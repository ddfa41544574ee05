//! Timer-driven transport used by the demo front-end and tests
//!
//! No audio is produced. A playhead advances by `tick_interval × rate` on
//! every tick, which is enough to exercise the player exactly as a real
//! device would: progress events, end of media, decode failures, seeks and
//! speed changes.
//!
//! Like a real player there is a single playhead. Starting a new `play`
//! replaces the loaded media, and a stream whose media was replaced ends on
//! its next tick.

use super::{AudioTransport, ProgressEvent, ProgressStream};
use crate::error::TransportError;
use crate::playback::types::PlaybackSpeed;
use abk_common::{MediaHint, TrackCatalog};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Length and failure point of one simulated media item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedMedia {
    /// Seconds
    pub duration: f64,
    /// Playhead position that triggers a decode error
    pub fail_at: Option<f64>,
}

impl SimulatedMedia {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            fail_at: None,
        }
    }

    pub fn failing_at(duration: f64, fail_at: f64) -> Self {
        Self {
            duration,
            fail_at: Some(fail_at),
        }
    }
}

#[derive(Debug)]
struct LoadedMedia {
    session: u64,
    url: String,
    media: SimulatedMedia,
    position: f64,
}

#[derive(Debug)]
struct Playhead {
    /// Bumped on every `play`; identifies which stream owns `loaded`
    session: u64,
    loaded: Option<LoadedMedia>,
    rate: f32,
    paused: bool,
}

enum Step {
    /// Media was replaced or unloaded
    Gone,
    Paused,
    Progress { position: f64, duration: f64 },
    Finished { duration: f64 },
    Failed { position: f64 },
}

impl Playhead {
    fn advance(&mut self, session: u64, seconds: f64) -> Step {
        let rate = f64::from(self.rate);
        let paused = self.paused;
        let Some(loaded) = self.loaded.as_mut().filter(|l| l.session == session) else {
            return Step::Gone;
        };
        if paused {
            return Step::Paused;
        }

        loaded.position += seconds * rate;

        if let Some(fail_at) = loaded.media.fail_at {
            if loaded.position >= fail_at {
                return Step::Failed {
                    position: loaded.position,
                };
            }
        }
        if loaded.position >= loaded.media.duration {
            loaded.position = loaded.media.duration;
            return Step::Finished {
                duration: loaded.media.duration,
            };
        }
        Step::Progress {
            position: loaded.position,
            duration: loaded.media.duration,
        }
    }
}

fn lock(playhead: &Mutex<Playhead>) -> MutexGuard<'_, Playhead> {
    playhead.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Unloads the media when its stream is dropped
struct Teardown {
    playhead: Arc<Mutex<Playhead>>,
    teardowns: Arc<AtomicUsize>,
    session: u64,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        let mut playhead = lock(&self.playhead);
        if playhead.loaded.as_ref().is_some_and(|l| l.session == self.session) {
            if let Some(loaded) = playhead.loaded.take() {
                debug!("Unloaded {} at {:.2}s", loaded.url, loaded.position);
            }
        }
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated stream {} torn down", self.session);
    }
}

/// Simulated audio transport
#[derive(Debug)]
pub struct SimulatedTransport {
    media: HashMap<String, SimulatedMedia>,
    tick_interval: Duration,
    playhead: Arc<Mutex<Playhead>>,
    teardowns: Arc<AtomicUsize>,
}

impl SimulatedTransport {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            media: HashMap::new(),
            tick_interval,
            playhead: Arc::new(Mutex::new(Playhead {
                session: 0,
                loaded: None,
                rate: 1.0,
                paused: false,
            })),
            teardowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register media for a url
    pub fn with_media(mut self, url: impl Into<String>, media: SimulatedMedia) -> Self {
        self.media.insert(url.into(), media);
        self
    }

    /// Build from a catalog and its manifest hints.
    ///
    /// Tracks without a `duration_secs` hint get `default_duration`.
    pub fn from_catalog(
        catalog: &TrackCatalog,
        hints: &HashMap<String, MediaHint>,
        default_duration: f64,
        tick_interval: Duration,
    ) -> Self {
        let mut transport = Self::new(tick_interval);
        for track in catalog.iter() {
            let hint = hints.get(&track.url).copied().unwrap_or_default();
            let media = SimulatedMedia {
                duration: hint.duration_secs.unwrap_or(default_duration),
                fail_at: hint.fail_at_secs,
            };
            transport.media.insert(track.url.clone(), media);
        }
        info!(
            "Simulated transport ready: {} media items, {}ms ticks",
            transport.media.len(),
            tick_interval.as_millis()
        );
        transport
    }

    /// Playhead position of the loaded media
    pub fn position(&self) -> Option<f64> {
        lock(&self.playhead).loaded.as_ref().map(|l| l.position)
    }

    /// Url of the loaded media
    pub fn loaded_url(&self) -> Option<String> {
        lock(&self.playhead).loaded.as_ref().map(|l| l.url.clone())
    }

    pub fn rate(&self) -> f32 {
        lock(&self.playhead).rate
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.playhead).paused
    }

    /// Number of streams dropped so far
    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioTransport for SimulatedTransport {
    async fn play(&self, url: &str, rate: PlaybackSpeed) -> Result<ProgressStream, TransportError> {
        let media = *self
            .media
            .get(url)
            .ok_or_else(|| TransportError::Decode(format!("unsupported media {}", url)))?;

        let session = {
            let mut playhead = lock(&self.playhead);
            playhead.session += 1;
            playhead.rate = rate.as_f32();
            playhead.paused = false;
            playhead.loaded = Some(LoadedMedia {
                session: playhead.session,
                url: url.to_string(),
                media,
                position: 0.0,
            });
            playhead.session
        };
        debug!("Loaded {} ({:.1}s) as stream {}", url, media.duration, session);

        let teardown = Teardown {
            playhead: Arc::clone(&self.playhead),
            teardowns: Arc::clone(&self.teardowns),
            session,
        };
        let playhead = Arc::clone(&self.playhead);
        let interval = self.tick_interval;
        let url = url.to_string();

        let stream = async_stream::stream! {
            let _teardown = teardown;

            // Duration becomes known as soon as the media loads
            yield Ok(ProgressEvent::tick(0.0, media.duration));

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let step = lock(&playhead).advance(session, interval.as_secs_f64());
                match step {
                    Step::Gone => break,
                    Step::Paused => continue,
                    Step::Progress { position, duration } => {
                        yield Ok(ProgressEvent::tick(position, duration));
                    }
                    Step::Finished { duration } => {
                        yield Ok(ProgressEvent::finished(duration));
                        break;
                    }
                    Step::Failed { position } => {
                        yield Err(TransportError::Decode(format!(
                            "decode failed in {} at {:.2}s",
                            url, position
                        )));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn seek(&self, time: f64) -> Result<bool, TransportError> {
        if !time.is_finite() {
            return Err(TransportError::AckFailed(format!("invalid seek target {}", time)));
        }
        let mut playhead = lock(&self.playhead);
        match playhead.loaded.as_mut() {
            Some(loaded) => {
                loaded.position = time.clamp(0.0, loaded.media.duration);
                debug!("Seek {} to {:.2}s", loaded.url, loaded.position);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_rate(&self, rate: PlaybackSpeed) -> Result<bool, TransportError> {
        lock(&self.playhead).rate = rate.as_f32();
        Ok(true)
    }

    async fn pause(&self) -> Result<bool, TransportError> {
        let mut playhead = lock(&self.playhead);
        if playhead.loaded.is_none() {
            return Ok(false);
        }
        playhead.paused = true;
        Ok(true)
    }

    async fn resume(&self, time: f64) -> Result<bool, TransportError> {
        if !time.is_finite() {
            return Err(TransportError::AckFailed(format!("invalid resume point {}", time)));
        }
        let mut playhead = lock(&self.playhead);
        let Some(loaded) = playhead.loaded.as_mut() else {
            return Ok(false);
        };
        loaded.position = time.clamp(0.0, loaded.media.duration);
        playhead.paused = false;
        Ok(true)
    }
}
