//! Capture session orchestration.
//!
//! A session runs one pass of: clear → play + sample concurrently → stop both → encode.
//! Its progress is published as a [`SessionState`] on a `watch` channel:
//!
//! ```text
//! Idle --start--> Starting --> Recording --stop / playback done--> Stopping --> Encoding --> Idle
//! ```
//!
//! Only one run may be active at a time; `start` outside `Idle` fails with
//! [`ReelError::Busy`](crate::ReelError::Busy).

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::encode::pipeline::{CaptureArtifact, EncodeJob, EncodingPipeline, VideoEncoder};
use crate::foundation::core::{SAMPLE_PERIOD, StoryboardItem};
use crate::foundation::error::{ReelError, ReelResult};
use crate::playback::PlaybackScheduler;
use crate::sampler::FrameSampler;
use crate::viewport::Viewport;

/// Outcome of the most recent run, carried by [`SessionState::Idle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LastRun {
    /// Nothing has run yet.
    Never,
    /// The last run produced an artifact.
    Succeeded,
    /// The last run failed; see [`CaptureSession::last_error`].
    Failed,
}

/// Lifecycle phase of a [`CaptureSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Ready to start.
    Idle(LastRun),
    /// Starting playback and sampling.
    Starting,
    /// Playback and sampling are running.
    Recording,
    /// Sampling and playback are being shut down.
    Stopping,
    /// Frames are being encoded.
    Encoding,
}

impl SessionState {
    /// Return `true` in any `Idle` state.
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle(_))
    }

    /// Return `true` once recording has ended (frame buffer frozen).
    pub fn is_past_recording(self) -> bool {
        matches!(self, Self::Encoding | Self::Idle(_))
    }

    /// Short lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle(_) => "idle",
            Self::Starting => "starting",
            Self::Recording => "recording",
            Self::Stopping => "stopping",
            Self::Encoding => "encoding",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters from the most recent run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Items announced by playback.
    pub advances: usize,
    /// Frames handed to the encoder.
    pub frames: usize,
    /// Sampler ticks skipped because a snapshot was in flight.
    pub skipped_ticks: u64,
    /// Snapshots that failed and were dropped.
    pub failed_snapshots: u64,
    /// `true` when playback ran to the end rather than being stopped.
    pub completed_playback: bool,
}

struct Shared {
    viewport: Arc<dyn Viewport>,
    pipeline: EncodingPipeline,
    state: watch::Sender<SessionState>,
    last_error: watch::Sender<Option<String>>,
    stats: watch::Sender<SessionStats>,
    stop: Mutex<Option<CancellationToken>>,
    artifact: Mutex<Option<CaptureArtifact>>,
}

impl Shared {
    fn set_state(&self, next: SessionState) {
        let prev = self.state.send_replace(next);
        debug!(from = %prev, to = %next, "session state");
    }
}

/// Orchestrates playback, sampling and encoding for one viewport.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct CaptureSession {
    shared: Arc<Shared>,
}

impl CaptureSession {
    /// Create an idle session that records `viewport` and encodes with `encoder`.
    pub fn new(viewport: Arc<dyn Viewport>, encoder: Arc<dyn VideoEncoder>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle(LastRun::Never));
        let (last_error, _) = watch::channel(None);
        let (stats, _) = watch::channel(SessionStats::default());
        Self {
            shared: Arc::new(Shared {
                viewport,
                pipeline: EncodingPipeline::new(encoder),
                state,
                last_error,
                stats,
                stop: Mutex::new(None),
                artifact: Mutex::new(None),
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Cause of the last failed run; cleared when a new run starts.
    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error.borrow().clone()
    }

    /// Counters of the last finished run.
    pub fn stats(&self) -> SessionStats {
        *self.shared.stats.borrow()
    }

    /// Start a run over `items` (snapshotted now, never re-read).
    ///
    /// Must be called from within a Tokio runtime. Fails with [`ReelError::Busy`] unless the
    /// session is idle; a rejected start changes nothing.
    pub fn start(&self, items: Vec<StoryboardItem>) -> ReelResult<()> {
        let cancel = CancellationToken::new();
        {
            let mut stop = self
                .shared
                .stop
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let claimed = self.shared.state.send_if_modified(|s| {
                if s.is_idle() {
                    *s = SessionState::Starting;
                    true
                } else {
                    false
                }
            });
            if !claimed {
                let current = self.state();
                warn!(state = %current, "capture start rejected");
                return Err(ReelError::busy(format!("cannot start while {current}")));
            }
            *stop = Some(cancel.clone());
        }

        self.shared.last_error.send_replace(None);
        self.shared
            .artifact
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        info!(items = items.len(), "capture session starting");
        tokio::spawn(supervise(Arc::clone(&self.shared), items, cancel));
        Ok(())
    }

    /// Request a manual stop and wait until the frame buffer is frozen.
    ///
    /// Returns `false` when there was no recording to stop. After this returns no further
    /// frame is captured and no further item is highlighted; encoding may still be running.
    pub async fn stop(&self) -> bool {
        let token = {
            let stop = self
                .shared
                .stop
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match self.state() {
                SessionState::Starting | SessionState::Recording => stop.clone(),
                SessionState::Stopping => None,
                current => {
                    debug!(state = %current, "capture stop ignored");
                    return false;
                }
            }
        };

        let issued = match token {
            Some(token) => {
                info!("capture stop requested");
                token.cancel();
                true
            }
            None => false,
        };

        let mut rx = self.subscribe();
        let _ = rx.wait_for(|s| s.is_past_recording()).await;
        issued
    }

    /// Wait for the current run to end and take its artifact.
    ///
    /// A failed run yields an error carrying [`Self::last_error`]. The artifact can be taken
    /// once; a second call reports that it is gone.
    pub async fn finished(&self) -> ReelResult<CaptureArtifact> {
        let mut rx = self.subscribe();
        let state = *rx
            .wait_for(|s| s.is_idle())
            .await
            .map_err(|e| ReelError::Other(anyhow::Error::new(e)))?;

        match state {
            SessionState::Idle(LastRun::Succeeded) => self
                .shared
                .artifact
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .ok_or_else(|| ReelError::validation("artifact was already taken")),
            SessionState::Idle(LastRun::Failed) => Err(ReelError::encode(
                self.last_error()
                    .unwrap_or_else(|| "capture failed".to_string()),
            )),
            _ => Err(ReelError::validation("no capture has been run")),
        }
    }
}

/// Run a session and turn a panic anywhere inside it into a failed run.
async fn supervise(shared: Arc<Shared>, items: Vec<StoryboardItem>, cancel: CancellationToken) {
    let run = tokio::spawn(run_session(Arc::clone(&shared), items, cancel));
    if let Err(e) = run.await {
        shared
            .stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        fail(
            &shared,
            SessionStats::default(),
            ReelError::encode(format!("capture task failed: {e}")),
        );
    }
}

async fn run_session(shared: Arc<Shared>, items: Vec<StoryboardItem>, cancel: CancellationToken) {
    let mut playback = PlaybackScheduler::new(Arc::clone(&shared.viewport));
    let mut sampler = FrameSampler::new();

    let viewport = Arc::clone(&shared.viewport);
    if let Err(e) = sampler.start(SAMPLE_PERIOD, move || {
        let viewport = Arc::clone(&viewport);
        async move { viewport.snapshot().await }
    }) {
        fail(&shared, SessionStats::default(), e);
        return;
    }

    let (advance_tx, mut advance_rx) = mpsc::unbounded_channel();
    let Some(completion) = playback.start(items, move |index| {
        debug!(index, "item highlighted");
        let _ = advance_tx.send(index);
    }) else {
        sampler.stop().await;
        fail(
            &shared,
            SessionStats::default(),
            ReelError::busy("playback was already running"),
        );
        return;
    };
    shared.set_state(SessionState::Recording);

    let completed_playback = tokio::select! {
        _ = cancel.cancelled() => false,
        done = completion.wait() => done,
    };
    if completed_playback {
        info!("playback finished; stopping capture");
    } else {
        info!("capture stopped before playback finished");
    }

    shared.set_state(SessionState::Stopping);
    let report = sampler.stop().await;
    playback.stop().await;

    let mut advances = 0;
    while advance_rx.try_recv().is_ok() {
        advances += 1;
    }
    let stats = SessionStats {
        advances,
        frames: report.frames.len(),
        skipped_ticks: report.skipped,
        failed_snapshots: report.failed,
        completed_playback,
    };

    shared
        .stop
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    shared.set_state(SessionState::Encoding);

    match shared.pipeline.encode(EncodeJob::new(report.frames)).await {
        Ok(artifact) => {
            info!(
                bytes = artifact.len(),
                frames = artifact.frame_count(),
                "capture session succeeded"
            );
            *shared
                .artifact
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(artifact);
            shared.stats.send_replace(stats);
            shared.set_state(SessionState::Idle(LastRun::Succeeded));
        }
        Err(e) => fail(&shared, stats, e),
    }
}

fn fail(shared: &Shared, stats: SessionStats, err: ReelError) {
    error!(error = %err, "capture session failed");
    shared.last_error.send_replace(Some(err.detail()));
    shared.stats.send_replace(stats);
    shared.set_state(SessionState::Idle(LastRun::Failed));
}

#[cfg(test)]
#[path = "../tests/unit/session.rs"]
mod tests;
