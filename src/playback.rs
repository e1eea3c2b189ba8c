//! Timed highlight playback over storyboard items.
//!
//! The scheduler owns a single task that walks the items in order, notifying the caller and
//! asking the viewport to scroll at each advance, then sleeping for the item's duration.
//! Deadlines are absolute from the start instant so slow scroll requests do not accumulate
//! drift.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::foundation::core::StoryboardItem;
use crate::viewport::{ScrollHint, Viewport};

/// Observable playback position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// Highlighted item, or `None` at rest.
    pub cursor: Option<usize>,
    /// `true` between `start` and natural completion or `stop`.
    pub running: bool,
}

/// Resolves when a playback run finishes.
#[derive(Debug)]
pub struct PlaybackCompletion {
    rx: oneshot::Receiver<()>,
}

impl PlaybackCompletion {
    /// Wait for the run to end; `true` when it completed naturally, `false` when it was stopped.
    pub async fn wait(self) -> bool {
        self.rx.await.is_ok()
    }
}

struct PlaybackTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Advances a cursor through storyboard items on their configured durations.
pub struct PlaybackScheduler {
    viewport: Arc<dyn Viewport>,
    state: Arc<watch::Sender<PlaybackState>>,
    task: Option<PlaybackTask>,
}

impl PlaybackScheduler {
    /// Create an idle scheduler driving `viewport`.
    pub fn new(viewport: Arc<dyn Viewport>) -> Self {
        let (state, _) = watch::channel(PlaybackState::default());
        Self {
            viewport,
            state: Arc::new(state),
            task: None,
        }
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    /// Follow playback state changes.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Start playing `items`, calling `on_advance` with each index as it becomes current.
    ///
    /// Index 0 is announced immediately. Returns `None` (and changes nothing) when playback is
    /// already running; the caller has to `stop` first. An empty sequence completes at once
    /// without any advance.
    pub fn start<F>(
        &mut self,
        items: Vec<StoryboardItem>,
        on_advance: F,
    ) -> Option<PlaybackCompletion>
    where
        F: FnMut(usize) + Send + 'static,
    {
        if self.state.borrow().running {
            warn!("playback start ignored: already running");
            return None;
        }
        self.task = None;

        let (done_tx, done_rx) = oneshot::channel();
        if items.is_empty() {
            info!("playback has no items; completing immediately");
            self.state.send_replace(PlaybackState::default());
            let _ = done_tx.send(());
            return Some(PlaybackCompletion { rx: done_rx });
        }

        info!(items = items.len(), "playback starting");
        self.state.send_replace(PlaybackState {
            cursor: Some(0),
            running: true,
        });

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_playback(
            items,
            Arc::clone(&self.viewport),
            Arc::clone(&self.state),
            cancel.clone(),
            on_advance,
            done_tx,
        ));
        self.task = Some(PlaybackTask { cancel, handle });
        Some(PlaybackCompletion { rx: done_rx })
    }

    /// Cancel any pending wait, reset the cursor and return the viewport to the top.
    ///
    /// No advance fires after this returns. A scheduler that is already at rest is left alone.
    pub async fn stop(&mut self) {
        let task = self.task.take();
        let at_rest = {
            let s = self.state.borrow();
            !s.running && s.cursor.is_none()
        };
        if at_rest {
            debug!("playback stop ignored: not running");
            return;
        }

        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.handle.await
                && e.is_panic()
            {
                warn!(error = %e, "playback task panicked");
            }
        }

        self.state.send_replace(PlaybackState::default());
        if let Err(e) = self.viewport.scroll_to(ScrollHint::Top).await {
            warn!(error = %e, "viewport failed to return to top");
        }
        info!("playback stopped");
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.cancel.cancel();
        }
    }
}

async fn run_playback<F>(
    items: Vec<StoryboardItem>,
    viewport: Arc<dyn Viewport>,
    state: Arc<watch::Sender<PlaybackState>>,
    cancel: CancellationToken,
    mut on_advance: F,
    done: oneshot::Sender<()>,
) where
    F: FnMut(usize) + Send + 'static,
{
    let mut deadline = Instant::now();

    for (cursor, item) in items.iter().enumerate() {
        state.send_modify(|s| s.cursor = Some(cursor));
        debug!(index = cursor, duration_ms = item.duration_millis(), "playback advance");
        on_advance(cursor);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            res = viewport.scroll_to(ScrollHint::Item(cursor)) => {
                if let Err(e) = res {
                    warn!(
                        index = cursor,
                        error = %e,
                        "viewport scroll failed; continuing playback"
                    );
                }
            }
        }

        deadline += item.duration();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = sleep_until(deadline) => {}
        }
    }

    state.send_modify(|s| s.running = false);
    info!(items = items.len(), "playback complete");
    let _ = done.send(());
}

#[cfg(test)]
#[path = "../tests/unit/playback.rs"]
mod tests;
