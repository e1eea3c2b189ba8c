//! Fixed-period viewport sampling into an append-only frame buffer.
//!
//! At most one snapshot is in flight at a time. A tick that comes due while the previous
//! snapshot is still running is skipped, not queued, so the buffer stays in capture order and
//! memory stays bounded when the viewport is slow.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::viewport::Raster;

/// One captured viewport snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Position in the buffer; contiguous from zero.
    pub index: FrameIndex,
    /// Encoded snapshot.
    pub raster: Raster,
}

/// Captured frames in capture order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
}

impl FrameBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot, assigning it the next capture index.
    pub fn push(&mut self, raster: Raster) -> FrameIndex {
        let index = self
            .frames
            .last()
            .map_or(FrameIndex(0), |last| last.index.next());
        self.frames.push(Frame { index, raster });
        index
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Borrow the frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Total payload bytes held.
    pub fn payload_bytes(&self) -> usize {
        self.frames.iter().map(|f| f.raster.len()).sum()
    }
}

impl IntoIterator for FrameBuffer {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

/// Final buffer and counters of one sampling run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SamplerReport {
    /// Frames in capture order.
    pub frames: FrameBuffer,
    /// Ticks that started a snapshot.
    pub ticks: u64,
    /// Ticks skipped because a snapshot was still in flight.
    pub skipped: u64,
    /// Snapshots that failed and were dropped.
    pub failed: u64,
}

struct SamplerTask {
    cancel: CancellationToken,
    handle: JoinHandle<SamplerReport>,
}

/// Periodic snapshot driver.
#[derive(Default)]
pub struct FrameSampler {
    task: Option<SamplerTask>,
}

impl FrameSampler {
    /// Create a stopped sampler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` while a sampling run is active.
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Begin calling `on_tick` every `period`, starting immediately.
    ///
    /// Returns `false` (and changes nothing) when already running.
    pub fn start<F, Fut>(&mut self, period: Duration, on_tick: F) -> ReelResult<bool>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ReelResult<Raster>> + Send + 'static,
    {
        if period.is_zero() {
            return Err(ReelError::validation("sample period must be non-zero"));
        }
        if self.task.is_some() {
            warn!("sampler start ignored: already running");
            return Ok(false);
        }

        info!(period_ms = period.as_millis() as u64, "sampler starting");
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_sampler(period, on_tick, cancel.clone()));
        self.task = Some(SamplerTask { cancel, handle });
        Ok(true)
    }

    /// Stop ticking and return the final buffer.
    ///
    /// A snapshot already in flight is awaited and its frame kept. Nothing is appended after
    /// this returns. Stopping a sampler that is not running yields an empty report.
    pub async fn stop(&mut self) -> SamplerReport {
        let Some(task) = self.task.take() else {
            debug!("sampler stop ignored: not running");
            return SamplerReport::default();
        };

        task.cancel.cancel();
        match task.handle.await {
            Ok(report) => {
                info!(
                    frames = report.frames.len(),
                    bytes = report.frames.payload_bytes(),
                    ticks = report.ticks,
                    skipped = report.skipped,
                    failed = report.failed,
                    "sampler stopped"
                );
                report
            }
            Err(e) => {
                warn!(error = %e, "sampler task ended abnormally; discarding frames");
                SamplerReport::default()
            }
        }
    }
}

impl Drop for FrameSampler {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.cancel.cancel();
        }
    }
}

fn collect(
    report: &mut SamplerReport,
    finished: Result<ReelResult<Raster>, tokio::task::JoinError>,
) {
    match finished {
        Ok(Ok(raster)) => {
            let index = report.frames.push(raster);
            debug!(index = index.0, "frame captured");
        }
        Ok(Err(e)) => {
            report.failed += 1;
            warn!(error = %e, "snapshot failed; dropping tick");
        }
        Err(e) => {
            report.failed += 1;
            warn!(error = %e, "snapshot task aborted; dropping tick");
        }
    }
}

async fn run_sampler<F, Fut>(
    period: Duration,
    on_tick: F,
    cancel: CancellationToken,
) -> SamplerReport
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ReelResult<Raster>> + Send + 'static,
{
    let mut report = SamplerReport::default();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<JoinHandle<ReelResult<Raster>>> = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
            report.skipped += 1;
            debug!(skipped = report.skipped, "tick skipped: snapshot still in flight");
            continue;
        }
        if let Some(done) = in_flight.take() {
            collect(&mut report, done.await);
        }

        report.ticks += 1;
        in_flight = Some(tokio::spawn(on_tick()));
    }

    if let Some(last) = in_flight.take() {
        collect(&mut report, last.await);
    }
    report
}

#[cfg(test)]
#[path = "../tests/unit/sampler.rs"]
mod tests;
