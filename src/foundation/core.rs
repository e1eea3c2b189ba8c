use std::time::Duration;

use crate::foundation::error::{ReelError, ReelResult};

/// Viewport sampling rate in frames per second.
pub const SAMPLE_RATE_HZ: u32 = 10;

/// Period between two sampler ticks (`1 / SAMPLE_RATE_HZ`).
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(1000 / SAMPLE_RATE_HZ as u64);

/// Display duration used for rows whose duration is missing or unusable.
pub const DEFAULT_ITEM_DURATION: Duration = Duration::from_millis(2000);

/// File name of the downloadable artifact.
pub const ARTIFACT_FILE_NAME: &str = "table_recording.mp4";

/// MIME type of the downloadable artifact.
pub const ARTIFACT_MIME: &str = "video/mp4";

/// 0-based capture index of a sampled frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Index following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// One storyboard row as seen by the playback scheduler.
///
/// The duration is resolved once when the item is built and is always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct StoryboardItem {
    /// Position of the row in playback order.
    pub sequence_index: usize,
    duration: Duration,
}

impl StoryboardItem {
    /// Create an item with an explicit, non-zero duration.
    pub fn new(sequence_index: usize, duration: Duration) -> ReelResult<Self> {
        if duration.is_zero() {
            return Err(ReelError::validation(format!(
                "storyboard item {sequence_index} has a zero duration"
            )));
        }
        Ok(Self {
            sequence_index,
            duration,
        })
    }

    /// Create an item that uses [`DEFAULT_ITEM_DURATION`].
    pub fn with_default_duration(sequence_index: usize) -> Self {
        Self {
            sequence_index,
            duration: DEFAULT_ITEM_DURATION,
        }
    }

    /// How long the item stays highlighted.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Duration in whole milliseconds.
    pub fn duration_millis(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Total wall-clock time needed to play `items` back to back.
pub fn total_duration(items: &[StoryboardItem]) -> Duration {
    items.iter().map(StoryboardItem::duration).sum()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
