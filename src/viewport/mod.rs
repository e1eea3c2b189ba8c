//! Capability boundary towards whatever renders the storyboard.
//!
//! The capture pipeline never draws anything itself; it asks a [`Viewport`] for encoded raster
//! snapshots and tells it which row to scroll to.

use async_trait::async_trait;

use crate::foundation::error::{ReelError, ReelResult};

/// Reference viewport that draws rows as a table strip.
pub mod strip;

/// Where the viewport should scroll when the highlighted row changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollHint {
    /// Rest position: top of the table, nothing highlighted beyond the first row.
    Top,
    /// Bring the row at this playback index into view and highlight it.
    Item(usize),
}

/// Encoding of a [`Raster`] payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    /// Baseline JPEG.
    Jpeg,
    /// PNG.
    Png,
}

impl RasterFormat {
    /// File extension used when staging frames for the encoder.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Encoded image bytes produced by a viewport snapshot.
///
/// The pipeline treats the payload as opaque and hands it to the encoder untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Payload encoding.
    pub format: RasterFormat,
    /// Encoded bytes.
    pub bytes: Vec<u8>,
}

impl Raster {
    /// Wrap an encoded payload, rejecting empty ones.
    pub fn new(format: RasterFormat, bytes: Vec<u8>) -> ReelResult<Self> {
        if bytes.is_empty() {
            return Err(ReelError::snapshot("viewport produced an empty raster"));
        }
        Ok(Self { format, bytes })
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Return `true` when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// What the capture pipeline needs from the surrounding application.
///
/// Implementations must be safe to call concurrently: the sampler snapshots while the
/// scheduler scrolls.
#[async_trait]
pub trait Viewport: Send + Sync {
    /// Capture the currently visible viewport as an encoded image.
    async fn snapshot(&self) -> ReelResult<Raster>;

    /// Scroll and highlight according to `hint`.
    async fn scroll_to(&self, hint: ScrollHint) -> ReelResult<()>;
}
