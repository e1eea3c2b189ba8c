//! storyreel records a storyboard as a video by playing it back in a viewport.
//!
//! A capture run has three cooperating stages:
//!
//! 1. **Playback** ([`PlaybackScheduler`]): highlight each storyboard item for its duration,
//!    asking the [`Viewport`] to scroll along.
//! 2. **Sampling** ([`FrameSampler`]): snapshot the viewport at a fixed 10 Hz into an
//!    append-only [`FrameBuffer`], skipping ticks while a snapshot is still in flight.
//! 3. **Encoding** ([`EncodingPipeline`]): stage the frames in a private working directory,
//!    run `ffmpeg` over them and read back a non-empty MP4 ([`CaptureArtifact`]).
//!
//! [`CaptureSession`] owns the lifecycle and publishes its [`SessionState`]. Rendering the
//! viewport is the host application's job; it plugs in through the two-method [`Viewport`]
//! trait. [`StripViewport`] is a self-contained implementation used by the CLI.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Runtime configuration.
pub mod config;
/// Frame buffer to video encoding.
pub mod encode;
/// Timed highlight playback.
pub mod playback;
/// Fixed-rate viewport sampling.
pub mod sampler;
/// Capture session state machine.
pub mod session;
/// Storyboard rows and duration resolution.
pub mod storyboard;
/// Viewport capability and reference implementation.
pub mod viewport;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;

pub use crate::foundation::core::{
    ARTIFACT_FILE_NAME, ARTIFACT_MIME, DEFAULT_ITEM_DURATION, FrameIndex, SAMPLE_PERIOD,
    SAMPLE_RATE_HZ, StoryboardItem, total_duration,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::config::CaptureConfig;
pub use crate::encode::ffmpeg::{FfmpegEncoder, FfmpegOpts, is_ffmpeg_on_path};
pub use crate::encode::pipeline::{
    CaptureArtifact, Container, EncodeJob, EncoderInvocation, EncodingPipeline, VideoEncoder,
};
pub use crate::playback::{PlaybackCompletion, PlaybackScheduler, PlaybackState};
pub use crate::sampler::{Frame, FrameBuffer, FrameSampler, SamplerReport};
pub use crate::session::{CaptureSession, LastRun, SessionState, SessionStats};
pub use crate::storyboard::{Storyboard, StoryboardRow, resolve_duration};
pub use crate::viewport::strip::{StripLayout, StripViewport};
pub use crate::viewport::{Raster, RasterFormat, ScrollHint, Viewport};
