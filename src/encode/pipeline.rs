use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::foundation::core::{ARTIFACT_FILE_NAME, ARTIFACT_MIME, SAMPLE_RATE_HZ};
use crate::foundation::error::{ReelError, ReelResult};
use crate::sampler::FrameBuffer;
use crate::viewport::RasterFormat;

/// Name of the container file the encoder writes inside the working directory.
pub const OUTPUT_FILE_NAME: &str = "out.mp4";

/// Output container of an [`EncodeJob`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Container {
    /// H.264 in MP4.
    #[default]
    Mp4,
}

impl Container {
    /// MIME type of the container.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Mp4 => ARTIFACT_MIME,
        }
    }
}

/// Everything one encode needs. Consumed by [`EncodingPipeline::encode`].
#[derive(Debug)]
pub struct EncodeJob {
    /// Input frame rate; matches the sampler rate.
    pub frame_rate_hz: u32,
    /// Frames in capture order.
    pub frames: FrameBuffer,
    /// Output container.
    pub container: Container,
}

impl EncodeJob {
    /// Build a job for frames sampled at [`SAMPLE_RATE_HZ`].
    pub fn new(frames: FrameBuffer) -> Self {
        Self {
            frame_rate_hz: SAMPLE_RATE_HZ,
            frames,
            container: Container::Mp4,
        }
    }

    /// Check the job and return the raster format shared by all frames.
    pub fn validate(&self) -> ReelResult<RasterFormat> {
        if self.frame_rate_hz == 0 {
            return Err(ReelError::validation("encode frame rate must be non-zero"));
        }
        let Some(first) = self.frames.frames().first() else {
            return Err(ReelError::encode("no frames were captured"));
        };
        let format = first.raster.format;
        if let Some(odd) = self
            .frames
            .frames()
            .iter()
            .find(|f| f.raster.format != format)
        {
            return Err(ReelError::validation(format!(
                "frame {} is {:?} but the sequence started as {:?}",
                odd.index.0, odd.raster.format, format
            )));
        }
        Ok(format)
    }
}

/// Arguments handed to a [`VideoEncoder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderInvocation {
    /// Private working directory holding the staged frames; also the output location.
    pub workdir: PathBuf,
    /// printf-style pattern matching the staged frames (`frame%d.jpg`).
    pub input_pattern: String,
    /// Number of staged frames.
    pub frame_count: usize,
    /// Input frame rate in Hz.
    pub frame_rate_hz: u32,
    /// Output file name relative to `workdir`.
    pub output: String,
}

impl EncoderInvocation {
    /// Absolute path of the output file.
    pub fn output_path(&self) -> PathBuf {
        self.workdir.join(&self.output)
    }
}

/// Something that turns staged frames into a container file.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Encode the frames described by `inv`, writing `inv.output_path()`.
    async fn encode(&self, inv: &EncoderInvocation) -> ReelResult<()>;
}

/// Encoded video handed to the caller. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureArtifact {
    bytes: Vec<u8>,
    frame_count: usize,
    container: Container,
}

impl CaptureArtifact {
    /// Wrap encoder output; zero-length output is an encode failure.
    pub fn new(bytes: Vec<u8>, frame_count: usize) -> ReelResult<Self> {
        if bytes.is_empty() {
            return Err(ReelError::encode(
                "encoder reported success but produced an empty file",
            ));
        }
        Ok(Self {
            bytes,
            frame_count,
            container: Container::Mp4,
        })
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size in bytes (always > 0).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of frames that went into the video.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Download file name.
    pub fn file_name(&self) -> &'static str {
        ARTIFACT_FILE_NAME
    }

    /// Download MIME type.
    pub fn mime(&self) -> &'static str {
        self.container.mime()
    }

    /// Write the artifact into `dir` under [`Self::file_name`], returning the written path.
    pub async fn save_to(&self, dir: &Path) -> ReelResult<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
        let path = dir.join(self.file_name());
        tokio::fs::write(&path, &self.bytes)
            .await
            .with_context(|| format!("failed to write artifact '{}'", path.display()))?;
        Ok(path)
    }
}

/// Turns a frame buffer into a [`CaptureArtifact`] using a [`VideoEncoder`].
#[derive(Clone)]
pub struct EncodingPipeline {
    encoder: Arc<dyn VideoEncoder>,
}

impl EncodingPipeline {
    /// Create a pipeline around `encoder`.
    pub fn new(encoder: Arc<dyn VideoEncoder>) -> Self {
        Self { encoder }
    }

    /// Stage, encode, read back and validate.
    ///
    /// The working directory is created fresh for every call and removed when the call
    /// returns, whatever the outcome. Any failure discards the job's frames.
    #[tracing::instrument(skip_all, fields(frames = job.frames.len(), rate = job.frame_rate_hz))]
    pub async fn encode(&self, job: EncodeJob) -> ReelResult<CaptureArtifact> {
        let format = job.validate()?;
        let frame_count = job.frames.len();

        let workdir = tempfile::Builder::new()
            .prefix("storyreel-")
            .tempdir()
            .map_err(|e| ReelError::encode(format!("failed to create working area: {e}")))?;

        stage_frames(workdir.path(), job.frames, format).await?;
        debug!(frames = frame_count, dir = %workdir.path().display(), "frames staged");

        let inv = EncoderInvocation {
            workdir: workdir.path().to_path_buf(),
            input_pattern: format!("frame%d.{}", format.extension()),
            frame_count,
            frame_rate_hz: job.frame_rate_hz,
            output: OUTPUT_FILE_NAME.to_string(),
        };
        self.encoder.encode(&inv).await.map_err(|e| match e {
            ReelError::Encode(_) => e,
            other => ReelError::encode(other.detail()),
        })?;

        let out = inv.output_path();
        let bytes = tokio::fs::read(&out)
            .await
            .map_err(|e| ReelError::encode(format!("failed to read '{}': {e}", out.display())))?;
        info!(bytes = bytes.len(), frames = frame_count, "encoder output read back");

        CaptureArtifact::new(bytes, frame_count)
    }
}

/// Write each frame as `frame{i}.{ext}`; the first failed write aborts staging.
async fn stage_frames(dir: &Path, frames: FrameBuffer, format: RasterFormat) -> ReelResult<()> {
    for frame in frames {
        let path = dir.join(format!("frame{}.{}", frame.index.0, format.extension()));
        tokio::fs::write(&path, &frame.raster.bytes)
            .await
            .map_err(|e| {
                ReelError::encode(format!("failed to stage frame {}: {e}", frame.index.0))
            })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/pipeline.rs"]
mod tests;
