use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::encode::pipeline::{EncoderInvocation, VideoEncoder};
use crate::foundation::error::{ReelError, ReelResult};

/// Scale filter rounding both dimensions down to even numbers (required by yuv420p).
pub const EVEN_DIMENSIONS_FILTER: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";

/// Options for [`FfmpegEncoder`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FfmpegOpts {
    /// `ffmpeg` executable; looked up on `PATH` when not absolute.
    pub program: PathBuf,
    /// libx264 preset.
    pub preset: String,
}

impl Default for FfmpegOpts {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            preset: "ultrafast".to_string(),
        }
    }
}

impl FfmpegOpts {
    /// Reject options that cannot produce a command line.
    pub fn validate(&self) -> ReelResult<()> {
        if self.program.as_os_str().is_empty() {
            return Err(ReelError::validation("ffmpeg program must not be empty"));
        }
        if self.preset.trim().is_empty() {
            return Err(ReelError::validation("ffmpeg preset must not be empty"));
        }
        Ok(())
    }
}

/// Encoder that runs the system `ffmpeg` over the staged image sequence.
///
/// Output is H.264 + yuv420p in MP4 for broad player compatibility.
#[derive(Clone, Debug, Default)]
pub struct FfmpegEncoder {
    opts: FfmpegOpts,
}

impl FfmpegEncoder {
    /// Create an encoder with `opts`.
    pub fn new(opts: FfmpegOpts) -> Self {
        Self { opts }
    }

    /// Options in use.
    pub fn opts(&self) -> &FfmpegOpts {
        &self.opts
    }

    /// Full argument list for `inv`, paths relative to the working directory.
    pub fn args(&self, inv: &EncoderInvocation) -> Vec<OsString> {
        let rate = inv.frame_rate_hz.to_string();
        let mut args: Vec<OsString> = Vec::with_capacity(20);
        args.extend(
            [
                "-y",
                "-loglevel",
                "error",
                "-framerate",
                rate.as_str(),
                "-i",
                inv.input_pattern.as_str(),
                "-vf",
                EVEN_DIMENSIONS_FILTER,
                "-an",
                "-c:v",
                "libx264",
                "-preset",
                self.opts.preset.as_str(),
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
                inv.output.as_str(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        args
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, inv: &EncoderInvocation) -> ReelResult<()> {
        let args = self.args(inv);
        debug!(program = %self.opts.program.display(), ?args, "invoking ffmpeg");

        let output = Command::new(&self.opts.program)
            .args(&args)
            .current_dir(&inv.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ReelError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        info!(frames = inv.frame_count, "ffmpeg finished");
        Ok(())
    }
}

/// Return `true` when `program` can be invoked (`program -version` succeeds).
pub fn is_ffmpeg_on_path(program: &Path) -> bool {
    std::process::Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
