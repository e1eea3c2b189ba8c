//! Runtime configuration.
//!
//! Timing constants such as [`SAMPLE_RATE_HZ`](crate::SAMPLE_RATE_HZ) are fixed. Only the
//! encoder, the reference viewport and the output location are configurable.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::Context as _;

use crate::encode::ffmpeg::FfmpegOpts;
use crate::foundation::error::{ReelError, ReelResult};
use crate::viewport::strip::StripLayout;

/// Capture configuration, typically read from a JSON file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Encoder options.
    pub ffmpeg: FfmpegOpts,
    /// Reference viewport geometry.
    pub viewport: StripLayout,
    /// Directory the artifact is saved into.
    pub output_dir: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ffmpeg: FfmpegOpts::default(),
            viewport: StripLayout::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl CaptureConfig {
    /// Parse configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> ReelResult<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| ReelError::serde(format!("config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> ReelResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ReelError::serde(format!("config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate every section.
    pub fn validate(&self) -> ReelResult<()> {
        self.ffmpeg.validate()?;
        self.viewport.validate()?;
        if self.output_dir.as_os_str().is_empty() {
            return Err(ReelError::validation("output_dir must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
