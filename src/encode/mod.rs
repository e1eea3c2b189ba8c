//! Frame buffer to video encoding.
//!
//! The pipeline stages frames into a private working directory, hands that directory to a
//! [`pipeline::VideoEncoder`], and reads the produced container back into memory.

/// `ffmpeg`-based encoder (system binary).
pub mod ffmpeg;
/// Staging, encoder invocation and artifact validation.
pub mod pipeline;
