/// Convenience result type used across storyreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Error taxonomy for the capture pipeline.
///
/// `Snapshot` and `Playback` are recovered where they occur and only surface through logs;
/// `Encode` is always fatal for the session that produced it.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A session was asked to start while it was not idle.
    #[error("capture session busy: {0}")]
    Busy(String),

    /// A single viewport snapshot failed.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// The viewport failed to follow a scroll/highlight request.
    #[error("playback error: {0}")]
    Playback(String),

    /// Staging, encoder invocation or readback failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Busy`] value.
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    /// Build a [`ReelError::Snapshot`] value.
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Build a [`ReelError::Playback`] value.
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Message without the variant prefix, for wrapping into another variant.
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::Busy(msg)
            | Self::Snapshot(msg)
            | Self::Playback(msg)
            | Self::Encode(msg)
            | Self::Serde(msg) => msg.clone(),
            Self::Other(e) => format!("{e:#}"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
