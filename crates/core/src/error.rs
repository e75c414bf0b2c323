/// Result alias that carries the custom [`PoseLabError`] type.
pub type Result<T> = std::result::Result<T, PoseLabError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PoseLabError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Caller supplied data the pipeline cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A single pose estimation call failed. Recovered by skipping the tick.
    #[error("pose estimation failed: {0}")]
    Estimation(String),
    /// Decode or playback failure reported by the media source.
    #[error("media error (code {code}): {message}")]
    Media { code: u16, message: String },
    /// Live capture access was refused.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("unknown sport `{0}`")]
    UnknownSport(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl PoseLabError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates an estimation failure for a single tick.
    pub fn estimation<T: Into<String>>(msg: T) -> Self {
        Self::Estimation(msg.into())
    }
}

impl From<&str> for PoseLabError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for PoseLabError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
