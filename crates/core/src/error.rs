use thiserror::Error;

/// Errors raised while parsing value-model types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown pixel format: {0}")]
    UnknownPixelFormat(String),

    #[error("invalid frame size: {0}")]
    InvalidFrameSize(String),

    #[error("invalid tool version: {0}")]
    InvalidVersion(String),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownPixelFormat(_) => "unknown_pixel_format",
            Self::InvalidFrameSize(_) => "invalid_frame_size",
            Self::InvalidVersion(_) => "invalid_version",
        }
    }
}
