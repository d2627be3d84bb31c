//! Value model of the transcode pipeline compiler: frame, audio and tool
//! state plus the codec and pixel-format vocabularies they are built from.

pub mod audio;
pub mod duration_ms;
pub mod error;
pub mod ffmpeg_state;
pub mod frame;
pub mod pixel_format;
pub mod types;

pub use audio::AudioState;
pub use error::CoreError;
pub use ffmpeg_state::{
    DashOptions, FfmpegState, FfmpegVersion, HlsOptions, HlsSegmentType, OutputFormat,
    ReportConfig,
};
pub use frame::{ColorFormat, FrameSize, FrameState};
pub use pixel_format::{HardwareSurface, PixelFormat, SoftwarePixelFormat};
pub use types::{AudioFormat, FrameDataLocation, HardwareAccelerationMode, LogLevel, VideoFormat};
