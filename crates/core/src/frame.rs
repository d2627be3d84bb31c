use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pixel_format::PixelFormat;
use crate::types::{FrameDataLocation, VideoFormat};

/// Width × height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl FromStr for FrameSize {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X', ':'])
            .ok_or_else(|| CoreError::InvalidFrameSize(s.to_string()))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidFrameSize(s.to_string()))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidFrameSize(s.to_string()))?;
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Colour metadata carried by a stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorFormat {
    pub color_range: Option<String>,
    pub color_space: Option<String>,
    pub color_transfer: Option<String>,
    pub color_primaries: Option<String>,
}

impl ColorFormat {
    pub fn bt709() -> Self {
        Self {
            color_range: Some("tv".into()),
            color_space: Some("bt709".into()),
            color_transfer: Some("bt709".into()),
            color_primaries: Some("bt709".into()),
        }
    }

    /// PQ or HLG transfer characteristics.
    pub fn is_hdr(&self) -> bool {
        matches!(
            self.color_transfer.as_deref(),
            Some("smpte2084") | Some("arib-std-b67")
        )
    }

    pub fn is_bt709(&self) -> bool {
        self.color_transfer.as_deref() == Some("bt709")
            && self.color_primaries.as_deref() == Some("bt709")
    }
}

/// Description of video frames at one point of the pipeline.
///
/// Never mutated in place: every transition builds a new value with struct
/// update syntax, so a later step always sees the effect of every step
/// applied before it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameState {
    pub scaled_size: FrameSize,
    pub padded_size: FrameSize,
    pub cropped_size: Option<FrameSize>,
    pub is_anamorphic: bool,
    pub realtime: bool,
    pub infinite_loop: bool,
    pub video_format: VideoFormat,
    pub video_preset: Option<String>,
    pub video_profile: Option<String>,
    pub frame_rate: Option<f64>,
    pub video_track_timescale: Option<u32>,
    /// kbit/s
    pub video_bitrate: Option<u32>,
    /// kbit
    pub video_buffer_size: Option<u32>,
    pub frame_data_location: FrameDataLocation,
    /// Deinterlacing is still pending.
    pub deinterlace: bool,
    pub pixel_format: Option<PixelFormat>,
    pub color_format: Option<ColorFormat>,
}

impl FrameState {
    pub fn new(video_format: VideoFormat, size: FrameSize) -> Self {
        Self {
            scaled_size: size,
            padded_size: size,
            video_format,
            ..Self::default()
        }
    }

    pub fn bit_depth(&self) -> u8 {
        self.pixel_format.map(|p| p.bit_depth()).unwrap_or(8)
    }

    pub fn is_hardware(&self) -> bool {
        self.frame_data_location == FrameDataLocation::Hardware
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frame_sizes() {
        assert_eq!(
            "1920x1080".parse::<FrameSize>().unwrap(),
            FrameSize::new(1920, 1080)
        );
        assert_eq!("640:480".parse::<FrameSize>().unwrap().to_string(), "640x480");
        assert!("wide".parse::<FrameSize>().is_err());
    }

    #[test]
    fn bit_depth_defaults_to_eight() {
        let mut state = FrameState::new(VideoFormat::Hevc, FrameSize::new(1280, 720));
        assert_eq!(state.bit_depth(), 8);
        state.pixel_format = Some(PixelFormat::YUV420P10LE);
        assert_eq!(state.bit_depth(), 10);
    }

    #[test]
    fn hdr_detection_uses_transfer() {
        let hdr = ColorFormat {
            color_transfer: Some("smpte2084".into()),
            ..ColorFormat::default()
        };
        assert!(hdr.is_hdr());
        assert!(!ColorFormat::bt709().is_hdr());
        assert!(ColorFormat::bt709().is_bt709());
    }
}
