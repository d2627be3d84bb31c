use channelcast_core::{PixelFormat, VideoFormat};
use serde::{Deserialize, Serialize};

use super::bit_depth_of;

/// Apple VideoToolbox. Decode support for VP9 and AV1 depends on the SoC.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoToolboxCapabilities {
    pub vp9_decode: bool,
    pub av1_decode: bool,
}

impl VideoToolboxCapabilities {
    pub fn can_decode(
        &self,
        format: VideoFormat,
        _profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        match format {
            VideoFormat::H264 => bit_depth_of(pixel_format) == 8,
            VideoFormat::Hevc | VideoFormat::Mpeg2Video | VideoFormat::Mpeg4 => true,
            VideoFormat::Vp9 => self.vp9_decode,
            VideoFormat::Av1 => self.av1_decode,
            _ => false,
        }
    }

    pub fn can_encode(
        &self,
        format: VideoFormat,
        _profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        match format {
            VideoFormat::H264 => bit_depth_of(pixel_format) == 8,
            VideoFormat::Hevc => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_bit_only_through_hevc() {
        let caps = VideoToolboxCapabilities::default();
        assert!(caps.can_encode(VideoFormat::Hevc, None, Some(PixelFormat::YUV420P10LE)));
        assert!(!caps.can_encode(VideoFormat::H264, None, Some(PixelFormat::YUV420P10LE)));
        assert!(!caps.can_decode(VideoFormat::Vp9, None, None));
    }
}
