//! Hardware capability oracles.
//!
//! Every backend answers decode/encode legality for a codec, profile and
//! pixel format. Unsupported combinations answer `false`; callers fall back
//! to software. Nothing here returns an error.

pub mod ffmpeg;
pub mod nvidia;
pub mod qsv;
pub mod vaapi;
pub mod videotoolbox;

use channelcast_core::{HardwareAccelerationMode, PixelFormat, VideoFormat};
use serde::{Deserialize, Serialize};

pub use ffmpeg::FfmpegCapabilities;
pub use nvidia::NvidiaCapabilities;
pub use qsv::QsvCapabilities;
pub use vaapi::{VaapiCapabilities, VaapiProfileEntrypoint};
pub use videotoolbox::VideoToolboxCapabilities;

/// Encoder rate-control modes a VAAPI entrypoint can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RateControlMode {
    Cqp,
    Cbr,
    Vbr,
}

impl RateControlMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cqp => "CQP",
            Self::Cbr => "CBR",
            Self::Vbr => "VBR",
        }
    }
}

/// Detected hardware, one variant per backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum HardwareCapabilities {
    #[default]
    None,
    Nvidia(NvidiaCapabilities),
    Vaapi(VaapiCapabilities),
    Qsv(QsvCapabilities),
    VideoToolbox(VideoToolboxCapabilities),
}

impl HardwareCapabilities {
    pub fn mode(&self) -> HardwareAccelerationMode {
        match self {
            Self::None => HardwareAccelerationMode::None,
            Self::Nvidia(_) => HardwareAccelerationMode::Cuda,
            Self::Vaapi(_) => HardwareAccelerationMode::Vaapi,
            Self::Qsv(_) => HardwareAccelerationMode::Qsv,
            Self::VideoToolbox(_) => HardwareAccelerationMode::VideoToolbox,
        }
    }

    pub fn can_decode(
        &self,
        format: VideoFormat,
        profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        match self {
            Self::None => false,
            Self::Nvidia(caps) => caps.can_decode(format, profile, pixel_format),
            Self::Vaapi(caps) => caps.can_decode(format, profile, pixel_format),
            Self::Qsv(caps) => caps.can_decode(format, profile, pixel_format),
            Self::VideoToolbox(caps) => caps.can_decode(format, profile, pixel_format),
        }
    }

    pub fn can_encode(
        &self,
        format: VideoFormat,
        profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        match self {
            Self::None => false,
            Self::Nvidia(caps) => caps.can_encode(format, profile, pixel_format),
            Self::Vaapi(caps) => caps.can_encode(format, profile, pixel_format),
            Self::Qsv(caps) => caps.can_encode(format, profile, pixel_format),
            Self::VideoToolbox(caps) => caps.can_encode(format, profile, pixel_format),
        }
    }

    pub fn rate_control_mode(
        &self,
        format: VideoFormat,
        pixel_format: Option<PixelFormat>,
    ) -> Option<RateControlMode> {
        match self {
            Self::Vaapi(caps) => caps.rate_control_mode(format, pixel_format),
            Self::Qsv(caps) => caps.inner().rate_control_mode(format, pixel_format),
            Self::None | Self::Nvidia(_) | Self::VideoToolbox(_) => None,
        }
    }
}

pub(crate) fn bit_depth_of(pixel_format: Option<PixelFormat>) -> u8 {
    pixel_format.map(|p| p.bit_depth()).unwrap_or(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_declines_everything() {
        let caps = HardwareCapabilities::None;
        assert!(!caps.can_decode(VideoFormat::H264, None, None));
        assert!(!caps.can_encode(VideoFormat::H264, None, None));
        assert!(caps.rate_control_mode(VideoFormat::H264, None).is_none());
        assert_eq!(caps.mode(), HardwareAccelerationMode::None);
    }

    #[test]
    fn backend_tag_round_trips_through_json() {
        let caps = HardwareCapabilities::Nvidia(NvidiaCapabilities::new("RTX 3080", 86));
        let json = serde_json::to_string(&caps).unwrap();
        assert!(json.contains(r#""backend":"nvidia""#));
        let back: HardwareCapabilities = serde_json::from_str(&json).unwrap();
        assert_eq!(back, caps);
    }
}
