//! NVIDIA legality rules, keyed on CUDA compute capability.

use channelcast_core::{PixelFormat, VideoFormat};
use serde::{Deserialize, Serialize};

use super::bit_depth_of;

/// Maxwell GM206 parts: compute capability 5.2 but with the newer video
/// engine that decodes HEVC and VP9.
const MAXWELL_GM206_MODELS: &[&str] = &[
    "GTX 950",
    "GTX 960",
    "GTX 965M",
    "Quadro M2000",
    "Tesla M4",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NvidiaCapabilities {
    pub model: String,
    /// `major * 10 + minor`, so 8.6 is `86`.
    pub compute_capability: u32,
}

impl NvidiaCapabilities {
    pub fn new(model: impl Into<String>, compute_capability: u32) -> Self {
        Self {
            model: model.into(),
            compute_capability,
        }
    }

    fn is_gm206(&self) -> bool {
        MAXWELL_GM206_MODELS
            .iter()
            .any(|m| self.model.contains(m))
    }

    pub fn can_decode(
        &self,
        format: VideoFormat,
        profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        let cc = self.compute_capability;
        let bit_depth = bit_depth_of(pixel_format);
        match format {
            VideoFormat::H264 => bit_depth == 8 && !is_h264_high_profile_variant(profile),
            VideoFormat::Hevc => cc >= 60 || (cc >= 52 && self.is_gm206()),
            VideoFormat::Vp9 => cc >= 60 || (cc >= 52 && self.is_gm206() && bit_depth == 8),
            VideoFormat::Av1 => cc >= 86,
            VideoFormat::Mpeg1Video | VideoFormat::Mpeg2Video | VideoFormat::Vc1 => true,
            VideoFormat::Mpeg4 => false,
            _ => false,
        }
    }

    pub fn can_encode(
        &self,
        format: VideoFormat,
        profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        let cc = self.compute_capability;
        let bit_depth = bit_depth_of(pixel_format);
        match format {
            VideoFormat::H264 => bit_depth == 8 && !is_h264_high_profile_variant(profile),
            VideoFormat::Hevc if bit_depth > 8 => cc >= 60,
            VideoFormat::Hevc => cc >= 52,
            VideoFormat::Av1 => cc >= 80,
            _ => false,
        }
    }
}

/// High 10 / High 4:2:2 / High 4:4:4 are never handled by NVDEC or NVENC.
fn is_h264_high_profile_variant(profile: Option<&str>) -> bool {
    profile.is_some_and(|p| {
        let p = p.to_ascii_lowercase();
        p.contains("10") || p.contains("4:2:2") || p.contains("4:4:4")
    })
}

/// Parse `nvidia-smi --query-gpu=name,compute_cap --format=csv,noheader`.
/// Only the first GPU is considered.
pub fn parse_nvidia_smi(output: &str) -> Option<NvidiaCapabilities> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (model, cc) = line.rsplit_once(',')?;
    let (major, minor) = cc.trim().split_once('.')?;
    let major: u32 = major.parse().ok()?;
    let minor: u32 = minor.parse().ok()?;
    Some(NvidiaCapabilities::new(model.trim(), major * 10 + minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maxwell_gm206_decodes_hevc_at_52() {
        let gm206 = NvidiaCapabilities::new("NVIDIA GeForce GTX 960", 52);
        let gm204 = NvidiaCapabilities::new("NVIDIA GeForce GTX 980", 52);
        assert!(gm206.can_decode(VideoFormat::Hevc, None, None));
        assert!(!gm204.can_decode(VideoFormat::Hevc, None, None));
        assert!(gm204.can_encode(VideoFormat::Hevc, None, Some(PixelFormat::YUV420P)));
        assert!(!gm204.can_encode(VideoFormat::Hevc, None, Some(PixelFormat::YUV420P10LE)));
    }

    #[test]
    fn mpeg4_is_never_hardware_decoded() {
        let caps = NvidiaCapabilities::new("RTX 4090", 89);
        assert!(!caps.can_decode(VideoFormat::Mpeg4, None, None));
        assert!(caps.can_decode(VideoFormat::Mpeg2Video, None, None));
    }

    #[test]
    fn av1_thresholds() {
        let ampere = NvidiaCapabilities::new("A100", 80);
        assert!(ampere.can_encode(VideoFormat::Av1, None, None));
        assert!(!ampere.can_decode(VideoFormat::Av1, None, None));
        let ga102 = NvidiaCapabilities::new("RTX 3080", 86);
        assert!(ga102.can_decode(VideoFormat::Av1, None, None));
    }

    #[test]
    fn h264_high10_profile_is_rejected() {
        let caps = NvidiaCapabilities::new("RTX 3080", 86);
        assert!(!caps.can_decode(VideoFormat::H264, Some("High 10"), None));
        assert!(caps.can_decode(VideoFormat::H264, Some("High"), None));
    }

    #[test]
    fn parses_smi_csv() {
        let caps = parse_nvidia_smi("NVIDIA GeForce RTX 3060, 8.6\nNVIDIA T400, 7.5\n").unwrap();
        assert_eq!(caps.model, "NVIDIA GeForce RTX 3060");
        assert_eq!(caps.compute_capability, 86);
        assert!(parse_nvidia_smi("").is_none());
        assert!(parse_nvidia_smi("No devices were found").is_none());
    }
}
