//! VAAPI capabilities, derived from `vainfo` output.
//!
//! The scanner has two states. While searching, it looks for a
//! profile/entrypoint header. Once a header has been seen, the block is
//! open and rate-control lines accumulate into it until a blank line or the
//! next header.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use channelcast_core::{PixelFormat, VideoFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{RateControlMode, bit_depth_of};

/// Matches both `VAProfileH264Main : VAEntrypointVLD` and the
/// `VAProfileH264Main/VAEntrypointEncSlice` headers of `vainfo -a`.
pub static PROFILE_ENTRYPOINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(VAProfile\w*)[\s:/]*(VAEntrypoint\w*)").unwrap());

/// Matches `VAConfigAttribRateControl : VA_RC_CBR` and its continuation
/// lines.
pub static RATE_CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"VA_RC_(\w+)").unwrap());

pub const ENTRYPOINT_DECODE: &str = "VAEntrypointVLD";
pub const ENTRYPOINT_ENCODE: &str = "VAEntrypointEncSlice";
pub const ENTRYPOINT_ENCODE_LOW_POWER: &str = "VAEntrypointEncSliceLP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaapiProfileEntrypoint {
    pub profile: String,
    pub entrypoint: String,
    #[serde(default)]
    pub rate_control_modes: BTreeSet<RateControlMode>,
}

impl VaapiProfileEntrypoint {
    fn is_decode(&self) -> bool {
        self.entrypoint == ENTRYPOINT_DECODE
    }

    fn is_encode(&self) -> bool {
        self.entrypoint == ENTRYPOINT_ENCODE || self.entrypoint == ENTRYPOINT_ENCODE_LOW_POWER
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VaapiCapabilities {
    pub entrypoints: Vec<VaapiProfileEntrypoint>,
}

impl VaapiCapabilities {
    pub fn new(entrypoints: Vec<VaapiProfileEntrypoint>) -> Self {
        Self { entrypoints }
    }

    pub fn can_decode(
        &self,
        format: VideoFormat,
        profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        let profiles = va_profiles(format, profile, bit_depth_of(pixel_format));
        self.entrypoints
            .iter()
            .any(|e| e.is_decode() && profiles.contains(&e.profile.as_str()))
    }

    pub fn can_encode(
        &self,
        format: VideoFormat,
        profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        let profiles = va_profiles(format, profile, bit_depth_of(pixel_format));
        self.entrypoints
            .iter()
            .any(|e| e.is_encode() && profiles.contains(&e.profile.as_str()))
    }

    /// Preferred rate-control mode for encoding: VBR, then CBR, then CQP.
    pub fn rate_control_mode(
        &self,
        format: VideoFormat,
        pixel_format: Option<PixelFormat>,
    ) -> Option<RateControlMode> {
        let profiles = va_profiles(format, None, bit_depth_of(pixel_format));
        let modes: BTreeSet<RateControlMode> = self
            .entrypoints
            .iter()
            .filter(|e| e.is_encode() && profiles.contains(&e.profile.as_str()))
            .flat_map(|e| e.rate_control_modes.iter().copied())
            .collect();
        [RateControlMode::Vbr, RateControlMode::Cbr, RateControlMode::Cqp]
            .into_iter()
            .find(|m| modes.contains(m))
    }
}

/// VA profiles able to carry a codec at a bit depth.
fn va_profiles(format: VideoFormat, profile: Option<&str>, bit_depth: u8) -> Vec<&'static str> {
    let ten_bit = bit_depth > 8;
    match format {
        VideoFormat::H264 if ten_bit => vec![],
        VideoFormat::H264 => match profile.map(|p| p.to_ascii_lowercase()).as_deref() {
            Some("baseline") | Some("constrained baseline") => {
                vec!["VAProfileH264ConstrainedBaseline"]
            }
            Some("main") => vec!["VAProfileH264Main"],
            Some("high") => vec!["VAProfileH264High"],
            _ => vec!["VAProfileH264Main", "VAProfileH264High"],
        },
        VideoFormat::Hevc if ten_bit => vec!["VAProfileHEVCMain10"],
        VideoFormat::Hevc => vec!["VAProfileHEVCMain"],
        VideoFormat::Mpeg2Video => vec!["VAProfileMPEG2Simple", "VAProfileMPEG2Main"],
        VideoFormat::Vc1 => vec![
            "VAProfileVC1Simple",
            "VAProfileVC1Main",
            "VAProfileVC1Advanced",
        ],
        VideoFormat::Vp8 => vec!["VAProfileVP8Version0_3"],
        VideoFormat::Vp9 if ten_bit => vec!["VAProfileVP9Profile2"],
        VideoFormat::Vp9 => vec!["VAProfileVP9Profile0"],
        VideoFormat::Av1 => vec!["VAProfileAV1Profile0"],
        _ => vec![],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Searching,
    InEntrypoint(usize),
}

/// Line-at-a-time scanner over `vainfo` text.
#[derive(Debug)]
pub struct VaapiInfoScanner {
    state: ScanState,
    entrypoints: Vec<VaapiProfileEntrypoint>,
}

impl Default for VaapiInfoScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl VaapiInfoScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Searching,
            entrypoints: Vec::new(),
        }
    }

    pub fn feed_line(&mut self, line: &str) {
        if let Some(caps) = PROFILE_ENTRYPOINT_RE.captures(line) {
            let profile = &caps[1];
            let entrypoint = &caps[2];
            let index = match self
                .entrypoints
                .iter()
                .position(|e| e.profile == profile && e.entrypoint == entrypoint)
            {
                Some(index) => index,
                None => {
                    self.entrypoints.push(VaapiProfileEntrypoint {
                        profile: profile.to_string(),
                        entrypoint: entrypoint.to_string(),
                        rate_control_modes: BTreeSet::new(),
                    });
                    self.entrypoints.len() - 1
                }
            };
            self.state = ScanState::InEntrypoint(index);
            return;
        }

        match self.state {
            ScanState::Searching => {}
            ScanState::InEntrypoint(_) if line.trim().is_empty() => {
                self.state = ScanState::Searching;
            }
            ScanState::InEntrypoint(index) => {
                if let Some(caps) = RATE_CONTROL_RE.captures(line) {
                    let mode = match &caps[1] {
                        "CQP" => Some(RateControlMode::Cqp),
                        "CBR" => Some(RateControlMode::Cbr),
                        "VBR" => Some(RateControlMode::Vbr),
                        _ => None,
                    };
                    if let Some(mode) = mode {
                        self.entrypoints[index].rate_control_modes.insert(mode);
                    }
                }
            }
        }
    }

    /// `None` when no entrypoint was seen: the hardware is unusable.
    pub fn finish(self) -> Option<VaapiCapabilities> {
        if self.entrypoints.is_empty() {
            None
        } else {
            Some(VaapiCapabilities::new(self.entrypoints))
        }
    }
}

pub fn parse_vainfo(output: &str) -> Option<VaapiCapabilities> {
    let mut scanner = VaapiInfoScanner::new();
    for line in output.lines() {
        scanner.feed_line(line);
    }
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAINFO_HEVC: &str = "\
libva info: VA-API version 1.20.0
vainfo: Driver version: Intel iHD driver for Intel(R) Gen Graphics - 24.1.0
vainfo: Supported profile and entrypoints
      VAProfileHEVCMain               :\tVAEntrypointVLD
      VAProfileHEVCMain               :\tVAEntrypointEncSlice
      VAProfileHEVCMain10             :\tVAEntrypointVLD
      VAProfileHEVCMain10             :\tVAEntrypointEncSlice
";

    const VAINFO_ATTRIBUTES: &str = "\
VAProfileH264Main/VAEntrypointEncSlice
    VAConfigAttribRTFormat         : VA_RT_FORMAT_YUV420
    VAConfigAttribRateControl      : VA_RC_CBR
                                     VA_RC_VBR
                                     VA_RC_CQP
                                     VA_RC_ICQ

VAProfileH264High/VAEntrypointEncSliceLP
    VAConfigAttribRateControl      : VA_RC_CQP

    VA_RC_VBR
";

    #[test]
    fn hevc_main_and_main10_encode() {
        let caps = parse_vainfo(VAINFO_HEVC).unwrap();
        assert!(caps.can_encode(VideoFormat::Hevc, None, Some(PixelFormat::YUV420P)));
        assert!(caps.can_encode(VideoFormat::Hevc, None, Some(PixelFormat::YUV420P10LE)));
        assert!(caps.can_decode(VideoFormat::Hevc, None, Some(PixelFormat::YUV420P10LE)));
        assert!(!caps.can_decode(VideoFormat::H264, None, None));
    }

    #[test]
    fn no_entrypoints_yields_none() {
        assert!(parse_vainfo("vainfo: Supported profile and entrypoints\n").is_none());
        assert!(parse_vainfo("").is_none());
        assert!(parse_vainfo("error: failed to initialize display").is_none());
    }

    #[test]
    fn rate_control_lines_attach_to_open_block_only() {
        let caps = parse_vainfo(VAINFO_ATTRIBUTES).unwrap();
        assert_eq!(caps.entrypoints.len(), 2);
        let main = &caps.entrypoints[0];
        assert_eq!(
            main.rate_control_modes.iter().copied().collect::<Vec<_>>(),
            vec![RateControlMode::Cqp, RateControlMode::Cbr, RateControlMode::Vbr]
        );
        // the stray VBR line after the blank line is outside any block
        let high = &caps.entrypoints[1];
        assert_eq!(
            high.rate_control_modes.iter().copied().collect::<Vec<_>>(),
            vec![RateControlMode::Cqp]
        );
    }

    #[test]
    fn prefers_vbr_then_falls_back_to_cqp() {
        let caps = parse_vainfo(VAINFO_ATTRIBUTES).unwrap();
        assert_eq!(
            caps.rate_control_mode(VideoFormat::H264, None),
            Some(RateControlMode::Vbr)
        );
        let cqp_only = VaapiCapabilities::new(vec![caps.entrypoints[1].clone()]);
        assert_eq!(
            cqp_only.rate_control_mode(VideoFormat::H264, None),
            Some(RateControlMode::Cqp)
        );
        assert!(cqp_only.rate_control_mode(VideoFormat::Hevc, None).is_none());
    }

    #[test]
    fn header_regex_handles_both_layouts() {
        let plain = PROFILE_ENTRYPOINT_RE
            .captures("      VAProfileVP9Profile0            :\tVAEntrypointVLD")
            .unwrap();
        assert_eq!(&plain[1], "VAProfileVP9Profile0");
        assert_eq!(&plain[2], "VAEntrypointVLD");
        let slashed = PROFILE_ENTRYPOINT_RE
            .captures("VAProfileAV1Profile0/VAEntrypointEncSliceLP")
            .unwrap();
        assert_eq!(&slashed[2], "VAEntrypointEncSliceLP");
        assert!(RATE_CONTROL_RE.captures("VA_RT_FORMAT_YUV420").is_none());
    }
}
