//! Feature probe of the installed tool: version, encoders, filters and
//! hardware acceleration methods, parsed from its listing commands.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use channelcast_core::{FfmpegVersion, HardwareAccelerationMode};
use regex::Regex;
use serde::{Deserialize, Serialize};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\S+ version (\S+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegCapabilities {
    pub version: FfmpegVersion,
    pub encoders: BTreeSet<String>,
    pub decoders: BTreeSet<String>,
    pub filters: BTreeSet<String>,
    pub hwaccels: BTreeSet<String>,
}

impl FfmpegCapabilities {
    pub fn has_encoder(&self, name: &str) -> bool {
        self.encoders.contains(name)
    }

    pub fn has_decoder(&self, name: &str) -> bool {
        self.decoders.contains(name)
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains(name)
    }

    pub fn has_hardware_acceleration(&self, mode: HardwareAccelerationMode) -> bool {
        match mode {
            HardwareAccelerationMode::None => true,
            other => self.hwaccels.contains(other.as_str()),
        }
    }

    /// First encoder of `candidates` the tool was built with.
    pub fn preferred_encoder(&self, candidates: &[&'static str]) -> Option<&'static str> {
        candidates.iter().copied().find(|name| self.has_encoder(name))
    }

    /// Build from raw listing output. Unparseable sections leave the
    /// corresponding set empty.
    pub fn from_listings(
        version: &str,
        encoders: &str,
        decoders: &str,
        filters: &str,
        hwaccels: &str,
    ) -> Self {
        Self {
            version: parse_version(version).unwrap_or_default(),
            encoders: parse_codec_listing(encoders),
            decoders: parse_codec_listing(decoders),
            filters: parse_filters(filters),
            hwaccels: parse_hwaccels(hwaccels),
        }
    }
}

/// Version from the first banner line, e.g. `ffmpeg version 6.1.1 Copyright...`.
pub fn parse_version(output: &str) -> Option<FfmpegVersion> {
    let caps = VERSION_RE.captures(output)?;
    caps[1].parse().ok()
}

/// Names from `-encoders` / `-decoders`. Entries follow the `------` rule;
/// each line is a six-character flag column and the codec name.
pub fn parse_codec_listing(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let flags = tokens.next()?;
            let name = tokens.next()?;
            (flags.len() == 6).then(|| name.to_string())
        })
        .collect()
}

/// Names from `-filters`: lines whose third column is an `in->out` pad
/// description.
pub fn parse_filters(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().take(3).collect();
            match tokens.as_slice() {
                [_, name, pads] if pads.contains("->") => Some(name.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Names listed under `Hardware acceleration methods:`.
pub fn parse_hwaccels(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .skip_while(|l| !l.starts_with("Hardware acceleration methods"))
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODERS: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
 V....D libkvazaar           libkvazaar H.265 / HEVC (codec hevc)
 A....D aac                  AAC (Advanced Audio Coding)
";

    const FILTERS: &str = "\
Filters:
  T.. = Timeline support
  | = Source or sink filter
 ... scale             V->V       Scale the input video size and/or convert the image format.
 ..C scale_cuda        V->V       GPU accelerated video resizer
 T.C overlay_cuda      VV->V      Overlay one video on top of another using CUDA
 ... anullsrc          |->A       Null audio source, return empty audio frames.
";

    const HWACCELS: &str = "\
Hardware acceleration methods:
vdpau
cuda
vaapi

";

    #[test]
    fn parses_encoder_listing_after_rule() {
        let encoders = parse_codec_listing(ENCODERS);
        assert!(encoders.contains("libx264"));
        assert!(encoders.contains("h264_nvenc"));
        assert!(encoders.contains("aac"));
        assert!(!encoders.contains("="));
        assert_eq!(encoders.len(), 4);
    }

    #[test]
    fn parses_filters_by_pad_column() {
        let filters = parse_filters(FILTERS);
        assert!(filters.contains("scale_cuda"));
        assert!(filters.contains("overlay_cuda"));
        assert!(filters.contains("anullsrc"));
        assert!(!filters.contains("="));
    }

    #[test]
    fn parses_hwaccels_and_version() {
        let caps = FfmpegCapabilities::from_listings(
            "ffmpeg version 6.1.1 Copyright (c) 2000-2023 the FFmpeg developers",
            ENCODERS,
            "",
            FILTERS,
            HWACCELS,
        );
        assert_eq!(caps.version, FfmpegVersion::new(6, 1, 1));
        assert!(caps.has_hardware_acceleration(HardwareAccelerationMode::Cuda));
        assert!(!caps.has_hardware_acceleration(HardwareAccelerationMode::Qsv));
        assert!(caps.has_hardware_acceleration(HardwareAccelerationMode::None));
    }

    #[test]
    fn preferred_encoder_takes_first_present() {
        let caps = FfmpegCapabilities::from_listings("", ENCODERS, "", "", "");
        assert_eq!(caps.preferred_encoder(&["libx265", "libkvazaar"]), Some("libkvazaar"));
        assert_eq!(caps.preferred_encoder(&["libsvtav1"]), None);
        assert_eq!(caps.version, FfmpegVersion::default());
    }
}
