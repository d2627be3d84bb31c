use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{HardwareAccelerationMode, LogLevel};

/// Parsed version of the external tool.
///
/// Ordering compares `(major, minor, patch)`; builds whose banner carries
/// no release number parse as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FfmpegVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FfmpegVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }
}

impl FromStr for FfmpegVersion {
    type Err = CoreError;

    /// Accepts `6.1.1`, `n7.0`, `7.1-static`, `5.1.4-0ubuntu1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('n');
        let numeric: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let mut parts = numeric.split('.').filter(|p| !p.is_empty());
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| CoreError::InvalidVersion(s.to_string()))?;
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        Ok(Self::new(major, minor, patch))
    }
}

impl std::fmt::Display for FfmpegVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HlsSegmentType {
    #[default]
    MpegTs,
    Fmp4,
}

/// Segmenting options for HLS output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HlsOptions {
    /// Target segment length in seconds.
    pub hls_time: u32,
    pub hls_list_size: u32,
    pub hls_delete_threshold: Option<u32>,
    pub segment_type: HlsSegmentType,
    /// Directory the playlist is written to.
    pub stream_base_path: String,
    /// Playlist file name template.
    pub stream_name_format: String,
    /// Directory segments are written to.
    pub segment_base_directory: String,
    /// Segment file name template.
    pub segment_name_format: String,
    pub stream_base_url: Option<String>,
    pub one_second_gop: bool,
    /// First transcode of the channel session: start a fresh playlist
    /// instead of continuing one.
    pub is_first_transcode: bool,
    pub delete_segments: bool,
}

impl Default for HlsOptions {
    fn default() -> Self {
        Self {
            hls_time: 4,
            hls_list_size: 0,
            hls_delete_threshold: None,
            segment_type: HlsSegmentType::MpegTs,
            stream_base_path: ".".into(),
            stream_name_format: "stream.m3u8".into(),
            segment_base_directory: ".".into(),
            segment_name_format: "data%06d.ts".into(),
            stream_base_url: None,
            one_second_gop: false,
            is_first_transcode: true,
            delete_segments: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashOptions {
    pub seg_duration: u32,
    pub window_size: u32,
    pub manifest_path: String,
}

impl Default for DashOptions {
    fn default() -> Self {
        Self {
            seg_duration: 4,
            window_size: 5,
            manifest_path: "manifest.mpd".into(),
        }
    }
}

/// Output container or segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    MpegTs,
    Mkv,
    Mp4,
    Hls(HlsOptions),
    Nut,
    Dash(DashOptions),
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MpegTs => "mpegts",
            Self::Mkv => "matroska",
            Self::Mp4 => "mp4",
            Self::Hls(_) => "hls",
            Self::Nut => "nut",
            Self::Dash(_) => "dash",
        }
    }

    pub fn is_segmented(&self) -> bool {
        matches!(self, Self::Hls(_) | Self::Dash(_))
    }

    /// Whether uncompressed frames of `bit_depth` can be written to this
    /// container. Raw frames deeper than 8 bits pass through NUT only.
    pub fn carries_raw_video(&self, bit_depth: u8) -> bool {
        match self {
            Self::Nut => true,
            Self::Mkv => bit_depth <= 8,
            _ => false,
        }
    }
}

/// File reporting for one run of the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub path: String,
    #[serde(default)]
    pub level: LogLevel,
}

/// Per-session settings of the external tool.
///
/// Built once per compile. Only the two acceleration modes are assigned
/// during the hardware phase; everything else is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegState {
    pub decoder_hw_accel_mode: HardwareAccelerationMode,
    pub encoder_hw_accel_mode: HardwareAccelerationMode,
    pub version: FfmpegVersion,
    #[serde(with = "crate::duration_ms::option")]
    pub start: Option<Duration>,
    #[serde(with = "crate::duration_ms::option")]
    pub duration: Option<Duration>,
    /// In video track timescale units.
    pub pts_offset: Option<i64>,
    pub thread_count: Option<u32>,
    pub output_format: OutputFormat,
    pub software_scaling_algorithm: String,
    pub software_deinterlace_filter: String,
    pub vaapi_device: Option<String>,
    pub vaapi_driver: Option<String>,
    pub qsv_extra_hardware_frames: Option<u32>,
    pub log_level: LogLevel,
    pub report: Option<ReportConfig>,
    pub metadata_service_provider: Option<String>,
    pub metadata_service_name: Option<String>,
}

impl Default for FfmpegState {
    fn default() -> Self {
        Self {
            decoder_hw_accel_mode: HardwareAccelerationMode::None,
            encoder_hw_accel_mode: HardwareAccelerationMode::None,
            version: FfmpegVersion::default(),
            start: None,
            duration: None,
            pts_offset: None,
            thread_count: None,
            output_format: OutputFormat::MpegTs,
            software_scaling_algorithm: "bicubic".into(),
            software_deinterlace_filter: "yadif=1".into(),
            vaapi_device: None,
            vaapi_driver: None,
            qsv_extra_hardware_frames: None,
            log_level: LogLevel::Error,
            report: None,
            metadata_service_provider: None,
            metadata_service_name: None,
        }
    }
}

impl FfmpegState {
    pub fn vaapi_device_or_default(&self) -> &str {
        self.vaapi_device.as_deref().unwrap_or("/dev/dri/renderD128")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_release_banners() {
        assert_eq!("6.1.1".parse::<FfmpegVersion>().unwrap(), FfmpegVersion::new(6, 1, 1));
        assert_eq!("n7.0".parse::<FfmpegVersion>().unwrap(), FfmpegVersion::new(7, 0, 0));
        assert_eq!(
            "5.1.4-0ubuntu1".parse::<FfmpegVersion>().unwrap(),
            FfmpegVersion::new(5, 1, 4)
        );
        assert!("N-113402-g".parse::<FfmpegVersion>().is_err());
    }

    #[test]
    fn version_gates_compare_major_then_minor() {
        let v = FfmpegVersion::new(6, 1, 0);
        assert!(v.at_least(5, 0));
        assert!(v.at_least(6, 1));
        assert!(!v.at_least(7, 0));
    }

    #[test]
    fn output_format_is_tagged() {
        let f: OutputFormat = serde_json::from_str(r#"{"type":"hls","hls_time":6}"#).unwrap();
        match f {
            OutputFormat::Hls(opts) => {
                assert_eq!(opts.hls_time, 6);
                assert_eq!(opts.segment_name_format, "data%06d.ts");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn deep_raw_video_needs_nut() {
        assert!(OutputFormat::Nut.carries_raw_video(10));
        assert!(OutputFormat::Mkv.carries_raw_video(8));
        assert!(!OutputFormat::Mkv.carries_raw_video(10));
        assert!(!OutputFormat::MpegTs.carries_raw_video(8));
    }
}
