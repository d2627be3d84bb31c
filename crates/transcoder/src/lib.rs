pub mod capabilities;
pub mod command;
pub mod decision;
pub mod decoder;
pub mod encoder;
pub mod ffprobe;
pub mod filter;
pub mod hls;
pub mod input;
pub mod pipeline;
pub mod probe;
pub mod step;
pub mod stream;

use std::path::PathBuf;

use channelcast_core::{
    FfmpegState, FfmpegVersion, HardwareAccelerationMode, LogLevel, OutputFormat, ReportConfig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use command::{CommandGenerator, FfmpegCommand};
pub use input::lavfi::{ErrorAudio, ErrorScreen};
pub use pipeline::{Pipeline, PipelineBuilder};

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("pipeline has no video input")]
    MissingVideoInput,
    #[error("error screen mode {0} has no filter chain")]
    ErrorScreenUnsupported(String),
    #[error("invalid build request: {0}")]
    InvalidRequest(String),
    #[error("probe failed: {0}")]
    ProbeFailed(String),
    #[error("binary not found at {0}")]
    BinaryNotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Global transcoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub vainfo_path: PathBuf,
    pub nvidia_smi_path: PathBuf,
    pub hardware_acceleration: HardwareAccelerationMode,
    pub vaapi_device: Option<String>,
    pub vaapi_driver: Option<String>,
    pub thread_count: Option<u32>,
    pub software_scaling_algorithm: String,
    pub software_deinterlace_filter: String,
    /// When set, every run writes an `FFREPORT` log into this directory.
    pub report_directory: Option<PathBuf>,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            vainfo_path: PathBuf::from("vainfo"),
            nvidia_smi_path: PathBuf::from("nvidia-smi"),
            hardware_acceleration: HardwareAccelerationMode::None,
            vaapi_device: None,
            vaapi_driver: None,
            thread_count: None,
            software_scaling_algorithm: "bicubic".into(),
            software_deinterlace_filter: "yadif=1".into(),
            report_directory: None,
        }
    }
}

impl TranscoderConfig {
    /// Seed the per-session tool state from this configuration.
    pub fn ffmpeg_state(&self, version: FfmpegVersion, output_format: OutputFormat) -> FfmpegState {
        let report = self.report_directory.as_ref().map(|dir| ReportConfig {
            path: dir.join("ffmpeg-%t.log").to_string_lossy().into_owned(),
            level: LogLevel::Debug,
        });
        FfmpegState {
            version,
            output_format,
            thread_count: self.thread_count,
            software_scaling_algorithm: self.software_scaling_algorithm.clone(),
            software_deinterlace_filter: self.software_deinterlace_filter.clone(),
            vaapi_device: self.vaapi_device.clone(),
            vaapi_driver: self.vaapi_driver.clone(),
            report,
            ..FfmpegState::default()
        }
    }
}

/// Per-build switches.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub disable_hardware_decoding: bool,
    pub disable_hardware_encoding: bool,
    pub disable_hardware_filters: bool,
    pub tonemap_hdr: bool,
    pub error_screen: ErrorScreen,
    pub error_audio: ErrorAudio,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_seeds_ffmpeg_state() {
        let config = TranscoderConfig {
            thread_count: Some(2),
            vaapi_driver: Some("iHD".into()),
            report_directory: Some(PathBuf::from("/var/log/channelcast")),
            ..TranscoderConfig::default()
        };
        let state = config.ffmpeg_state(FfmpegVersion::new(6, 1, 0), OutputFormat::MpegTs);
        assert_eq!(state.thread_count, Some(2));
        assert_eq!(state.vaapi_driver.as_deref(), Some("iHD"));
        assert_eq!(state.software_scaling_algorithm, "bicubic");
        let report = state.report.unwrap();
        assert_eq!(report.path, "/var/log/channelcast/ffmpeg-%t.log");
        assert_eq!(report.level, LogLevel::Debug);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: TranscoderConfig =
            serde_json::from_str(r#"{"hardware_acceleration":"vaapi"}"#).unwrap();
        assert_eq!(config.hardware_acceleration, HardwareAccelerationMode::Vaapi);
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.software_deinterlace_filter, "yadif=1");
    }
}
