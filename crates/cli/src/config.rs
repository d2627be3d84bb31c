//! Transcoder configuration: an optional JSON file, then `CHANNELCAST_*`
//! environment overrides.

use std::path::Path;

use anyhow::Context;
use channelcast_core::HardwareAccelerationMode;
use channelcast_transcoder::TranscoderConfig;
use tracing::{debug, warn};

pub fn load(path: Option<&Path>) -> anyhow::Result<TranscoderConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text).context("failed to parse config")?
        }
        None => TranscoderConfig::default(),
    };
    Ok(apply_env(config, |name| std::env::var(name).ok()))
}

/// Overlay environment values on `config`. `lookup` stands in for the
/// process environment.
pub fn apply_env(
    mut config: TranscoderConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> TranscoderConfig {
    if let Some(path) = lookup("CHANNELCAST_FFMPEG") {
        config.ffmpeg_path = path.into();
    }
    if let Some(path) = lookup("CHANNELCAST_FFPROBE") {
        config.ffprobe_path = path.into();
    }
    if let Some(path) = lookup("CHANNELCAST_VAINFO") {
        config.vainfo_path = path.into();
    }
    if let Some(path) = lookup("CHANNELCAST_NVIDIA_SMI") {
        config.nvidia_smi_path = path.into();
    }
    if let Some(mode) = lookup("CHANNELCAST_HWACCEL") {
        match parse_mode(&mode) {
            Some(mode) => config.hardware_acceleration = mode,
            None => warn!(value = %mode, "unknown CHANNELCAST_HWACCEL, keeping configured mode"),
        }
    }
    if let Some(device) = lookup("CHANNELCAST_VAAPI_DEVICE") {
        config.vaapi_device = Some(device);
    }
    if let Some(driver) = lookup("CHANNELCAST_VAAPI_DRIVER") {
        config.vaapi_driver = Some(driver);
    }
    if let Some(threads) = lookup("CHANNELCAST_THREADS").and_then(|v| v.parse().ok()) {
        config.thread_count = Some(threads);
    }
    if let Some(dir) = lookup("CHANNELCAST_REPORT_DIR") {
        config.report_directory = Some(dir.into());
    }
    debug!(?config, "transcoder configuration");
    config
}

fn parse_mode(value: &str) -> Option<HardwareAccelerationMode> {
    match value.to_ascii_lowercase().as_str() {
        "none" | "" => Some(HardwareAccelerationMode::None),
        "cuda" | "nvenc" => Some(HardwareAccelerationMode::Cuda),
        "qsv" => Some(HardwareAccelerationMode::Qsv),
        "vaapi" => Some(HardwareAccelerationMode::Vaapi),
        "videotoolbox" => Some(HardwareAccelerationMode::VideoToolbox),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn environment_overrides_config() {
        let env: HashMap<&str, &str> = [
            ("CHANNELCAST_FFMPEG", "/opt/ffmpeg/bin/ffmpeg"),
            ("CHANNELCAST_HWACCEL", "VAAPI"),
            ("CHANNELCAST_VAAPI_DRIVER", "iHD"),
            ("CHANNELCAST_THREADS", "4"),
        ]
        .into_iter()
        .collect();
        let config = apply_env(TranscoderConfig::default(), |name| {
            env.get(name).map(|v| v.to_string())
        });
        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.hardware_acceleration, HardwareAccelerationMode::Vaapi);
        assert_eq!(config.vaapi_driver.as_deref(), Some("iHD"));
        assert_eq!(config.thread_count, Some(4));
    }

    #[test]
    fn unknown_mode_is_ignored() {
        let config = apply_env(TranscoderConfig::default(), |name| {
            (name == "CHANNELCAST_HWACCEL").then(|| "amf".to_string())
        });
        assert_eq!(config.hardware_acceleration, HardwareAccelerationMode::None);
    }
}
