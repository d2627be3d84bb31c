//! Hardware and tool detection.
//!
//! Runs the tool's listing commands plus `vainfo` / `nvidia-smi` and feeds
//! their output to the pure parsers in [`crate::capabilities`]. Probe
//! failures degrade to "no capability"; they never abort a caller.

use std::path::Path;

use channelcast_core::HardwareAccelerationMode;
use tracing::{info, warn};

use crate::capabilities::ffmpeg::FfmpegCapabilities;
use crate::capabilities::nvidia::parse_nvidia_smi;
use crate::capabilities::vaapi::parse_vainfo;
use crate::capabilities::{HardwareCapabilities, QsvCapabilities, VideoToolboxCapabilities};
use crate::{TranscodeError, TranscoderConfig};

/// Query version, encoders, decoders, filters and hwaccels of the tool.
pub async fn detect_ffmpeg(ffmpeg_path: &Path) -> FfmpegCapabilities {
    let version = run_listing(ffmpeg_path, &["-version"]).await;
    let encoders = run_listing(ffmpeg_path, &["-hide_banner", "-encoders"]).await;
    let decoders = run_listing(ffmpeg_path, &["-hide_banner", "-decoders"]).await;
    let filters = run_listing(ffmpeg_path, &["-hide_banner", "-filters"]).await;
    let hwaccels = run_listing(ffmpeg_path, &["-hide_banner", "-hwaccels"]).await;

    let caps =
        FfmpegCapabilities::from_listings(&version, &encoders, &decoders, &filters, &hwaccels);
    info!(
        version = %caps.version,
        encoders = caps.encoders.len(),
        filters = caps.filters.len(),
        hwaccels = ?caps.hwaccels,
        "ffmpeg feature probe complete"
    );
    caps
}

/// Detect the capabilities of the configured acceleration backend.
pub async fn detect_hardware(
    config: &TranscoderConfig,
    ffmpeg: &FfmpegCapabilities,
) -> HardwareCapabilities {
    let mode = config.hardware_acceleration;
    if !mode.is_hardware() {
        return HardwareCapabilities::None;
    }
    if !ffmpeg.has_hardware_acceleration(mode) {
        warn!(%mode, "hardware acceleration not compiled into ffmpeg, using software");
        return HardwareCapabilities::None;
    }

    let caps = match mode {
        HardwareAccelerationMode::None => HardwareCapabilities::None,
        HardwareAccelerationMode::Cuda => {
            let args = ["--query-gpu=name,compute_cap", "--format=csv,noheader"];
            match run_tool(&config.nvidia_smi_path, &args).await {
                Ok(output) => parse_nvidia_smi(&output)
                    .map(HardwareCapabilities::Nvidia)
                    .unwrap_or_default(),
                Err(e) => {
                    warn!(error = %e, "nvidia-smi probe failed");
                    HardwareCapabilities::None
                }
            }
        }
        HardwareAccelerationMode::Vaapi => detect_vaapi(config).await,
        HardwareAccelerationMode::Qsv => {
            let decoders = ffmpeg
                .decoders
                .iter()
                .filter(|name| name.ends_with("_qsv"))
                .cloned();
            HardwareCapabilities::Qsv(QsvCapabilities::new(detect_vaapi(config).await, decoders))
        }
        HardwareAccelerationMode::VideoToolbox => {
            HardwareCapabilities::VideoToolbox(VideoToolboxCapabilities::default())
        }
    };

    info!(?caps, "hardware capability detection complete");
    caps
}

async fn detect_vaapi(config: &TranscoderConfig) -> HardwareCapabilities {
    let device = config
        .vaapi_device
        .as_deref()
        .unwrap_or("/dev/dri/renderD128");
    let mut command = tokio::process::Command::new(&config.vainfo_path);
    command.args(["--display", "drm", "--device", device, "-a"]);
    if let Some(driver) = &config.vaapi_driver {
        command.env("LIBVA_DRIVER_NAME", driver);
    }

    let output = match command.output().await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, device, "could not run vainfo");
            return HardwareCapabilities::None;
        }
    };

    let text = String::from_utf8_lossy(&output.stdout);
    match parse_vainfo(&text) {
        Some(caps) => HardwareCapabilities::Vaapi(caps),
        None => {
            warn!(device, "vainfo reported no profiles, hardware unusable");
            HardwareCapabilities::None
        }
    }
}

/// Listing output, or empty text when the command cannot run.
async fn run_listing(path: &Path, args: &[&str]) -> String {
    match run_tool(path, args).await {
        Ok(output) => output,
        Err(e) => {
            info!(error = %e, ?args, "ffmpeg listing unavailable");
            String::new()
        }
    }
}

async fn run_tool(path: &Path, args: &[&str]) -> Result<String, TranscodeError> {
    let output = tokio::process::Command::new(path)
        .args(args)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TranscodeError::BinaryNotFound(path.into()),
            _ => TranscodeError::Io(e),
        })?;

    if !output.status.success() {
        return Err(TranscodeError::ProbeFailed(format!(
            "{} {} exited with {}",
            path.display(),
            args.join(" "),
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Check if a VAAPI render node exists (Linux).
pub fn vaapi_device_exists(device: &str) -> bool {
    Path::new(device).exists()
}
