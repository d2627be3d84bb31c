use std::path::Path;

use channelcast_core::{ColorFormat, FrameSize, PixelFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TranscodeError;
use crate::stream::{AudioStream, SubtitleStream, VideoStream};

/// Media information extracted via ffprobe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub container: String,
    pub duration_secs: f64,
    pub bitrate_kbps: Option<u32>,
    pub video: Option<VideoStream>,
    pub audio: Vec<AudioStream>,
    pub subtitles: Vec<SubtitleStream>,
}

/// Run ffprobe on a file or URL and parse the JSON output.
pub async fn probe(ffprobe_path: &Path, locator: &str) -> Result<MediaInfo, TranscodeError> {
    let output = tokio::process::Command::new(ffprobe_path)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(locator)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TranscodeError::BinaryNotFound(ffprobe_path.into()),
            _ => TranscodeError::ProbeFailed(format!("spawn failed: {e}")),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TranscodeError::ProbeFailed(stderr.into_owned()));
    }

    let raw: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| TranscodeError::ProbeFailed(format!("parse JSON: {e}")))?;

    parse_probe_output(&raw)
}

pub fn parse_probe_output(raw: &serde_json::Value) -> Result<MediaInfo, TranscodeError> {
    let format = raw
        .get("format")
        .ok_or_else(|| TranscodeError::ProbeFailed("missing 'format'".into()))?;

    let container = str_field(format, "format_name")
        .unwrap_or("unknown")
        .to_string();

    let duration_secs: f64 = str_field(format, "duration")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0);

    let bitrate_kbps = kbps_field(format, "bit_rate");

    let streams = raw
        .get("streams")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut video = None;
    let mut audio = Vec::new();
    let mut subtitles = Vec::new();

    for s in &streams {
        let codec_type = str_field(s, "codec_type").unwrap_or("");
        let index = u32_field(s, "index").unwrap_or(0);
        let codec = str_field(s, "codec_name").unwrap_or("unknown").to_string();
        let tags = s.get("tags");
        let language = tags
            .and_then(|t| str_field(t, "language"))
            .map(|s| s.to_string());
        let title = tags
            .and_then(|t| str_field(t, "title"))
            .map(|s| s.to_string());
        let disposition = s.get("disposition");
        let flag = |name: &str| {
            disposition
                .and_then(|d| d.get(name))
                .and_then(|v| v.as_u64())
                .unwrap_or(0)
                == 1
        };
        let is_default = flag("default");
        let is_forced = flag("forced");
        let is_attached_pic = flag("attached_pic");
        let frame_size = FrameSize::new(
            u32_field(s, "width").unwrap_or(0),
            u32_field(s, "height").unwrap_or(0),
        );

        match codec_type {
            // cover art is listed as video but never carries the program
            "video" if video.is_none() && !is_attached_pic => {
                let pix_fmt = str_field(s, "pix_fmt");
                let pixel_format = pix_fmt.and_then(|p| p.parse::<PixelFormat>().ok());
                if pixel_format.is_none()
                    && let Some(name) = pix_fmt
                {
                    debug!(pix_fmt = name, "unrecognised pixel format, assuming 8-bit");
                }
                let frame_rate = str_field(s, "avg_frame_rate")
                    .and_then(parse_fraction)
                    .or_else(|| str_field(s, "r_frame_rate").and_then(parse_fraction));

                video = Some(VideoStream {
                    index,
                    codec,
                    profile: str_field(s, "profile").map(|p| p.to_string()),
                    pixel_format,
                    frame_size,
                    sample_aspect_ratio: str_field(s, "sample_aspect_ratio").map(|v| v.to_string()),
                    display_aspect_ratio: str_field(s, "display_aspect_ratio")
                        .map(|v| v.to_string()),
                    frame_rate,
                    field_order: str_field(s, "field_order").map(|v| v.to_string()),
                    bitrate_kbps: kbps_field(s, "bit_rate"),
                    color_format: ColorFormat {
                        color_range: str_field(s, "color_range").map(|v| v.to_string()),
                        color_space: str_field(s, "color_space").map(|v| v.to_string()),
                        color_transfer: str_field(s, "color_transfer").map(|v| v.to_string()),
                        color_primaries: str_field(s, "color_primaries").map(|v| v.to_string()),
                    },
                    is_attached_pic,
                });
            }
            "audio" => {
                audio.push(AudioStream {
                    index,
                    codec,
                    channels: u32_field(s, "channels").unwrap_or(2),
                    sample_rate: str_field(s, "sample_rate").and_then(|r| r.parse().ok()),
                    language,
                    title,
                    is_default,
                });
            }
            "subtitle" => {
                subtitles.push(SubtitleStream {
                    index,
                    codec,
                    language,
                    title,
                    is_forced,
                    is_default,
                    frame_size: (!frame_size.is_empty()).then_some(frame_size),
                });
            }
            _ => {}
        }
    }

    Ok(MediaInfo {
        container,
        duration_secs,
        bitrate_kbps,
        video,
        audio,
        subtitles,
    })
}

fn str_field<'a>(value: &'a serde_json::Value, name: &str) -> Option<&'a str> {
    value.get(name).and_then(|v| v.as_str())
}

fn u32_field(value: &serde_json::Value, name: &str) -> Option<u32> {
    value
        .get(name)
        .and_then(|v| v.as_u64())
        .and_then(|v| u32::try_from(v).ok())
}

fn kbps_field(value: &serde_json::Value, name: &str) -> Option<u32> {
    str_field(value, name)
        .and_then(|s| s.parse::<u64>().ok())
        .and_then(|b| u32::try_from(b / 1000).ok())
}

fn parse_fraction(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let n: f64 = num.parse().ok()?;
        let d: f64 = den.parse().ok()?;
        if d > 0.0 { Some(n / d) } else { None }
    } else {
        s.parse().ok()
    }
}
