//! Video and audio encoders.
//!
//! Preference when picking a video encoder: the backend's hardware encoder,
//! then the first software encoder the installed tool was built with, then
//! leaving the choice to the tool.

use channelcast_core::{AudioFormat, FrameState, HardwareSurface, VideoFormat};

use crate::capabilities::RateControlMode;
use crate::capabilities::ffmpeg::FfmpegCapabilities;
use crate::step::FrameStateTransition;

/// Where an encoder needs its input frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredLocation {
    Any,
    Software,
    Hardware(HardwareSurface),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEncoder {
    Copy,
    /// No software encoder for the format was found; the tool picks one.
    Implicit(VideoFormat),
    Software {
        format: VideoFormat,
        name: &'static str,
    },
    Nvenc(VideoFormat),
    Qsv(VideoFormat),
    Vaapi {
        format: VideoFormat,
        rate_control: Option<RateControlMode>,
    },
    VideoToolbox(VideoFormat),
}

/// Software encoders per format, most preferred first.
fn software_candidates(format: VideoFormat) -> &'static [&'static str] {
    match format {
        VideoFormat::H264 => &["libx264"],
        VideoFormat::Hevc => &["libx265", "libkvazaar"],
        VideoFormat::Mpeg2Video => &["mpeg2video"],
        VideoFormat::Mpeg4 => &["mpeg4"],
        VideoFormat::Av1 => &["libsvtav1", "libaom-av1"],
        VideoFormat::Vp9 => &["libvpx-vp9"],
        VideoFormat::RawVideo => &["rawvideo"],
        _ => &[],
    }
}

impl VideoEncoder {
    pub fn software(format: VideoFormat, ffmpeg: &FfmpegCapabilities) -> Self {
        if format == VideoFormat::Copy {
            return Self::Copy;
        }
        match ffmpeg.preferred_encoder(software_candidates(format)) {
            Some(name) => Self::Software { format, name },
            None => Self::Implicit(format),
        }
    }

    pub fn format(&self) -> VideoFormat {
        match self {
            Self::Copy => VideoFormat::Copy,
            Self::Implicit(format)
            | Self::Software { format, .. }
            | Self::Nvenc(format)
            | Self::Qsv(format)
            | Self::Vaapi { format, .. }
            | Self::VideoToolbox(format) => *format,
        }
    }

    /// Codec name passed to `-c:v`.
    pub fn name(&self) -> Option<String> {
        // hardware encoders are named after the short codec name
        let format = match self.format() {
            VideoFormat::Mpeg2Video => "mpeg2",
            other => other.as_str(),
        };
        match self {
            Self::Copy => Some("copy".into()),
            Self::Implicit(_) => None,
            Self::Software { name, .. } => Some((*name).into()),
            Self::Nvenc(_) => Some(format!("{format}_nvenc")),
            Self::Qsv(_) => Some(format!("{format}_qsv")),
            Self::Vaapi { .. } => Some(format!("{format}_vaapi")),
            Self::VideoToolbox(_) => Some(format!("{format}_videotoolbox")),
        }
    }

    pub fn required_location(&self) -> RequiredLocation {
        match self {
            Self::Copy => RequiredLocation::Any,
            Self::Implicit(_) | Self::Software { .. } | Self::VideoToolbox(_) => {
                RequiredLocation::Software
            }
            Self::Nvenc(_) => RequiredLocation::Hardware(HardwareSurface::Cuda),
            Self::Qsv(_) => RequiredLocation::Hardware(HardwareSurface::Qsv),
            Self::Vaapi { .. } => RequiredLocation::Hardware(HardwareSurface::Vaapi),
        }
    }

    pub fn is_hardware(&self) -> bool {
        matches!(self.required_location(), RequiredLocation::Hardware(_))
            || matches!(self, Self::VideoToolbox(_))
    }

    /// Whether `-preset:v` means anything to this encoder.
    pub fn supports_preset(&self) -> bool {
        match self {
            Self::Software { name, .. } => matches!(*name, "libx264" | "libx265" | "libsvtav1"),
            Self::Nvenc(_) | Self::Qsv(_) => true,
            _ => false,
        }
    }

    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(name) = self.name() {
            args.push("-c:v".to_string());
            args.push(name);
        }
        if let Self::Vaapi {
            rate_control: Some(mode),
            ..
        } = self
        {
            args.push("-rc_mode".into());
            args.push(mode.as_str().into());
        }
        args
    }
}

impl FrameStateTransition for VideoEncoder {
    fn affects_frame_state(&self) -> bool {
        !matches!(self, Self::Copy)
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        match self {
            Self::Copy => current.clone(),
            encoder => FrameState {
                video_format: encoder.format(),
                ..current.clone()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioEncoder {
    pub format: AudioFormat,
}

impl AudioEncoder {
    pub fn new(format: AudioFormat) -> Self {
        Self { format }
    }

    pub fn arguments(&self) -> Vec<String> {
        vec!["-c:a".into(), self.format.as_str().into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::ffmpeg::parse_codec_listing;

    fn ffmpeg(encoders: &[&str]) -> FfmpegCapabilities {
        let listing: String = std::iter::once(" ------".to_string())
            .chain(encoders.iter().map(|e| format!(" V....D {e}  test")))
            .collect::<Vec<_>>()
            .join("\n");
        FfmpegCapabilities {
            encoders: parse_codec_listing(&listing),
            ..FfmpegCapabilities::default()
        }
    }

    #[test]
    fn software_preference_falls_through_to_kvazaar() {
        let encoder = VideoEncoder::software(VideoFormat::Hevc, &ffmpeg(&["libkvazaar"]));
        assert_eq!(encoder.name().as_deref(), Some("libkvazaar"));
        let implicit = VideoEncoder::software(VideoFormat::Av1, &ffmpeg(&["libx264"]));
        assert_eq!(implicit, VideoEncoder::Implicit(VideoFormat::Av1));
        assert!(implicit.arguments().is_empty());
    }

    #[test]
    fn vaapi_carries_rate_control() {
        let encoder = VideoEncoder::Vaapi {
            format: VideoFormat::Hevc,
            rate_control: Some(RateControlMode::Cqp),
        };
        assert_eq!(encoder.arguments(), ["-c:v", "hevc_vaapi", "-rc_mode", "CQP"]);
        assert_eq!(
            encoder.required_location(),
            RequiredLocation::Hardware(HardwareSurface::Vaapi)
        );
    }

    #[test]
    fn copy_never_touches_frame_state() {
        let state = FrameState::new(VideoFormat::H264, Default::default());
        assert!(!VideoEncoder::Copy.affects_frame_state());
        assert_eq!(VideoEncoder::Copy.next_state(&state), state);
        let next = VideoEncoder::Nvenc(VideoFormat::Hevc).next_state(&state);
        assert_eq!(next.video_format, VideoFormat::Hevc);
    }
}
