//! Desired-state planning: what the encoder should receive for a probed
//! stream and an output profile.

use channelcast_core::{FrameSize, FrameState, SoftwarePixelFormat, VideoFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stream::VideoStream;

/// How the source picture is fitted into the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Keep the display shape and letterbox or pillarbox the rest.
    #[default]
    ScaleAndPad,
    /// Fill the box, ignoring the display shape.
    Stretch,
    /// Keep the display shape, cover the box and trim the overflow.
    Crop,
}

/// Output a channel asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputProfile {
    pub target_size: FrameSize,
    pub video_format: VideoFormat,
    pub bit_depth: u8,
    pub video_profile: Option<String>,
    pub video_preset: Option<String>,
    /// kbit/s
    pub video_bitrate: Option<u32>,
    /// kbit
    pub video_buffer_size: Option<u32>,
    pub frame_rate: Option<f64>,
    /// Deinterlace sources that report an interlaced field order.
    pub deinterlace: bool,
    pub scaling: ScalingMode,
    pub video_track_timescale: Option<u32>,
    pub realtime: bool,
}

impl Default for OutputProfile {
    fn default() -> Self {
        Self {
            target_size: FrameSize::new(1920, 1080),
            video_format: VideoFormat::H264,
            bit_depth: 8,
            video_profile: None,
            video_preset: None,
            video_bitrate: Some(2000),
            video_buffer_size: Some(4000),
            frame_rate: None,
            deinterlace: true,
            scaling: ScalingMode::ScaleAndPad,
            video_track_timescale: Some(90_000),
            realtime: false,
        }
    }
}

/// Frame state the pipeline must converge on.
pub fn desired_state(video: &VideoStream, profile: &OutputProfile) -> FrameState {
    let target = profile.target_size;
    let (scaled_size, cropped_size) = match profile.scaling {
        ScalingMode::ScaleAndPad => (video.square_pixel_frame_size(target), None),
        ScalingMode::Stretch => (target, None),
        ScalingMode::Crop => (video.square_pixel_fill_size(target), Some(target)),
    };
    let deinterlace = profile.deinterlace && video.is_interlaced();
    debug!(
        source = %video.frame_size,
        %scaled_size,
        %target,
        deinterlace,
        "planned desired frame state"
    );
    FrameState {
        scaled_size,
        padded_size: target,
        cropped_size,
        realtime: profile.realtime,
        video_preset: profile.video_preset.clone(),
        video_profile: profile.video_profile.clone(),
        frame_rate: profile.frame_rate,
        video_track_timescale: profile.video_track_timescale,
        video_bitrate: profile.video_bitrate,
        video_buffer_size: profile.video_buffer_size,
        deinterlace,
        pixel_format: Some(SoftwarePixelFormat::for_bit_depth(profile.bit_depth).into()),
        ..FrameState::new(profile.video_format, target)
    }
}
