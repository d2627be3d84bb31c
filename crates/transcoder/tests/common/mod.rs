#![allow(dead_code)]

use channelcast_core::{
    AudioState, FfmpegState, FfmpegVersion, FrameDataLocation, FrameSize, OutputFormat,
    PixelFormat, VideoFormat,
};
use channelcast_transcoder::capabilities::FfmpegCapabilities;
use channelcast_transcoder::capabilities::vaapi::parse_vainfo;
use channelcast_transcoder::capabilities::{HardwareCapabilities, VaapiCapabilities};
use channelcast_transcoder::decision::{OutputProfile, desired_state};
use channelcast_transcoder::filter::Filter;
use channelcast_transcoder::input::VideoInputSource;
use channelcast_transcoder::step::FrameStateTransition;
use channelcast_transcoder::stream::VideoStream;
use channelcast_transcoder::{CommandGenerator, FfmpegCommand, Pipeline, PipelineBuilder};

pub const VAINFO_INTEL: &str = "\
vainfo: Supported profile and entrypoints
      VAProfileH264Main               :\tVAEntrypointVLD
      VAProfileH264Main               :\tVAEntrypointEncSlice
      VAProfileH264High               :\tVAEntrypointVLD
      VAProfileH264High               :\tVAEntrypointEncSlice
      VAProfileHEVCMain               :\tVAEntrypointVLD
      VAProfileHEVCMain               :\tVAEntrypointEncSlice

VAProfileH264Main/VAEntrypointEncSlice
    VAConfigAttribRateControl      : VA_RC_CBR
                                     VA_RC_VBR
                                     VA_RC_CQP
";

const ENCODERS: &[&str] = &[
    "libx264",
    "libx265",
    "h264_nvenc",
    "hevc_nvenc",
    "h264_vaapi",
    "hevc_vaapi",
    "h264_qsv",
    "hevc_qsv",
    "h264_videotoolbox",
    "hevc_videotoolbox",
];

const FILTERS: &[&str] = &[
    "scale_cuda",
    "yadif_cuda",
    "overlay_cuda",
    "scale_vaapi",
    "deinterlace_vaapi",
    "overlay_vaapi",
    "pad_vaapi",
    "scale_qsv",
    "deinterlace_qsv",
    "overlay_qsv",
    "vpp_qsv",
    "zscale",
    "tonemap",
];

const HWACCELS: &[&str] = &["cuda", "vaapi", "qsv", "videotoolbox"];

fn set(names: &[&str]) -> std::collections::BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// A recent build with every encoder, filter and hwaccel the tests use.
pub fn full_ffmpeg() -> FfmpegCapabilities {
    FfmpegCapabilities {
        version: FfmpegVersion::new(7, 1, 0),
        encoders: set(ENCODERS),
        decoders: set(&["h264_qsv", "hevc_qsv"]),
        filters: set(FILTERS),
        hwaccels: set(HWACCELS),
    }
}

pub fn vaapi_caps() -> VaapiCapabilities {
    parse_vainfo(VAINFO_INTEL).expect("sample vainfo parses")
}

pub fn h264(width: u32, height: u32) -> VideoStream {
    VideoStream {
        index: 0,
        codec: "h264".into(),
        pixel_format: Some(PixelFormat::YUV420P),
        frame_size: FrameSize::new(width, height),
        frame_rate: Some(23.976),
        ..VideoStream::default()
    }
}

pub fn profile(width: u32, height: u32) -> OutputProfile {
    OutputProfile {
        target_size: FrameSize::new(width, height),
        video_format: VideoFormat::H264,
        ..OutputProfile::default()
    }
}

pub fn state(major: u32, output_format: OutputFormat) -> FfmpegState {
    FfmpegState {
        version: FfmpegVersion::new(major, 1, 0),
        output_format,
        ..FfmpegState::default()
    }
}

/// Build one video-only pipeline.
pub fn build(
    hardware: &HardwareCapabilities,
    ffmpeg: &FfmpegCapabilities,
    stream: VideoStream,
    profile: &OutputProfile,
) -> Pipeline {
    let desired = desired_state(&stream, profile);
    PipelineBuilder::new(hardware, ffmpeg)
        .with_video(VideoInputSource::new("/media/show.mkv", stream))
        .build(state(7, OutputFormat::MpegTs), desired, AudioState::default())
        .expect("pipeline builds")
}

pub fn command(pipeline: &Pipeline) -> FfmpegCommand {
    CommandGenerator::generate(pipeline)
}

pub fn joined(pipeline: &Pipeline) -> String {
    command(pipeline).arguments.join(" ")
}

/// Walk the main video filters from the decoded state: every filter must
/// find frames where it expects them.
pub fn assert_locations_consistent(pipeline: &Pipeline) {
    let mut state = pipeline.decoded_state.clone().expect("decoded state recorded");
    for filter in pipeline.video_filters() {
        if let Some(expected) = filter.expected_location() {
            let actual = match state.frame_data_location {
                FrameDataLocation::Unknown => FrameDataLocation::Software,
                location => location,
            };
            assert_eq!(actual, expected, "{} runs on the wrong side", filter.filter());
        }
        state = filter.next_state(&state);
    }
}

/// The encoder receives the requested layout.
pub fn assert_pixel_format_converged(pipeline: &Pipeline, desired: PixelFormat) {
    let final_format = pipeline
        .final_state
        .as_ref()
        .and_then(|s| s.pixel_format)
        .expect("final pixel format");
    assert_eq!(final_format.unwrap(), desired.unwrap());
}
