use channelcast_core::{
    AudioState, FfmpegState, FrameDataLocation, FrameState, HardwareSurface, PixelFormat,
    SoftwarePixelFormat, VideoFormat,
};
use tracing::debug;

use crate::PipelineOptions;
use crate::capabilities::{FfmpegCapabilities, HardwareCapabilities};
use crate::encoder::VideoEncoder;
use crate::filter::{
    Filter, FilterChain, HardwareDownloadFilter, HardwareUploadFilter, OverlayKind, VideoFilter,
};
use crate::input::{
    AudioInputSource, SubtitleInputSource, SubtitleMethod, VideoInputSource, WatermarkInputSource,
};
use crate::step::{FrameStateTransition, PipelineStep};
use crate::stream::VideoStream;

/// Everything one build reads and accumulates. Phases take it by value and
/// hand back the updated context.
#[derive(Debug, Clone)]
pub(crate) struct BuildContext<'a> {
    pub hardware: &'a HardwareCapabilities,
    pub ffmpeg: &'a FfmpegCapabilities,
    pub options: &'a PipelineOptions,
    pub ffmpeg_state: FfmpegState,
    pub desired: FrameState,
    pub audio_state: AudioState,
    pub current: FrameState,
    /// State right after the decoder.
    pub decoded_state: Option<FrameState>,
    pub video: VideoInputSource,
    pub audio: Option<AudioInputSource>,
    pub watermark: Option<WatermarkInputSource>,
    pub subtitle: Option<SubtitleInputSource>,
    pub steps: Vec<PipelineStep>,
    pub chain: FilterChain,
    pub hardware_decode: bool,
    pub hardware_encode: bool,
    pub overlay: Option<OverlayKind>,
    pub encoder: Option<VideoEncoder>,
}

impl<'a> BuildContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hardware: &'a HardwareCapabilities,
        ffmpeg: &'a FfmpegCapabilities,
        options: &'a PipelineOptions,
        ffmpeg_state: FfmpegState,
        desired: FrameState,
        audio_state: AudioState,
        video: VideoInputSource,
        audio: Option<AudioInputSource>,
        watermark: Option<WatermarkInputSource>,
        subtitle: Option<SubtitleInputSource>,
    ) -> Self {
        let current = source_state(&video.stream, &desired);
        // an unspecified target keeps the source layout
        let desired = FrameState {
            pixel_format: desired
                .pixel_format
                .or_else(|| current.pixel_format.map(|p| p.unwrap().into())),
            ..desired
        };
        Self {
            hardware,
            ffmpeg,
            options,
            ffmpeg_state,
            desired,
            audio_state,
            current,
            decoded_state: None,
            video,
            audio,
            watermark,
            subtitle,
            steps: Vec::new(),
            chain: FilterChain::default(),
            hardware_decode: false,
            hardware_encode: false,
            overlay: None,
            encoder: None,
        }
    }

    pub fn is_copy(&self) -> bool {
        self.desired.video_format == VideoFormat::Copy
    }

    pub fn desired_format(&self) -> SoftwarePixelFormat {
        self.desired
            .pixel_format
            .map(|p| p.unwrap())
            .unwrap_or(SoftwarePixelFormat::Yuv420p)
    }

    pub fn subtitle_method(&self) -> Option<SubtitleMethod> {
        self.subtitle.as_ref().map(|s| s.method())
    }

    /// Whether any scale, crop, pad or deinterlace will run.
    pub fn needs_frame_filters(&self) -> bool {
        self.current.deinterlace
            || self.needs_scale()
            || self.desired.cropped_size.is_some()
            || self.current.padded_size != self.desired.padded_size
    }

    pub fn needs_scale(&self) -> bool {
        self.current.scaled_size != self.desired.scaled_size || self.current.is_anamorphic
    }

    /// A device-side filter may run. Frames already on the device qualify;
    /// frames in host memory qualify when they are headed for a hardware
    /// encoder and nothing will be composited onto them.
    pub fn device_filter_usable(&self, name: &str) -> bool {
        if self.options.disable_hardware_filters || !self.ffmpeg.has_filter(name) {
            return false;
        }
        self.current.is_hardware()
            || (self.hardware_encode && self.watermark.is_none() && self.subtitle.is_none())
    }

    /// Whether anything at all is filtered so far.
    pub fn has_graph(&self) -> bool {
        !self.video.filters.is_empty() || !self.chain.is_empty()
    }

    pub fn apply_step(&mut self, step: PipelineStep) {
        if step.affects_frame_state() {
            self.current = step.next_state(&self.current);
        }
        self.steps.push(step);
    }

    /// Append a filter on the main video, transferring frames first when
    /// they are not where the filter expects them.
    pub fn push_video_filter(&mut self, filter: VideoFilter, surface: Option<HardwareSurface>) {
        match filter.expected_location() {
            Some(FrameDataLocation::Software) => self.ensure_software(),
            Some(FrameDataLocation::Hardware) => {
                if let Some(surface) = surface {
                    self.ensure_hardware(surface);
                }
            }
            _ => {}
        }
        self.push_raw(filter);
    }

    pub fn ensure_software(&mut self) {
        if self.current.is_hardware()
            && let Some(format) = self.current.pixel_format
        {
            debug!(%format, "downloading frames from device");
            self.push_raw(VideoFilter::HardwareDownload(HardwareDownloadFilter { format }));
        }
    }

    pub fn ensure_hardware(&mut self, surface: HardwareSurface) {
        if !self.current.is_hardware() {
            let format = self
                .current
                .pixel_format
                .map(|p| p.unwrap())
                .unwrap_or(SoftwarePixelFormat::Yuv420p);
            debug!(%format, ?surface, "uploading frames to device");
            self.push_raw(VideoFilter::HardwareUpload(HardwareUploadFilter {
                surface,
                format,
                extra_frames: self.ffmpeg_state.qsv_extra_hardware_frames,
            }));
        }
    }

    /// Filters land on the main video until an overlay joins another input,
    /// then after the latest overlay.
    fn push_raw(&mut self, filter: VideoFilter) {
        self.current = filter.next_state(&self.current);
        if !self.chain.watermark_overlay.is_empty() {
            self.chain.watermark_overlay.push(filter);
        } else if !self.chain.subtitle_overlay.is_empty() {
            self.chain.subtitle_overlay.push(filter);
        } else {
            self.video.filters.push(filter);
        }
    }

    /// Trailing fixups after every join.
    pub fn push_pixel_format_filter(&mut self, filter: VideoFilter) {
        self.current = filter.next_state(&self.current);
        self.chain.pixel_format.push(filter);
    }
}

/// State of frames as the source delivers them.
fn source_state(stream: &VideoStream, desired: &FrameState) -> FrameState {
    let pixel_format = stream
        .pixel_format
        .map(|p| PixelFormat::from(p.unwrap()))
        .unwrap_or_else(|| SoftwarePixelFormat::for_bit_depth(stream.bit_depth()).into());
    FrameState {
        scaled_size: stream.frame_size,
        padded_size: stream.frame_size,
        cropped_size: None,
        is_anamorphic: stream.is_anamorphic(),
        video_format: stream.video_format(),
        video_profile: stream.profile.clone(),
        frame_rate: stream.frame_rate,
        frame_data_location: FrameDataLocation::Unknown,
        deinterlace: desired.deinterlace,
        pixel_format: Some(pixel_format),
        color_format: Some(stream.color_format.clone()),
        ..FrameState::default()
    }
}
