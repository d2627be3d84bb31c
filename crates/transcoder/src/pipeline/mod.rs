//! Pipeline builders.
//!
//! One template runs the build phases in a fixed order; each hardware
//! backend only answers the questions the template asks it (which decoder,
//! which hardware encoder, whether a device-side filter is usable). The
//! backend is picked by exhaustive match over [`HardwareCapabilities`].

mod context;
mod nvidia;
mod phases;
mod qsv;
mod software;
mod vaapi;
mod videotoolbox;

use channelcast_core::{
    AudioFormat, AudioState, FfmpegState, FrameState, HardwareAccelerationMode, HardwareSurface,
    VideoFormat,
};
use tracing::info;

use crate::capabilities::{FfmpegCapabilities, HardwareCapabilities};
use crate::decoder::Decoder;
use crate::encoder::{AudioEncoder, VideoEncoder};
use crate::filter::{FilterChain, PadKind, VideoFilter};
use crate::input::{
    AudioInputSource, ConcatInputSource, InputSource, SubtitleInputSource, SubtitleMethod,
    VideoInputSource, WatermarkInputSource,
};
use crate::step::environment;
use crate::step::{InputOption, OutputOption, PipelineStep};
use crate::{PipelineOptions, TranscodeError};

use context::BuildContext;

/// Result of a build: the ordered steps plus the inputs they read.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub steps: Vec<PipelineStep>,
    pub video: Option<VideoInputSource>,
    pub audio: Option<AudioInputSource>,
    pub watermark: Option<WatermarkInputSource>,
    pub subtitle: Option<SubtitleInputSource>,
    pub concat: Option<ConcatInputSource>,
    pub filter_chain: FilterChain,
    pub decoded_state: Option<FrameState>,
    /// State of the frames handed to the encoder.
    pub final_state: Option<FrameState>,
    pub ffmpeg_state: FfmpegState,
}

impl Pipeline {
    /// Inputs in `-i` order. Burnt-in text subtitles have no input.
    pub fn inputs(&self) -> Vec<&dyn InputSource> {
        let mut inputs: Vec<&dyn InputSource> = Vec::new();
        if let Some(video) = &self.video {
            inputs.push(video);
        }
        if let Some(audio) = &self.audio {
            inputs.push(audio);
        }
        if let Some(watermark) = &self.watermark {
            inputs.push(watermark);
        }
        if let Some(subtitle) = &self.subtitle
            && subtitle.method() == SubtitleMethod::Overlay
        {
            inputs.push(subtitle);
        }
        if let Some(concat) = &self.concat {
            inputs.push(concat);
        }
        inputs
    }

    /// Filters applied to the main video, in graph order.
    pub fn video_filters(&self) -> impl Iterator<Item = &VideoFilter> {
        self.video
            .iter()
            .flat_map(|v| v.filters.iter())
            .chain(self.filter_chain.subtitle_overlay.iter())
            .chain(self.filter_chain.watermark_overlay.iter())
            .chain(self.filter_chain.pixel_format.iter())
    }
}

/// Collects the inputs of one build. Sources are moved in, so a builder
/// never shares them with another build.
#[derive(Debug, Clone)]
pub struct PipelineBuilder<'a> {
    hardware: &'a HardwareCapabilities,
    ffmpeg: &'a FfmpegCapabilities,
    options: PipelineOptions,
    video: Option<VideoInputSource>,
    audio: Option<AudioInputSource>,
    watermark: Option<WatermarkInputSource>,
    subtitle: Option<SubtitleInputSource>,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(hardware: &'a HardwareCapabilities, ffmpeg: &'a FfmpegCapabilities) -> Self {
        Self {
            hardware,
            ffmpeg,
            options: PipelineOptions::default(),
            video: None,
            audio: None,
            watermark: None,
            subtitle: None,
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_video(mut self, video: VideoInputSource) -> Self {
        self.video = Some(video);
        self
    }

    pub fn with_audio(mut self, audio: AudioInputSource) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_watermark(mut self, watermark: WatermarkInputSource) -> Self {
        self.watermark = Some(watermark);
        self
    }

    pub fn with_subtitle(mut self, subtitle: SubtitleInputSource) -> Self {
        self.subtitle = Some(subtitle);
        self
    }

    /// Run every phase. Fails before producing any step when the request
    /// cannot be built at all.
    pub fn build(
        self,
        ffmpeg_state: FfmpegState,
        desired: FrameState,
        audio_state: AudioState,
    ) -> Result<Pipeline, TranscodeError> {
        let video = self.video.ok_or(TranscodeError::MissingVideoInput)?;
        if desired.video_format != VideoFormat::Copy && desired.padded_size.is_empty() {
            return Err(TranscodeError::InvalidRequest(
                "desired frame size is empty".into(),
            ));
        }
        let bit_depth = desired
            .pixel_format
            .map(|p| p.bit_depth())
            .unwrap_or_else(|| video.stream.bit_depth());
        if desired.video_format == VideoFormat::RawVideo
            && !ffmpeg_state.output_format.carries_raw_video(bit_depth)
        {
            return Err(TranscodeError::InvalidRequest(format!(
                "{bit_depth}-bit raw video cannot be written as {}",
                ffmpeg_state.output_format.name()
            )));
        }

        let backend = Backend::for_capabilities(self.hardware);
        info!(?backend, target = %desired.video_format, size = %desired.padded_size, "building pipeline");

        let ctx = BuildContext::new(
            self.hardware,
            self.ffmpeg,
            &self.options,
            ffmpeg_state,
            desired,
            audio_state,
            video,
            self.audio,
            self.watermark,
            self.subtitle,
        );
        let ctx = phases::run(backend.pipeline(), ctx);
        Ok(Pipeline {
            steps: ctx.steps,
            video: Some(ctx.video),
            audio: ctx.audio,
            watermark: ctx.watermark,
            subtitle: ctx.subtitle,
            concat: None,
            filter_chain: ctx.chain,
            decoded_state: ctx.decoded_state,
            final_state: Some(ctx.current),
            ffmpeg_state: ctx.ffmpeg_state,
        })
    }

    /// Replace the video and audio with the configured error screen and
    /// error audio, then build.
    pub fn error_screen(
        mut self,
        ffmpeg_state: FfmpegState,
        desired: FrameState,
        audio_state: AudioState,
    ) -> Result<Pipeline, TranscodeError> {
        let frame_rate = desired.frame_rate.map(|r| r.round() as u32).unwrap_or(30).max(1);
        self.video = Some(
            self.options
                .error_screen
                .video_source(desired.padded_size, frame_rate)?,
        );
        self.audio = Some(self.options.error_audio.audio_source());
        self.subtitle = None;
        let ffmpeg_state = FfmpegState {
            start: None,
            ..ffmpeg_state
        };
        let desired = FrameState {
            deinterlace: false,
            ..desired
        };
        self.build(ffmpeg_state, desired, audio_state)
    }

    /// Copy-mode pipeline reading an endless concat playlist.
    pub fn concat(playlist_url: &str, ffmpeg_state: FfmpegState) -> Pipeline {
        let mut steps = phases::global_steps(&ffmpeg_state);
        steps.push(PipelineStep::Input(InputOption::Realtime));
        steps.push(PipelineStep::Output(OutputOption::VideoEncoder(VideoEncoder::Copy)));
        steps.push(PipelineStep::Output(OutputOption::AudioEncoder(AudioEncoder::new(
            AudioFormat::Copy,
        ))));
        steps.extend(phases::decoration_steps(&ffmpeg_state, None));
        steps.push(PipelineStep::Output(OutputOption::Format(
            ffmpeg_state.output_format.clone(),
        )));
        steps.extend(
            environment::for_state(&ffmpeg_state, false)
                .into_iter()
                .map(PipelineStep::Environment),
        );
        info!(playlist_url, format = ffmpeg_state.output_format.name(), "building concat pipeline");
        Pipeline {
            steps,
            video: None,
            audio: None,
            watermark: None,
            subtitle: None,
            concat: Some(ConcatInputSource::new(playlist_url)),
            filter_chain: FilterChain::default(),
            decoded_state: None,
            final_state: None,
            ffmpeg_state,
        }
    }
}

/// The closed set of hardware backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    Software,
    Nvidia,
    Qsv,
    Vaapi,
    VideoToolbox,
}

impl Backend {
    pub fn for_capabilities(hardware: &HardwareCapabilities) -> Self {
        match hardware {
            HardwareCapabilities::None => Self::Software,
            HardwareCapabilities::Nvidia(_) => Self::Nvidia,
            HardwareCapabilities::Qsv(_) => Self::Qsv,
            HardwareCapabilities::Vaapi(_) => Self::Vaapi,
            HardwareCapabilities::VideoToolbox(_) => Self::VideoToolbox,
        }
    }

    pub fn pipeline(self) -> &'static dyn BackendPipeline {
        match self {
            Self::Software => &software::SoftwarePipeline,
            Self::Nvidia => &nvidia::NvidiaPipeline,
            Self::Qsv => &qsv::QsvPipeline,
            Self::Vaapi => &vaapi::VaapiPipeline,
            Self::VideoToolbox => &videotoolbox::VideoToolboxPipeline,
        }
    }
}

/// Backend answers consulted by the build phases. Defaults describe a
/// backend with no device at all.
pub(crate) trait BackendPipeline: Sync {
    fn mode(&self) -> HardwareAccelerationMode;

    /// Surface decoded frames stay on, when they stay on the device.
    fn surface(&self) -> Option<HardwareSurface> {
        None
    }

    fn device(&self, _state: &FfmpegState) -> String {
        String::new()
    }

    fn decoder(&self, _ctx: &BuildContext<'_>) -> Decoder {
        Decoder::Implicit
    }

    /// Hardware encoder for the desired format, before the tool and the
    /// capability checks.
    fn hardware_encoder(&self, _ctx: &BuildContext<'_>) -> Option<VideoEncoder> {
        None
    }

    fn pad_kind(&self, _ctx: &BuildContext<'_>) -> PadKind {
        PadKind::Software
    }

    fn force_software_overlay(&self, _ctx: &BuildContext<'_>) -> bool {
        false
    }

    /// Whether `LIBVA_DRIVER_NAME` reaches the tool.
    fn uses_vaapi_driver(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::VideoStream;
    use channelcast_core::FrameSize;

    #[test]
    fn missing_video_is_rejected() {
        let hardware = HardwareCapabilities::None;
        let ffmpeg = FfmpegCapabilities::default();
        let err = PipelineBuilder::new(&hardware, &ffmpeg)
            .build(
                FfmpegState::default(),
                FrameState::new(VideoFormat::H264, FrameSize::new(1280, 720)),
                AudioState::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TranscodeError::MissingVideoInput));
    }

    #[test]
    fn backend_follows_capabilities() {
        assert_eq!(Backend::for_capabilities(&HardwareCapabilities::None), Backend::Software);
        assert_eq!(
            Backend::for_capabilities(&HardwareCapabilities::VideoToolbox(Default::default())),
            Backend::VideoToolbox
        );
    }

    #[test]
    fn text_subtitles_have_no_input() {
        let hardware = HardwareCapabilities::None;
        let ffmpeg = FfmpegCapabilities::default();
        let stream = VideoStream {
            codec: "h264".into(),
            frame_size: FrameSize::new(1280, 720),
            ..VideoStream::default()
        };
        let subtitle = SubtitleInputSource::new(
            "/media/subs.srt",
            crate::stream::SubtitleStream {
                codec: "subrip".into(),
                ..Default::default()
            },
        );
        let pipeline = PipelineBuilder::new(&hardware, &ffmpeg)
            .with_video(VideoInputSource::new("/media/a.mkv", stream))
            .with_subtitle(subtitle)
            .build(
                FfmpegState::default(),
                FrameState::new(VideoFormat::H264, FrameSize::new(1280, 720)),
                AudioState::default(),
            )
            .unwrap();
        assert_eq!(pipeline.inputs().len(), 1);
    }
}
