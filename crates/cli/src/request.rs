//! JSON build request accepted by `ffpipe build`.

use std::time::Duration;

use channelcast_core::{AudioState, OutputFormat};
use channelcast_transcoder::capabilities::{FfmpegCapabilities, HardwareCapabilities};
use channelcast_transcoder::decision::{OutputProfile, desired_state};
use channelcast_transcoder::input::{
    AudioInputSource, SubtitleInputSource, VideoInputSource, WatermarkInputSource,
    WatermarkOptions,
};
use channelcast_transcoder::stream::{AudioStream, SubtitleStream, VideoStream};
use channelcast_transcoder::{
    Pipeline, PipelineBuilder, PipelineOptions, TranscodeError, TranscoderConfig,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Leg<S> {
    pub locator: String,
    pub stream: S,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkLeg {
    pub locator: String,
    #[serde(default)]
    pub options: WatermarkOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildRequest {
    /// Copy-mode concat playlist; every media leg is ignored when set.
    #[serde(default)]
    pub concat: Option<String>,
    pub video: Option<Leg<VideoStream>>,
    #[serde(default)]
    pub still_image: bool,
    pub audio: Option<Leg<AudioStream>>,
    pub watermark: Option<WatermarkLeg>,
    pub subtitle: Option<Leg<SubtitleStream>>,
    #[serde(default)]
    pub profile: OutputProfile,
    #[serde(default)]
    pub audio_state: AudioState,
    /// Raw video deeper than 8 bits must use `nut`.
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub options: PipelineOptions,
    #[serde(default)]
    pub start_ms: Option<u64>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub pts_offset: Option<i64>,
    /// Tool features; detected with `--probe` when absent.
    pub ffmpeg: Option<FfmpegCapabilities>,
    pub hardware: Option<HardwareCapabilities>,
}

impl BuildRequest {
    pub fn build(
        &self,
        config: &TranscoderConfig,
        ffmpeg: &FfmpegCapabilities,
        hardware: &HardwareCapabilities,
        error_screen: bool,
    ) -> Result<Pipeline, TranscodeError> {
        let mut state = config.ffmpeg_state(ffmpeg.version, self.output_format.clone());
        state.start = self.start_ms.map(Duration::from_millis);
        state.duration = self.duration_ms.map(Duration::from_millis);
        state.pts_offset = self.pts_offset;

        if let Some(playlist) = &self.concat {
            return Ok(PipelineBuilder::concat(playlist, state));
        }

        let video = self.video.as_ref().ok_or(TranscodeError::MissingVideoInput)?;
        let desired = desired_state(&video.stream, &self.profile);

        let mut builder =
            PipelineBuilder::new(hardware, ffmpeg).with_options(self.options.clone());
        if error_screen {
            return builder.error_screen(state, desired, self.audio_state.clone());
        }

        builder = builder.with_video(if self.still_image {
            VideoInputSource::still_image(&video.locator, video.stream.clone())
        } else {
            VideoInputSource::new(&video.locator, video.stream.clone())
        });
        if let Some(audio) = &self.audio {
            builder = builder.with_audio(AudioInputSource::new(&audio.locator, audio.stream.clone()));
        }
        if let Some(watermark) = &self.watermark {
            builder = builder.with_watermark(WatermarkInputSource::new(
                &watermark.locator,
                watermark.options.clone(),
            ));
        }
        if let Some(subtitle) = &self.subtitle {
            builder = builder.with_subtitle(SubtitleInputSource::new(
                &subtitle.locator,
                subtitle.stream.clone(),
            ));
        }
        builder.build(state, desired, self.audio_state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channelcast_transcoder::CommandGenerator;

    #[test]
    fn minimal_request_builds() {
        let request: BuildRequest = serde_json::from_str(
            r#"{
                "video": {
                    "locator": "/media/show.mkv",
                    "stream": { "index": 0, "codec": "h264", "frame_size": { "width": 1920, "height": 1080 } }
                },
                "profile": { "target_size": { "width": 1280, "height": 720 } }
            }"#,
        )
        .unwrap();
        let pipeline = request
            .build(
                &TranscoderConfig::default(),
                &FfmpegCapabilities::default(),
                &HardwareCapabilities::None,
                false,
            )
            .unwrap();
        let command = CommandGenerator::generate(&pipeline);
        let args = command.arguments.join(" ");
        assert!(args.contains("-i /media/show.mkv"));
        assert!(args.contains("scale=1280:720:flags=bicubic"));
    }

    #[test]
    fn concat_request_ignores_media() {
        let request: BuildRequest =
            serde_json::from_str(r#"{ "concat": "http://localhost/playlist" }"#).unwrap();
        let pipeline = request
            .build(
                &TranscoderConfig::default(),
                &FfmpegCapabilities::default(),
                &HardwareCapabilities::None,
                false,
            )
            .unwrap();
        assert!(pipeline.concat.is_some());
        assert!(pipeline.video.is_none());
    }
}
