//! Synthetic inputs shown while the real media cannot be played.

use channelcast_core::{FrameSize, PixelFormat};
use serde::{Deserialize, Serialize};

use crate::TranscodeError;
use crate::step::InputOption;
use crate::stream::{AudioStream, VideoStream};

use super::{AudioInputSource, InputCore, StreamContinuity, VideoInputSource};

pub const ERROR_AUDIO_SAMPLE_RATE: u32 = 48_000;

/// What to show in place of the video.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum ErrorScreen {
    /// A still image, repeated.
    Pic(String),
    #[default]
    Blank,
    /// Random noise.
    Static,
    TestSrc,
    /// White text centred on black.
    Text(String),
    /// Stop the stream instead of showing anything.
    Kill,
}

impl ErrorScreen {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pic(_) => "pic",
            Self::Blank => "blank",
            Self::Static => "static",
            Self::TestSrc => "testsrc",
            Self::Text(_) => "text",
            Self::Kill => "kill",
        }
    }

    /// Video input producing the screen at `size`, `frame_rate` fps.
    pub fn video_source(
        &self,
        size: FrameSize,
        frame_rate: u32,
    ) -> Result<VideoInputSource, TranscodeError> {
        let FrameSize { width, height } = size;
        let graph = match self {
            Self::Kill => return Err(TranscodeError::ErrorScreenUnsupported(self.name().into())),
            Self::Pic(path) => {
                let stream = VideoStream {
                    codec: "png".into(),
                    pixel_format: Some(PixelFormat::YUV420P),
                    frame_rate: Some(f64::from(frame_rate)),
                    ..VideoStream::default()
                };
                let mut source = VideoInputSource::still_image(path.clone(), stream);
                source.core.add_option(InputOption::FrameRate(frame_rate));
                return Ok(source);
            }
            Self::Blank => format!("color=c=black:s={width}x{height}:r={frame_rate}"),
            Self::Static => {
                format!("nullsrc=s={width}x{height}:r={frame_rate},geq=random(1)*255:128:128")
            }
            Self::TestSrc => format!("testsrc=size={width}x{height}:rate={frame_rate}"),
            Self::Text(message) => format!(
                "color=c=black:s={width}x{height}:r={frame_rate},\
                 drawtext=text='{}':fontcolor=white:fontsize={}:x=(w-text_w)/2:y=(h-text_h)/2",
                escape_drawtext(message),
                (height / 20).max(8)
            ),
        };
        let stream = VideoStream {
            codec: "rawvideo".into(),
            pixel_format: Some(PixelFormat::YUV420P),
            frame_size: size,
            frame_rate: Some(f64::from(frame_rate)),
            ..VideoStream::default()
        };
        Ok(VideoInputSource {
            core: lavfi_core(graph),
            stream,
            filters: Vec::new(),
        })
    }
}

/// What to play in place of the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorAudio {
    #[default]
    Silent,
    Sine,
    WhiteNoise,
}

impl ErrorAudio {
    pub fn audio_source(self) -> AudioInputSource {
        let rate = ERROR_AUDIO_SAMPLE_RATE;
        let graph = match self {
            Self::Silent => format!("anullsrc=channel_layout=stereo:sample_rate={rate}"),
            Self::Sine => format!("sine=frequency=440:sample_rate={rate}"),
            Self::WhiteNoise => {
                format!("anoisesrc=color=white:sample_rate={rate}:amplitude=0.1")
            }
        };
        AudioInputSource {
            core: lavfi_core(graph),
            stream: AudioStream {
                index: 0,
                codec: "pcm_s16le".into(),
                channels: 2,
                sample_rate: Some(rate),
                ..AudioStream::default()
            },
            filters: Vec::new(),
        }
    }
}

fn lavfi_core(graph: String) -> InputCore {
    InputCore {
        continuity: StreamContinuity::Continuous,
        ..InputCore::new(graph).with_option(InputOption::Format("lavfi".into()))
    }
}

fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\\\\\")
        .replace('\'', "\u{2019}")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: FrameSize = FrameSize::new(1280, 720);

    #[test]
    fn blank_is_a_colour_source() {
        let source = ErrorScreen::Blank.video_source(HD, 30).unwrap();
        assert_eq!(source.core.locator, "color=c=black:s=1280x720:r=30");
        assert_eq!(source.core.options, vec![InputOption::Format("lavfi".into())]);
        assert_eq!(source.stream.frame_size, HD);
    }

    #[test]
    fn text_is_escaped() {
        let source = ErrorScreen::Text("Offline: 100%".into())
            .video_source(HD, 30)
            .unwrap();
        assert!(source.core.locator.contains("drawtext=text='Offline\\: 100\\%'"));
        assert!(source.core.locator.contains("fontsize=36"));
    }

    #[test]
    fn picture_loops_still_image() {
        let source = ErrorScreen::Pic("/images/offline.png".into())
            .video_source(HD, 25)
            .unwrap();
        assert_eq!(source.core.locator, "/images/offline.png");
        assert_eq!(
            source.core.options,
            vec![InputOption::LoopImage, InputOption::FrameRate(25)]
        );
    }

    #[test]
    fn kill_has_no_screen() {
        let err = ErrorScreen::Kill.video_source(HD, 30).unwrap_err();
        assert!(matches!(err, TranscodeError::ErrorScreenUnsupported(mode) if mode == "kill"));
    }

    #[test]
    fn audio_sources() {
        assert_eq!(
            ErrorAudio::Silent.audio_source().core.locator,
            "anullsrc=channel_layout=stereo:sample_rate=48000"
        );
        assert_eq!(
            ErrorAudio::Sine.audio_source().core.locator,
            "sine=frequency=440:sample_rate=48000"
        );
    }

    #[test]
    fn error_screen_serde() {
        let screen: ErrorScreen =
            serde_json::from_str(r#"{"mode":"text","value":"Be right back"}"#).unwrap();
        assert_eq!(screen, ErrorScreen::Text("Be right back".into()));
        let blank: ErrorScreen = serde_json::from_str(r#"{"mode":"blank"}"#).unwrap();
        assert_eq!(blank, ErrorScreen::Blank);
    }
}
