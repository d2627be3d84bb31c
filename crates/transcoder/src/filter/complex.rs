//! `-filter_complex` assembly.
//!
//! Inputs are walked in a fixed order: video, audio, watermark, subtitle.
//! A stream keeps its `<input>:<stream>` label until a filter runs on it,
//! after which it goes by a bracketed name. Overlays and the trailing
//! pixel-format fixups consume the current video label and produce a new
//! one; whatever labels survive are mapped.

use super::{FilterChain, join_filters};
use crate::input::{
    AudioInputSource, InputSource, SubtitleInputSource, VideoInputSource, WatermarkInputSource,
};
use crate::step::pair;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexFilter {
    /// `;`-joined fragments, empty when nothing is filtered.
    pub graph: String,
    pub video_label: String,
    pub audio_label: Option<String>,
}

/// One input together with the `-i` index it reads from.
pub type Indexed<'a, S> = (usize, &'a S);

#[derive(Debug, Clone, Copy)]
pub struct GraphInputs<'a> {
    pub video: Indexed<'a, VideoInputSource>,
    pub audio: Option<Indexed<'a, AudioInputSource>>,
    pub watermark: Option<Indexed<'a, WatermarkInputSource>>,
    /// Picture subtitles only; burnt-in text lives in the video filters.
    pub subtitle: Option<Indexed<'a, SubtitleInputSource>>,
}

impl ComplexFilter {
    pub fn assemble(inputs: GraphInputs<'_>, chain: &FilterChain) -> Self {
        let mut fragments = Vec::new();

        let (index, video) = inputs.video;
        let mut video_label = stream_label(index, video, "v", &mut fragments);
        let audio_label = inputs
            .audio
            .map(|(index, audio)| stream_label(index, audio, "a", &mut fragments));
        let watermark_label = inputs
            .watermark
            .map(|(index, watermark)| stream_label(index, watermark, "wm", &mut fragments));
        let subtitle_label = inputs
            .subtitle
            .map(|(index, subtitle)| stream_label(index, subtitle, "st", &mut fragments));

        if let (Some(subtitle), Some(text)) = (&subtitle_label, join_filters(&chain.subtitle_overlay)) {
            fragments.push(format!("{}{}{text}[vst]", pad_input(&video_label), pad_input(subtitle)));
            video_label = "[vst]".into();
        }
        if let (Some(watermark), Some(text)) = (&watermark_label, join_filters(&chain.watermark_overlay)) {
            fragments.push(format!("{}{}{text}[vwm]", pad_input(&video_label), pad_input(watermark)));
            video_label = "[vwm]".into();
        }
        if let Some(text) = join_filters(&chain.pixel_format) {
            fragments.push(format!("{}{text}[vpf]", pad_input(&video_label)));
            video_label = "[vpf]".into();
        }

        Self {
            graph: fragments.join(";"),
            video_label,
            audio_label,
        }
    }

    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.graph.is_empty() {
            args.extend(pair("-filter_complex", &self.graph));
        }
        args.extend(pair("-map", &self.video_label));
        if let Some(audio) = &self.audio_label {
            args.extend(pair("-map", audio));
        }
        args
    }
}

/// Label of one input's stream after its own filters, pushing the fragment
/// when there are any.
fn stream_label(
    index: usize,
    source: &dyn InputSource,
    name: &str,
    fragments: &mut Vec<String>,
) -> String {
    let label = format!("{index}:{}", source.stream_index());
    match source.filter_text() {
        Some(text) => {
            fragments.push(format!("[{label}]{text}[{name}]"));
            format!("[{name}]")
        }
        None => label,
    }
}

fn pad_input(label: &str) -> String {
    if label.starts_with('[') {
        label.to_string()
    } else {
        format!("[{label}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{
        AudioFilter, OverlayFilter, OverlayKind, OverlayPosition, PixelFormatFilter, ScaleFilter,
        VideoFilter,
    };
    use crate::input::WatermarkOptions;
    use crate::stream::{AudioStream, VideoStream};
    use channelcast_core::{FrameSize, SoftwarePixelFormat};

    fn video() -> VideoInputSource {
        VideoInputSource::new("/media/a.mkv", VideoStream::default())
    }

    fn audio() -> AudioInputSource {
        AudioInputSource::new(
            "/media/a.mkv",
            AudioStream {
                index: 1,
                ..AudioStream::default()
            },
        )
    }

    #[test]
    fn unfiltered_inputs_only_map() {
        let (video, audio) = (video(), audio());
        let filter = ComplexFilter::assemble(
            GraphInputs {
                video: (0, &video),
                audio: Some((0, &audio)),
                watermark: None,
                subtitle: None,
            },
            &FilterChain::default(),
        );
        assert_eq!(filter.arguments(), ["-map", "0:0", "-map", "0:1"]);
    }

    #[test]
    fn filtered_streams_get_bracketed_labels() {
        let mut video = video();
        video.filters.push(VideoFilter::Scale(ScaleFilter::software(
            "bicubic",
            FrameSize::new(1280, 720),
        )));
        let mut audio = audio();
        audio.filters.push(AudioFilter::Resample);
        let filter = ComplexFilter::assemble(
            GraphInputs {
                video: (0, &video),
                audio: Some((0, &audio)),
                watermark: None,
                subtitle: None,
            },
            &FilterChain::default(),
        );
        assert_eq!(
            filter.graph,
            "[0:0]scale=1280:720:flags=bicubic,setsar=1[v];[0:1]aresample=async=1[a]"
        );
        assert_eq!(filter.video_label, "[v]");
        assert_eq!(filter.audio_label.as_deref(), Some("[a]"));
    }

    #[test]
    fn watermark_overlay_then_pixel_format() {
        let video = video();
        let watermark = WatermarkInputSource::new("/logo.png", WatermarkOptions::default());
        let chain = FilterChain {
            watermark_overlay: vec![VideoFilter::Overlay(OverlayFilter {
                kind: OverlayKind::Software,
                position: OverlayPosition::Centered,
            })],
            pixel_format: vec![VideoFilter::PixelFormat(PixelFormatFilter {
                format: SoftwarePixelFormat::Yuv420p,
            })],
            ..FilterChain::default()
        };
        let filter = ComplexFilter::assemble(
            GraphInputs {
                video: (0, &video),
                audio: None,
                watermark: Some((1, &watermark)),
                subtitle: None,
            },
            &chain,
        );
        assert_eq!(
            filter.graph,
            "[0:0][1:0]overlay=x=(W-w)/2:y=(H-h)/2[vwm];[vwm]format=yuv420p[vpf]"
        );
        assert_eq!(filter.arguments().last().map(String::as_str), Some("[vpf]"));
    }
}
