use channelcast_core::FrameSize;
use serde::{Deserialize, Serialize};

use crate::filter::watermark::FadeDirection;
use crate::filter::{VideoFilter, WatermarkFilter, join_filters};
use crate::step::InputOption;

use super::{InputCore, InputKind, InputSource, StreamContinuity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkLocation {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

/// Seconds, relative to the start of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeWindow {
    pub start_seconds: u32,
    pub end_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkOptions {
    pub location: WatermarkLocation,
    pub horizontal_margin_percent: u32,
    pub vertical_margin_percent: u32,
    /// Width relative to the output frame; `None` keeps the image size.
    pub width_percent: Option<u32>,
    pub opacity_percent: u32,
    /// Empty means always visible.
    pub fade_windows: Vec<FadeWindow>,
    /// Animated images loop as a stream instead of repeating one frame.
    pub is_animated: bool,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            location: WatermarkLocation::BottomRight,
            horizontal_margin_percent: 5,
            vertical_margin_percent: 5,
            width_percent: Some(15),
            opacity_percent: 100,
            fade_windows: Vec::new(),
            is_animated: false,
        }
    }
}

/// A still or animated image overlaid on the main video.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkInputSource {
    pub core: InputCore,
    pub watermark: WatermarkOptions,
    pub filters: Vec<VideoFilter>,
}

impl WatermarkInputSource {
    pub fn new(locator: impl Into<String>, watermark: WatermarkOptions) -> Self {
        let loop_option = if watermark.is_animated {
            InputOption::InfiniteLoop
        } else {
            InputOption::LoopImage
        };
        Self {
            core: InputCore {
                continuity: StreamContinuity::Continuous,
                ..InputCore::new(locator).with_option(loop_option)
            },
            watermark,
            filters: Vec::new(),
        }
    }

    /// Scale, fade and opacity filters for an output frame of `frame`.
    pub fn filters_for(&self, frame: FrameSize) -> Vec<VideoFilter> {
        let mut filters = Vec::new();
        if let Some(percent) = self.watermark.width_percent {
            let width = (frame.width * percent / 100).max(1);
            filters.push(VideoFilter::Watermark(WatermarkFilter::Scale { width }));
        }
        for window in &self.watermark.fade_windows {
            let span = (window.start_seconds, window.end_seconds);
            filters.push(VideoFilter::Watermark(WatermarkFilter::Fade {
                direction: FadeDirection::In,
                at_seconds: window.start_seconds,
                window: span,
            }));
            filters.push(VideoFilter::Watermark(WatermarkFilter::Fade {
                direction: FadeDirection::Out,
                at_seconds: window.end_seconds.saturating_sub(1),
                window: span,
            }));
        }
        if self.watermark.opacity_percent < 100 {
            filters.push(VideoFilter::Watermark(WatermarkFilter::Opacity {
                percent: self.watermark.opacity_percent,
            }));
        }
        filters
    }
}

impl InputSource for WatermarkInputSource {
    fn kind(&self) -> InputKind {
        InputKind::Watermark
    }

    fn core(&self) -> &InputCore {
        &self.core
    }

    fn stream_index(&self) -> u32 {
        0
    }

    fn filter_text(&self) -> Option<String> {
        join_filters(&self.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn still_image_loops_one_frame() {
        let source = WatermarkInputSource::new("/logo.png", WatermarkOptions::default());
        assert_eq!(source.core.options, vec![InputOption::LoopImage]);
        assert_eq!(source.core.continuity, StreamContinuity::Continuous);
    }

    #[test]
    fn filters_scale_then_fade_then_opacity() {
        let source = WatermarkInputSource::new(
            "/logo.png",
            WatermarkOptions {
                width_percent: Some(10),
                opacity_percent: 50,
                fade_windows: vec![FadeWindow {
                    start_seconds: 10,
                    end_seconds: 20,
                }],
                ..WatermarkOptions::default()
            },
        );
        let texts: Vec<String> = source
            .filters_for(FrameSize::new(1920, 1080))
            .iter()
            .map(|f| f.filter())
            .collect();
        assert_eq!(
            texts,
            vec![
                "scale=192:-1".to_string(),
                "fade=in:st=10:d=1:alpha=1:enable='between(t,10,20)'".to_string(),
                "fade=out:st=19:d=1:alpha=1:enable='between(t,10,20)'".to_string(),
                "format=yuva420p,colorchannelmixer=aa=0.50".to_string(),
            ]
        );
    }
}
