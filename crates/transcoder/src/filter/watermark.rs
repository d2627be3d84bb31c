//! Filters applied to the watermark input before it is overlaid.

use channelcast_core::FrameDataLocation;

use super::Filter;
use crate::step::FrameStateTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkFilter {
    /// Width in pixels, height keeps the aspect ratio.
    Scale { width: u32 },
    /// Percent, 0..=100.
    Opacity { percent: u32 },
    Fade {
        direction: FadeDirection,
        /// Second the one-second fade starts at.
        at_seconds: u32,
        /// Visibility window the fade belongs to.
        window: (u32, u32),
    },
}

impl Filter for WatermarkFilter {
    fn filter(&self) -> String {
        match self {
            Self::Scale { width } => format!("scale={width}:-1"),
            Self::Opacity { percent } => format!(
                "format=yuva420p,colorchannelmixer=aa={:.2}",
                f64::from((*percent).min(100)) / 100.0
            ),
            Self::Fade {
                direction,
                at_seconds,
                window: (start, end),
            } => {
                let direction = match direction {
                    FadeDirection::In => "in",
                    FadeDirection::Out => "out",
                };
                format!(
                    "fade={direction}:st={at_seconds}:d=1:alpha=1:enable='between(t,{start},{end})'"
                )
            }
        }
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        Some(FrameDataLocation::Software)
    }
}

impl FrameStateTransition for WatermarkFilter {}
