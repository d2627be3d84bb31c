use channelcast_core::{FrameDataLocation, FrameSize, HardwareSurface};

use super::{Filter, location_for_hardware};
use crate::input::watermark::WatermarkLocation;
use crate::step::FrameStateTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Software,
    Cuda,
    Vaapi,
    Qsv,
}

impl OverlayKind {
    pub fn for_surface(surface: HardwareSurface) -> Option<Self> {
        match surface {
            HardwareSurface::Cuda => Some(Self::Cuda),
            HardwareSurface::Vaapi => Some(Self::Vaapi),
            HardwareSurface::Qsv => Some(Self::Qsv),
            HardwareSurface::VideoToolbox => None,
        }
    }

    pub fn filter_name(self) -> &'static str {
        match self {
            Self::Software => "overlay",
            Self::Cuda => "overlay_cuda",
            Self::Vaapi => "overlay_vaapi",
            Self::Qsv => "overlay_qsv",
        }
    }
}

/// Where the overlaid picture lands on the main frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPosition {
    Centered,
    /// Pixel margins from the chosen corner.
    Corner {
        location: WatermarkLocation,
        horizontal_margin: u32,
        vertical_margin: u32,
    },
}

impl OverlayPosition {
    /// Corner placement with margins given as percentages of the frame.
    pub fn corner(
        location: WatermarkLocation,
        horizontal_percent: u32,
        vertical_percent: u32,
        frame: FrameSize,
    ) -> Self {
        Self::Corner {
            location,
            horizontal_margin: frame.width * horizontal_percent / 100,
            vertical_margin: frame.height * vertical_percent / 100,
        }
    }

    fn expression(&self) -> String {
        match *self {
            Self::Centered => "x=(W-w)/2:y=(H-h)/2".into(),
            Self::Corner {
                location,
                horizontal_margin: mx,
                vertical_margin: my,
            } => match location {
                WatermarkLocation::TopLeft => format!("x={mx}:y={my}"),
                WatermarkLocation::TopRight => format!("x=W-w-{mx}:y={my}"),
                WatermarkLocation::BottomLeft => format!("x={mx}:y=H-h-{my}"),
                WatermarkLocation::BottomRight => format!("x=W-w-{mx}:y=H-h-{my}"),
            },
        }
    }
}

/// Joins the main video with one overlay input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayFilter {
    pub kind: OverlayKind,
    pub position: OverlayPosition,
}

impl Filter for OverlayFilter {
    fn filter(&self) -> String {
        format!("{}={}", self.kind.filter_name(), self.position.expression())
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        location_for_hardware(self.kind != OverlayKind::Software)
    }
}

impl FrameStateTransition for OverlayFilter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_margins_scale_with_frame() {
        let position =
            OverlayPosition::corner(WatermarkLocation::BottomRight, 5, 5, FrameSize::new(1920, 1080));
        let overlay = OverlayFilter {
            kind: OverlayKind::Software,
            position,
        };
        assert_eq!(overlay.filter(), "overlay=x=W-w-96:y=H-h-54");
    }

    #[test]
    fn centred_hardware_overlay() {
        let overlay = OverlayFilter {
            kind: OverlayKind::Cuda,
            position: OverlayPosition::Centered,
        };
        assert_eq!(overlay.filter(), "overlay_cuda=x=(W-w)/2:y=(H-h)/2");
        assert_eq!(overlay.expected_location(), Some(FrameDataLocation::Hardware));
    }
}
