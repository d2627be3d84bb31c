use channelcast_core::{FrameDataLocation, FrameSize, FrameState, HardwareSurface};

use super::{Filter, location_for_hardware};
use crate::step::FrameStateTransition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleKind {
    Software { algorithm: String },
    Cuda,
    Vaapi,
    Qsv,
}

impl ScaleKind {
    /// Device-native scaler for a surface, and the filter that must be
    /// present for it.
    pub fn for_surface(surface: HardwareSurface) -> Option<(Self, &'static str)> {
        match surface {
            HardwareSurface::Cuda => Some((Self::Cuda, "scale_cuda")),
            HardwareSurface::Vaapi => Some((Self::Vaapi, "scale_vaapi")),
            HardwareSurface::Qsv => Some((Self::Qsv, "scale_qsv")),
            HardwareSurface::VideoToolbox => None,
        }
    }
}

/// Scale to a square-pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleFilter {
    pub kind: ScaleKind,
    pub size: FrameSize,
}

impl ScaleFilter {
    pub fn software(algorithm: &str, size: FrameSize) -> Self {
        Self {
            kind: ScaleKind::Software {
                algorithm: algorithm.to_string(),
            },
            size,
        }
    }
}

impl Filter for ScaleFilter {
    fn filter(&self) -> String {
        let FrameSize { width, height } = self.size;
        let scale = match &self.kind {
            ScaleKind::Software { algorithm } => {
                format!("scale={width}:{height}:flags={algorithm}")
            }
            ScaleKind::Cuda => format!("scale_cuda={width}:{height}"),
            ScaleKind::Vaapi => format!("scale_vaapi=w={width}:h={height}"),
            ScaleKind::Qsv => format!("scale_qsv=w={width}:h={height}"),
        };
        format!("{scale},setsar=1")
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        location_for_hardware(!matches!(self.kind, ScaleKind::Software { .. }))
    }
}

impl FrameStateTransition for ScaleFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        FrameState {
            scaled_size: self.size,
            padded_size: self.size,
            is_anamorphic: false,
            ..current.clone()
        }
    }
}
