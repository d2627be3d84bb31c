use channelcast_core::{FrameDataLocation, FrameState, HardwareSurface};

use super::{Filter, location_for_hardware};
use crate::step::FrameStateTransition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeinterlaceKind {
    /// Configured software expression, e.g. `yadif=1`.
    Software(String),
    Cuda,
    Qsv,
    Vaapi,
}

impl DeinterlaceKind {
    pub fn for_surface(surface: HardwareSurface) -> Option<(Self, &'static str)> {
        match surface {
            HardwareSurface::Cuda => Some((Self::Cuda, "yadif_cuda")),
            HardwareSurface::Qsv => Some((Self::Qsv, "deinterlace_qsv")),
            HardwareSurface::Vaapi => Some((Self::Vaapi, "deinterlace_vaapi")),
            HardwareSurface::VideoToolbox => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeinterlaceFilter {
    pub kind: DeinterlaceKind,
}

impl Filter for DeinterlaceFilter {
    fn filter(&self) -> String {
        match &self.kind {
            DeinterlaceKind::Software(expression) => expression.clone(),
            DeinterlaceKind::Cuda => "yadif_cuda".into(),
            DeinterlaceKind::Qsv => "deinterlace_qsv".into(),
            DeinterlaceKind::Vaapi => "deinterlace_vaapi=rate=field:auto=1".into(),
        }
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        location_for_hardware(!matches!(self.kind, DeinterlaceKind::Software(_)))
    }
}

impl FrameStateTransition for DeinterlaceFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        FrameState {
            deinterlace: false,
            ..current.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_clears_pending_deinterlace() {
        let current = FrameState {
            deinterlace: true,
            ..FrameState::default()
        };
        for kind in [
            DeinterlaceKind::Software("bwdif=1".into()),
            DeinterlaceKind::Cuda,
            DeinterlaceKind::Vaapi,
        ] {
            let filter = DeinterlaceFilter { kind };
            assert!(!filter.next_state(&current).deinterlace);
        }
        let vaapi = DeinterlaceFilter {
            kind: DeinterlaceKind::Vaapi,
        };
        assert_eq!(vaapi.filter(), "deinterlace_vaapi=rate=field:auto=1");
    }
}
