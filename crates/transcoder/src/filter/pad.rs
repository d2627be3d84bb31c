use channelcast_core::{FrameDataLocation, FrameSize, FrameState};

use super::{Filter, location_for_hardware};
use crate::step::FrameStateTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadKind {
    Software,
    /// `pad_vaapi`, from tool version 7.
    Vaapi,
}

/// Letterbox / pillarbox to the output box, centred, in black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadFilter {
    pub kind: PadKind,
    pub size: FrameSize,
}

impl Filter for PadFilter {
    fn filter(&self) -> String {
        let FrameSize { width, height } = self.size;
        match self.kind {
            PadKind::Software => format!("pad={width}:{height}:-1:-1:color=black"),
            PadKind::Vaapi => {
                format!("pad_vaapi=w={width}:h={height}:x=-1:y=-1:color=black")
            }
        }
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        location_for_hardware(self.kind == PadKind::Vaapi)
    }
}

impl FrameStateTransition for PadFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        FrameState {
            padded_size: self.size,
            ..current.clone()
        }
    }
}
