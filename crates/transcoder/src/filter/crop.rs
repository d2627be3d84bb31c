use channelcast_core::{FrameDataLocation, FrameSize, FrameState};

use super::Filter;
use crate::step::FrameStateTransition;

/// Centre crop, used when scaling fills the box instead of fitting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropFilter {
    pub size: FrameSize,
}

impl Filter for CropFilter {
    fn filter(&self) -> String {
        format!("crop={}:{}", self.size.width, self.size.height)
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        Some(FrameDataLocation::Software)
    }
}

impl FrameStateTransition for CropFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        FrameState {
            cropped_size: Some(self.size),
            padded_size: self.size,
            ..current.clone()
        }
    }
}
