use channelcast_core::{FrameDataLocation, FrameState, SoftwarePixelFormat};

use super::Filter;
use crate::step::FrameStateTransition;

/// Software pixel format conversion inside the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFormatFilter {
    pub format: SoftwarePixelFormat,
}

impl Filter for PixelFormatFilter {
    fn filter(&self) -> String {
        format!("format={}", self.format)
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        Some(FrameDataLocation::Software)
    }
}

impl FrameStateTransition for PixelFormatFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        FrameState {
            pixel_format: Some(self.format.into()),
            ..current.clone()
        }
    }
}
