use crate::filter::{VideoFilter, join_filters};
use crate::step::InputOption;
use crate::stream::VideoStream;

use super::{InputCore, InputKind, InputSource, StreamContinuity};

/// Main video input.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInputSource {
    pub core: InputCore,
    pub stream: VideoStream,
    pub filters: Vec<VideoFilter>,
}

impl VideoInputSource {
    pub fn new(locator: impl Into<String>, stream: VideoStream) -> Self {
        Self {
            core: InputCore::new(locator),
            stream,
            filters: Vec::new(),
        }
    }

    /// A single picture repeated for as long as the output runs.
    pub fn still_image(locator: impl Into<String>, stream: VideoStream) -> Self {
        Self {
            core: InputCore {
                continuity: StreamContinuity::Continuous,
                ..InputCore::new(locator).with_option(InputOption::LoopImage)
            },
            stream,
            filters: Vec::new(),
        }
    }
}

impl InputSource for VideoInputSource {
    fn kind(&self) -> InputKind {
        InputKind::Video
    }

    fn core(&self) -> &InputCore {
        &self.core
    }

    fn stream_index(&self) -> u32 {
        self.stream.index
    }

    fn filter_text(&self) -> Option<String> {
        join_filters(&self.filters)
    }
}
