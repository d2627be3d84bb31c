use crate::filter::{VideoFilter, join_filters};
use crate::stream::{SubtitleKind, SubtitleStream};

use super::{InputCore, InputKind, InputSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleMethod {
    /// Rendered onto the main video by the `subtitles` filter; no input of
    /// its own.
    Burn,
    /// Picture subtitles overlaid from their own input.
    Overlay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleInputSource {
    pub core: InputCore,
    pub stream: SubtitleStream,
    /// Position among the file's subtitle streams.
    pub ordinal: u32,
    pub filters: Vec<VideoFilter>,
}

impl SubtitleInputSource {
    pub fn new(locator: impl Into<String>, stream: SubtitleStream) -> Self {
        Self {
            core: InputCore::new(locator),
            stream,
            ordinal: 0,
            filters: Vec::new(),
        }
    }

    pub fn method(&self) -> SubtitleMethod {
        match self.stream.kind() {
            SubtitleKind::Text => SubtitleMethod::Burn,
            SubtitleKind::Image => SubtitleMethod::Overlay,
        }
    }
}

impl InputSource for SubtitleInputSource {
    fn kind(&self) -> InputKind {
        InputKind::Subtitle
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
