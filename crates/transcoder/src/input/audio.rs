use crate::filter::AudioFilter;
use crate::stream::AudioStream;

use super::{InputCore, InputKind, InputSource};

#[derive(Debug, Clone, PartialEq)]
pub struct AudioInputSource {
    pub core: InputCore,
    pub stream: AudioStream,
    pub filters: Vec<AudioFilter>,
}

impl AudioInputSource {
    pub fn new(locator: impl Into<String>, stream: AudioStream) -> Self {
        Self {
            core: InputCore::new(locator),
            stream,
            filters: Vec::new(),
        }
    }
}

impl InputSource for AudioInputSource {
    fn kind(&self) -> InputKind {
        InputKind::Audio
    }

    fn core(&self) -> &InputCore {
        &self.core
    }

    fn stream_index(&self) -> u32 {
        self.stream.index
    }

    fn filter_text(&self) -> Option<String> {
        let parts: Vec<String> = self.filters.iter().map(|f| f.filter()).collect();
        (!parts.is_empty()).then(|| parts.join(","))
    }
}
