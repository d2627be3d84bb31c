//! Inputs of one compile.
//!
//! Every source carries the options placed in front of its `-i` and the
//! filters applied to its stream before any join. Several sources may read
//! the same file; they then share one `-i` as long as their options agree.

pub mod audio;
pub mod concat;
pub mod lavfi;
pub mod subtitle;
pub mod video;
pub mod watermark;

use serde::{Deserialize, Serialize};

use crate::step::InputOption;

pub use audio::AudioInputSource;
pub use concat::ConcatInputSource;
pub use subtitle::{SubtitleInputSource, SubtitleMethod};
pub use video::VideoInputSource;
pub use watermark::{WatermarkInputSource, WatermarkLocation, WatermarkOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Video,
    Audio,
    Watermark,
    Subtitle,
    Concat,
}

/// Whether an input ends on its own or keeps producing frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamContinuity {
    #[default]
    Discrete,
    Continuous,
}

/// Fields shared by every input source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputCore {
    /// Path, URL or lavfi graph.
    pub locator: String,
    pub continuity: StreamContinuity,
    pub options: Vec<InputOption>,
}

impl InputCore {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            ..Self::default()
        }
    }

    pub fn with_option(mut self, option: InputOption) -> Self {
        self.add_option(option);
        self
    }

    pub fn add_option(&mut self, option: InputOption) {
        if !self.options.contains(&option) {
            self.options.push(option);
        }
    }
}

pub trait InputSource {
    fn kind(&self) -> InputKind;

    fn core(&self) -> &InputCore;

    /// Stream index inside the input, used for `[n:i]` labels.
    fn stream_index(&self) -> u32;

    /// Comma-joined filters applied to this input alone.
    fn filter_text(&self) -> Option<String>;

    fn locator(&self) -> &str {
        &self.core().locator
    }
}

/// One `-i` of the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct InputGroup<'a> {
    pub locator: &'a str,
    pub options: &'a [InputOption],
    /// Kinds of every source reading this input, in source order.
    pub kinds: Vec<InputKind>,
}

/// Assign input indices. A source reuses the index of the first earlier
/// source with the same locator and the same options; otherwise it opens
/// a new input.
///
/// Returns the distinct inputs and, per source, the index it reads from.
pub fn group_inputs<'a>(sources: &[&'a dyn InputSource]) -> (Vec<InputGroup<'a>>, Vec<usize>) {
    let mut groups: Vec<InputGroup<'a>> = Vec::new();
    let mut indices = Vec::with_capacity(sources.len());
    for source in sources {
        let core = source.core();
        let existing = groups
            .iter()
            .position(|g| g.locator == core.locator && g.options == core.options.as_slice());
        let index = match existing {
            Some(index) => {
                groups[index].kinds.push(source.kind());
                index
            }
            None => {
                groups.push(InputGroup {
                    locator: &core.locator,
                    options: &core.options,
                    kinds: vec![source.kind()],
                });
                groups.len() - 1
            }
        };
        indices.push(index);
    }
    (groups, indices)
}
