//! Pipeline steps.
//!
//! A builder appends steps to one ordered list; only the command generator
//! looks at a step's kind to decide where its arguments land.

pub mod environment;
pub mod global;
pub mod input_option;
pub mod output;

use channelcast_core::FrameState;

use crate::filter::complex::ComplexFilter;

pub use environment::EnvironmentVariable;
pub use global::{GlobalOption, HardwareAccelerationOption};
pub use input_option::InputOption;
pub use output::OutputOption;

/// Contract of every decoder, encoder and filter.
///
/// Steps that change how frames look or where they live report it and
/// return the state after themselves; steps that only decorate the command
/// line keep the defaults.
pub trait FrameStateTransition {
    fn affects_frame_state(&self) -> bool {
        false
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        current.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStep {
    Global(GlobalOption),
    Input(InputOption),
    Filter(ComplexFilter),
    Output(OutputOption),
    Environment(EnvironmentVariable),
}

impl PipelineStep {
    /// Command-line tokens. Environment steps contribute none.
    pub fn arguments(&self) -> Vec<String> {
        match self {
            Self::Global(option) => option.arguments(),
            Self::Input(option) => option.arguments(),
            Self::Filter(filter) => filter.arguments(),
            Self::Output(option) => option.arguments(),
            Self::Environment(_) => Vec::new(),
        }
    }

    pub fn is_video_encoder(&self) -> bool {
        matches!(self, Self::Output(OutputOption::VideoEncoder(_)))
    }
}

impl FrameStateTransition for PipelineStep {
    fn affects_frame_state(&self) -> bool {
        match self {
            Self::Input(option) => option.affects_frame_state(),
            Self::Output(option) => option.affects_frame_state(),
            Self::Global(_) | Self::Filter(_) | Self::Environment(_) => false,
        }
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        match self {
            Self::Input(option) => option.next_state(current),
            Self::Output(option) => option.next_state(current),
            Self::Global(_) | Self::Filter(_) | Self::Environment(_) => current.clone(),
        }
    }
}

/// `["-flag", "value"]` helper.
pub(crate) fn pair(flag: &str, value: impl ToString) -> Vec<String> {
    vec![flag.to_string(), value.to_string()]
}
