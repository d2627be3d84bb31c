//! Linearizes a [`Pipeline`] into the tool's argument vector.
//!
//! Order: global options, then every distinct input with its options and
//! `-i`, then output options with the `-filter_complex` step moved right
//! behind the video encoder.

use std::collections::BTreeMap;

use channelcast_core::OutputFormat;
use serde::Serialize;
use tracing::debug;

use crate::hls::HlsPaths;
use crate::input::group_inputs;
use crate::pipeline::Pipeline;
use crate::step::{InputOption, OutputOption, PipelineStep};

/// Everything needed to spawn one tool process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FfmpegCommand {
    pub arguments: Vec<String>,
    pub environment: BTreeMap<String, String>,
    /// Where HLS output lands; `None` for piped output.
    pub hls: Option<HlsPaths>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandGenerator;

impl CommandGenerator {
    pub fn generate(pipeline: &Pipeline) -> FfmpegCommand {
        let mut arguments = Vec::new();

        for step in &pipeline.steps {
            if let PipelineStep::Global(option) = step {
                arguments.extend(option.arguments());
            }
        }

        let input_steps: Vec<&InputOption> = pipeline
            .steps
            .iter()
            .filter_map(|step| match step {
                PipelineStep::Input(option) => Some(option),
                _ => None,
            })
            .collect();
        let inputs = pipeline.inputs();
        let (groups, _) = group_inputs(&inputs);
        for group in &groups {
            for option in group.options {
                arguments.extend(option.arguments());
            }
            for option in &input_steps {
                let applies = group.kinds.iter().any(|kind| option.applies_to(*kind));
                if applies && !group.options.contains(*option) {
                    arguments.extend(option.arguments());
                }
            }
            arguments.push("-i".into());
            arguments.push(group.locator.to_string());
        }

        arguments.extend(output_arguments(&pipeline.steps));

        let environment = pipeline
            .steps
            .iter()
            .filter_map(|step| match step {
                PipelineStep::Environment(variable) => {
                    Some((variable.name.clone(), variable.value.clone()))
                }
                _ => None,
            })
            .collect();

        let hls = match &pipeline.ffmpeg_state.output_format {
            OutputFormat::Hls(options) => Some(HlsPaths::from_options(options)),
            _ => None,
        };

        debug!(inputs = groups.len(), arguments = arguments.len(), "generated command");
        FfmpegCommand {
            arguments,
            environment,
            hls,
        }
    }
}

fn output_arguments(steps: &[PipelineStep]) -> Vec<String> {
    let filter = steps.iter().find(|s| matches!(s, PipelineStep::Filter(_)));
    let outputs: Vec<&PipelineStep> = steps
        .iter()
        .filter(|s| matches!(s, PipelineStep::Output(_)))
        .collect();

    // without a video encoder the graph goes in front of the format
    let anchor = outputs
        .iter()
        .position(|s| s.is_video_encoder())
        .map(|i| i + 1)
        .or_else(|| {
            outputs
                .iter()
                .position(|s| matches!(s, PipelineStep::Output(OutputOption::Format(_))))
        });

    let mut args = Vec::new();
    for (position, step) in outputs.iter().enumerate() {
        if Some(position) == anchor {
            args.extend(filter.map(|f| f.arguments()).unwrap_or_default());
        }
        args.extend(step.arguments());
    }
    if anchor.is_none_or(|a| a >= outputs.len()) {
        args.extend(filter.map(|f| f.arguments()).unwrap_or_default());
    }
    args
}
