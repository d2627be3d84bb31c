use crate::step::InputOption;

use super::{InputCore, InputKind, InputSource, StreamContinuity};

pub const CONCAT_PROTOCOL_WHITELIST: &str = "file,http,tcp,https,tcp,tls";

/// Endless playlist of already-encoded segments, read in copy mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatInputSource {
    pub core: InputCore,
}

impl ConcatInputSource {
    pub fn new(playlist_url: impl Into<String>) -> Self {
        let core = InputCore::new(playlist_url)
            .with_option(InputOption::Format("concat".into()))
            .with_option(InputOption::ConcatSafe)
            .with_option(InputOption::ProtocolWhitelist(CONCAT_PROTOCOL_WHITELIST.into()))
            .with_option(InputOption::ProbeSize(32))
            .with_option(InputOption::InfiniteLoop);
        Self {
            core: InputCore {
                continuity: StreamContinuity::Continuous,
                ..core
            },
        }
    }
}

impl InputSource for ConcatInputSource {
    fn kind(&self) -> InputKind {
        InputKind::Concat
    }

    fn core(&self) -> &InputCore {
        &self.core
    }

    fn stream_index(&self) -> u32 {
        0
    }

    fn filter_text(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_options_in_order() {
        let source = ConcatInputSource::new("http://localhost:8409/ffmpeg/concat/1");
        let args: Vec<String> = source
            .core
            .options
            .iter()
            .flat_map(|o| o.arguments())
            .collect();
        assert_eq!(
            args,
            [
                "-f",
                "concat",
                "-safe",
                "0",
                "-protocol_whitelist",
                "file,http,tcp,https,tcp,tls",
                "-probesize",
                "32",
                "-stream_loop",
                "-1"
            ]
        );
    }
}
