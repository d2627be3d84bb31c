use std::time::Duration;

use channelcast_core::FrameState;
use channelcast_core::duration_ms::format_millis;

use super::{FrameStateTransition, pair};
use crate::decoder::Decoder;
use crate::input::InputKind;

/// Options placed in front of an input's `-i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOption {
    Decoder(Decoder),
    /// Read at native frame rate.
    Realtime,
    Seek(Duration),
    CopyTimestamps,
    /// `-stream_loop -1`
    InfiniteLoop,
    /// `-loop 1`, repeats a still image.
    LoopImage,
    Format(String),
    ConcatSafe,
    ProtocolWhitelist(String),
    ProbeSize(u32),
    FrameRate(u32),
}

impl InputOption {
    pub fn arguments(&self) -> Vec<String> {
        match self {
            Self::Decoder(decoder) => decoder.arguments(),
            Self::Realtime => vec!["-re".into()],
            Self::Seek(at) => pair("-ss", format_millis(*at)),
            Self::CopyTimestamps => vec!["-copyts".into()],
            Self::InfiniteLoop => pair("-stream_loop", "-1"),
            Self::LoopImage => pair("-loop", "1"),
            Self::Format(format) => pair("-f", format),
            Self::ConcatSafe => pair("-safe", "0"),
            Self::ProtocolWhitelist(list) => pair("-protocol_whitelist", list),
            Self::ProbeSize(size) => pair("-probesize", size),
            Self::FrameRate(rate) => pair("-framerate", rate),
        }
    }

    /// Whether the option belongs in front of an input of `kind`.
    pub fn applies_to(&self, kind: InputKind) -> bool {
        match self {
            Self::Decoder(_) | Self::CopyTimestamps => kind == InputKind::Video,
            Self::Realtime | Self::InfiniteLoop => {
                matches!(kind, InputKind::Video | InputKind::Audio | InputKind::Concat)
            }
            Self::Seek(_) => matches!(
                kind,
                InputKind::Video | InputKind::Audio | InputKind::Subtitle
            ),
            Self::LoopImage | Self::FrameRate(_) => {
                matches!(kind, InputKind::Video | InputKind::Watermark)
            }
            Self::Format(_) | Self::ConcatSafe | Self::ProtocolWhitelist(_) | Self::ProbeSize(_) => {
                true
            }
        }
    }
}

impl FrameStateTransition for InputOption {
    fn affects_frame_state(&self) -> bool {
        match self {
            Self::Decoder(decoder) => decoder.affects_frame_state(),
            _ => false,
        }
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        match self {
            Self::Decoder(decoder) => decoder.next_state(current),
            _ => current.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_is_rendered_in_milliseconds() {
        let seek = InputOption::Seek(Duration::from_millis(90_500));
        assert_eq!(seek.arguments(), ["-ss", "90500ms"]);
        assert!(seek.applies_to(InputKind::Audio));
        assert!(!seek.applies_to(InputKind::Watermark));
    }

    #[test]
    fn copyts_is_video_only() {
        assert!(InputOption::CopyTimestamps.applies_to(InputKind::Video));
        assert!(!InputOption::CopyTimestamps.applies_to(InputKind::Audio));
        assert!(!InputOption::Realtime.affects_frame_state());
    }
}
