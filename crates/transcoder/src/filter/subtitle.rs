use channelcast_core::FrameDataLocation;

use super::Filter;
use crate::step::FrameStateTransition;

/// Burns text subtitles into the main video with libass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlesFilter {
    pub path: String,
    /// Position among the subtitle streams of the file.
    pub ordinal: u32,
}

impl Filter for SubtitlesFilter {
    fn filter(&self) -> String {
        format!("subtitles=f='{}':si={}", escape_path(&self.path), self.ordinal)
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        Some(FrameDataLocation::Software)
    }
}

impl FrameStateTransition for SubtitlesFilter {}

/// Quote a path for use inside a filter argument: it goes through the
/// option parser once and the graph parser once.
fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '\\' => escaped.push_str("\\\\\\\\"),
            '\'' => escaped.push_str("'\\\\\\''"),
            ':' => escaped.push_str("\\\\:"),
            '[' | ']' | ',' | ';' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path() {
        let f = SubtitlesFilter {
            path: "/media/subs/episode.srt".into(),
            ordinal: 0,
        };
        assert_eq!(f.filter(), "subtitles=f='/media/subs/episode.srt':si=0");
    }

    #[test]
    fn special_characters_are_escaped() {
        assert_eq!(escape_path("C:/a,b"), "C\\\\:/a\\,b");
        assert_eq!(escape_path("it's"), "it'\\\\\\''s");
    }
}
