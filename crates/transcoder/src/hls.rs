//! HLS keyframe arithmetic and playlist/segment naming.

use channelcast_core::{HlsOptions, HlsSegmentType};
use serde::Serialize;

/// Content-Type for HLS master/variant playlists.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Content-Type for MPEG-TS segments.
pub const SEGMENT_CONTENT_TYPE_TS: &str = "video/MP2T";

/// Content-Type for fMP4 segments.
pub const SEGMENT_CONTENT_TYPE_MP4: &str = "video/mp4";

/// Init segment written ahead of fMP4 media segments.
pub const FMP4_INIT_FILENAME: &str = "init.mp4";

/// Frames per GOP so every segment starts on a keyframe: one GOP per
/// segment, or one per second when `one_second_gop` is set.
pub fn hls_gop_size(frame_rate: f64, segment_seconds: u32, one_second_gop: bool) -> u32 {
    let fps = if frame_rate.is_finite() && frame_rate >= 1.0 {
        frame_rate.round() as u32
    } else {
        1
    };
    if one_second_gop {
        fps
    } else {
        fps * segment_seconds.max(1)
    }
}

/// Keyframe forcing expression aligned to segment boundaries.
pub fn force_key_frames_expression(segment_seconds: u32) -> String {
    format!("expr:gte(t,n_forced*{})", segment_seconds.max(1))
}

/// Segment content type for a segment container.
pub fn segment_content_type(segment_type: HlsSegmentType) -> &'static str {
    match segment_type {
        HlsSegmentType::MpegTs => SEGMENT_CONTENT_TYPE_TS,
        HlsSegmentType::Fmp4 => SEGMENT_CONTENT_TYPE_MP4,
    }
}

/// Literal path templates the tool writes playlist and segments to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HlsPaths {
    pub playlist: String,
    pub segment_template: String,
    pub base_url: Option<String>,
    pub segment_content_type: &'static str,
}

impl HlsPaths {
    pub fn from_options(options: &HlsOptions) -> Self {
        Self {
            playlist: join_path(&options.stream_base_path, &options.stream_name_format),
            segment_template: join_path(
                &options.segment_base_directory,
                &options.segment_name_format,
            ),
            base_url: options.stream_base_url.clone(),
            segment_content_type: segment_content_type(options.segment_type),
        }
    }
}

fn join_path(directory: &str, file: &str) -> String {
    if directory.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", directory.trim_end_matches('/'), file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gop_spans_one_segment() {
        assert_eq!(hls_gop_size(24.0, 4, false), 96);
        assert_eq!(hls_gop_size(29.97, 6, false), 180);
        assert_eq!(hls_gop_size(24.0, 4, true), 24);
        assert_eq!(hls_gop_size(f64::NAN, 4, false), 4);
    }

    #[test]
    fn content_types() {
        assert_eq!(segment_content_type(HlsSegmentType::MpegTs), SEGMENT_CONTENT_TYPE_TS);
        assert_eq!(segment_content_type(HlsSegmentType::Fmp4), SEGMENT_CONTENT_TYPE_MP4);
    }

    #[test]
    fn paths_join_directory_and_template() {
        let options = HlsOptions {
            stream_base_path: "/tmp/channel/1/".into(),
            segment_base_directory: "/tmp/channel/1".into(),
            stream_base_url: Some("/iptv/session/1/".into()),
            ..HlsOptions::default()
        };
        let paths = HlsPaths::from_options(&options);
        assert_eq!(paths.playlist, "/tmp/channel/1/stream.m3u8");
        assert_eq!(paths.segment_template, "/tmp/channel/1/data%06d.ts");
        assert_eq!(paths.base_url.as_deref(), Some("/iptv/session/1/"));
        assert_eq!(force_key_frames_expression(4), "expr:gte(t,n_forced*4)");
    }
}
