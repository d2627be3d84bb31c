use std::time::Duration;

use channelcast_core::duration_ms::format_millis;
use channelcast_core::{
    DashOptions, FrameState, HlsOptions, HlsSegmentType, OutputFormat, PixelFormat,
};

use super::{FrameStateTransition, pair};
use crate::encoder::{AudioEncoder, VideoEncoder};
use crate::hls::{FMP4_INIT_FILENAME, HlsPaths, force_key_frames_expression};

const PIPE_OUTPUT: &str = "pipe:1";

/// Options placed after the inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputOption {
    VideoEncoder(VideoEncoder),
    AudioEncoder(AudioEncoder),
    /// kbit/s, also used as the rate ceiling.
    VideoBitrate(u32),
    /// kbit
    VideoBufferSize(u32),
    VideoProfile(String),
    VideoPreset(String),
    FrameRate(f64),
    VideoTrackTimescale(u32),
    KeyFrames { gop: u32, segment_seconds: u32 },
    PixelFormat(PixelFormat),
    AudioChannels(u32),
    /// kbit/s
    AudioBitrate(u32),
    /// kbit
    AudioBufferSize(u32),
    AudioSampleRate(u32),
    NoMuxDelay,
    NoMetadata,
    Metadata { key: String, value: String },
    OutputTsOffset(f64),
    Duration(Duration),
    Format(OutputFormat),
}

impl OutputOption {
    pub fn arguments(&self) -> Vec<String> {
        match self {
            Self::VideoEncoder(encoder) => encoder.arguments(),
            Self::AudioEncoder(encoder) => encoder.arguments(),
            Self::VideoBitrate(kbps) => {
                let mut args = pair("-b:v", format!("{kbps}k"));
                args.extend(pair("-maxrate:v", format!("{kbps}k")));
                args
            }
            Self::VideoBufferSize(kb) => pair("-bufsize:v", format!("{kb}k")),
            Self::VideoProfile(profile) => pair("-profile:v", profile),
            Self::VideoPreset(preset) => pair("-preset:v", preset),
            Self::FrameRate(rate) => pair("-r", rate),
            Self::VideoTrackTimescale(timescale) => pair("-video_track_timescale", timescale),
            Self::KeyFrames {
                gop,
                segment_seconds,
            } => {
                let mut args = pair("-g", gop);
                args.extend(pair("-keyint_min", gop));
                args.extend(pair(
                    "-force_key_frames",
                    force_key_frames_expression(*segment_seconds),
                ));
                args
            }
            Self::PixelFormat(format) => pair("-pix_fmt", format.name()),
            Self::AudioChannels(channels) => pair("-ac", channels),
            Self::AudioBitrate(kbps) => {
                let mut args = pair("-b:a", format!("{kbps}k"));
                args.extend(pair("-maxrate:a", format!("{kbps}k")));
                args
            }
            Self::AudioBufferSize(kb) => pair("-bufsize:a", format!("{kb}k")),
            Self::AudioSampleRate(rate) => pair("-ar", rate),
            Self::NoMuxDelay => {
                let mut args = pair("-muxdelay", "0");
                args.extend(pair("-muxpreload", "0"));
                args
            }
            Self::NoMetadata => pair("-map_metadata", "-1"),
            Self::Metadata { key, value } => pair("-metadata", format!("{key}={value}")),
            Self::OutputTsOffset(seconds) => pair("-output_ts_offset", seconds),
            Self::Duration(duration) => pair("-t", format_millis(*duration)),
            Self::Format(format) => format_arguments(format),
        }
    }
}

impl FrameStateTransition for OutputOption {
    fn affects_frame_state(&self) -> bool {
        match self {
            Self::VideoEncoder(encoder) => encoder.affects_frame_state(),
            _ => false,
        }
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        match self {
            Self::VideoEncoder(encoder) => encoder.next_state(current),
            _ => current.clone(),
        }
    }
}

fn format_arguments(format: &OutputFormat) -> Vec<String> {
    let mut args = pair("-f", format.name());
    match format {
        OutputFormat::MpegTs => {
            args.extend(pair("-mpegts_flags", "+initial_discontinuity"));
            args.push(PIPE_OUTPUT.into());
        }
        OutputFormat::Mp4 => {
            args.extend(pair(
                "-movflags",
                "+empty_moov+omit_tfhd_offset+frag_keyframe+default_base_moof",
            ));
            args.push(PIPE_OUTPUT.into());
        }
        OutputFormat::Mkv => args.push(PIPE_OUTPUT.into()),
        // raw passthrough; a pipe cannot seek back to write the index
        OutputFormat::Nut => {
            args.extend(pair("-write_index", "0"));
            args.push(PIPE_OUTPUT.into());
        }
        OutputFormat::Hls(options) => args.extend(hls_arguments(options)),
        OutputFormat::Dash(options) => args.extend(dash_arguments(options)),
    }
    args
}

fn hls_arguments(options: &HlsOptions) -> Vec<String> {
    let paths = HlsPaths::from_options(options);
    let mut args = pair("-hls_time", options.hls_time);
    args.extend(pair("-hls_list_size", options.hls_list_size));
    args.extend(pair("-segment_list_flags", "+live"));
    match options.segment_type {
        HlsSegmentType::MpegTs => args.extend(pair("-hls_segment_type", "mpegts")),
        HlsSegmentType::Fmp4 => {
            args.extend(pair("-hls_segment_type", "fmp4"));
            args.extend(pair("-hls_fmp4_init_filename", FMP4_INIT_FILENAME));
        }
    }
    args.extend(pair("-hls_segment_filename", &paths.segment_template));
    if let Some(url) = &paths.base_url {
        args.extend(pair("-hls_base_url", url));
    }
    if let Some(threshold) = options.hls_delete_threshold {
        args.extend(pair("-hls_delete_threshold", threshold));
    }

    let mut flags = vec!["program_date_time"];
    if !options.is_first_transcode {
        // continue the running playlist instead of starting over
        flags.push("append_list");
        flags.push("discont_start");
    }
    flags.push("omit_endlist");
    flags.push("independent_segments");
    if options.delete_segments {
        flags.push("delete_segments");
    }
    args.extend(pair("-hls_flags", flags.join("+")));
    args.push(paths.playlist);
    args
}

fn dash_arguments(options: &DashOptions) -> Vec<String> {
    let mut args = pair("-seg_duration", options.seg_duration);
    args.extend(pair("-window_size", options.window_size));
    args.extend(pair("-use_template", "1"));
    args.extend(pair("-use_timeline", "0"));
    args.extend(pair("-streaming", "1"));
    args.push(options.manifest_path.clone());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpegts_writes_to_pipe() {
        assert_eq!(
            OutputOption::Format(OutputFormat::MpegTs).arguments(),
            ["-f", "mpegts", "-mpegts_flags", "+initial_discontinuity", "pipe:1"]
        );
    }

    #[test]
    fn nut_skips_the_trailing_index() {
        assert_eq!(
            OutputOption::Format(OutputFormat::Nut).arguments(),
            ["-f", "nut", "-write_index", "0", "pipe:1"]
        );
    }

    #[test]
    fn hls_continuation_appends_with_discontinuity() {
        let options = HlsOptions {
            stream_base_path: "/tmp/hls".into(),
            segment_base_directory: "/tmp/hls".into(),
            is_first_transcode: false,
            ..HlsOptions::default()
        };
        let args = OutputOption::Format(OutputFormat::Hls(options.clone())).arguments();
        let flags = args
            .iter()
            .position(|a| a == "-hls_flags")
            .map(|i| args[i + 1].clone())
            .unwrap();
        assert_eq!(
            flags,
            "program_date_time+append_list+discont_start+omit_endlist+independent_segments"
        );
        assert_eq!(args.last().unwrap(), "/tmp/hls/stream.m3u8");

        let first = OutputOption::Format(OutputFormat::Hls(HlsOptions {
            is_first_transcode: true,
            ..options
        }))
        .arguments();
        assert!(first.contains(&"program_date_time+omit_endlist+independent_segments".to_string()));
    }

    #[test]
    fn keyframes_pin_gop_and_minimum() {
        let args = OutputOption::KeyFrames {
            gop: 96,
            segment_seconds: 4,
        }
        .arguments();
        assert_eq!(
            args,
            [
                "-g",
                "96",
                "-keyint_min",
                "96",
                "-force_key_frames",
                "expr:gte(t,n_forced*4)"
            ]
        );
    }

    #[test]
    fn dash_manifest_is_last() {
        let args = OutputOption::Format(OutputFormat::Dash(DashOptions::default())).arguments();
        assert_eq!(&args[..2], ["-f", "dash"]);
        assert_eq!(args.last().unwrap(), "manifest.mpd");
    }
}
