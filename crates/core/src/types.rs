use serde::{Deserialize, Serialize};

/// Video codec tag, as the external tool names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    H264,
    Hevc,
    Mpeg1Video,
    Mpeg2Video,
    Mpeg4,
    Msmpeg4v3,
    Vc1,
    Vp8,
    Vp9,
    Av1,
    RawVideo,
    Copy,
    #[default]
    Undetermined,
}

impl VideoFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
            Self::Mpeg1Video => "mpeg1video",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg4 => "mpeg4",
            Self::Msmpeg4v3 => "msmpeg4v3",
            Self::Vc1 => "vc1",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::RawVideo => "rawvideo",
            Self::Copy => "copy",
            Self::Undetermined => "undetermined",
        }
    }

    /// Map a probed `codec_name` onto a known format. Aliases used by
    /// some containers (`h265`, `avc1`, `hvc1`) are folded in.
    pub fn from_codec_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "h264" | "avc" | "avc1" => Self::H264,
            "hevc" | "h265" | "hvc1" | "hev1" => Self::Hevc,
            "mpeg1video" => Self::Mpeg1Video,
            "mpeg2video" => Self::Mpeg2Video,
            "mpeg4" => Self::Mpeg4,
            "msmpeg4v3" => Self::Msmpeg4v3,
            "vc1" => Self::Vc1,
            "vp8" => Self::Vp8,
            "vp9" => Self::Vp9,
            "av1" => Self::Av1,
            "rawvideo" => Self::RawVideo,
            "copy" => Self::Copy,
            _ => Self::Undetermined,
        }
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio codec tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    #[default]
    Aac,
    Ac3,
    Mp3,
    Flac,
    PcmS16le,
    Copy,
}

impl AudioFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Ac3 => "ac3",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::PcmS16le => "pcm_s16le",
            Self::Copy => "copy",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware acceleration backend used for decoding or encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareAccelerationMode {
    #[default]
    None,
    Cuda,
    Qsv,
    Vaapi,
    VideoToolbox,
}

impl HardwareAccelerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Cuda => "cuda",
            Self::Qsv => "qsv",
            Self::Vaapi => "vaapi",
            Self::VideoToolbox => "videotoolbox",
        }
    }

    pub fn is_hardware(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Display for HardwareAccelerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where decoded frames currently live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameDataLocation {
    #[default]
    Unknown,
    Software,
    Hardware,
}

impl FrameDataLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Software => "software",
            Self::Hardware => "hardware",
        }
    }
}

impl std::fmt::Display for FrameDataLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log verbosity of the external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Quiet,
    Panic,
    Fatal,
    #[default]
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Panic => "panic",
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Numeric level understood by `FFREPORT`.
    pub fn numeric(self) -> i32 {
        match self {
            Self::Quiet => -8,
            Self::Panic => 0,
            Self::Fatal => 8,
            Self::Error => 16,
            Self::Warning => 24,
            Self::Info => 32,
            Self::Verbose => 40,
            Self::Debug => 48,
            Self::Trace => 56,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
