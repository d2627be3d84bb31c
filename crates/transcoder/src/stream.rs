//! Probed stream descriptors consumed by the pipeline builders.

use channelcast_core::{ColorFormat, FrameSize, PixelFormat, VideoFormat};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoStream {
    pub index: u32,
    pub codec: String,
    pub profile: Option<String>,
    pub pixel_format: Option<PixelFormat>,
    pub frame_size: FrameSize,
    /// `num:den`, as probed.
    pub sample_aspect_ratio: Option<String>,
    pub display_aspect_ratio: Option<String>,
    pub frame_rate: Option<f64>,
    pub field_order: Option<String>,
    pub bitrate_kbps: Option<u32>,
    pub color_format: ColorFormat,
    /// Cover art stored as a video stream.
    pub is_attached_pic: bool,
}

impl VideoStream {
    pub fn video_format(&self) -> VideoFormat {
        VideoFormat::from_codec_name(&self.codec)
    }

    pub fn bit_depth(&self) -> u8 {
        self.pixel_format.map(|p| p.bit_depth()).unwrap_or(8)
    }

    /// Sample aspect ratio as a reduced pair. Missing or degenerate values
    /// (`0:1`, `N/A`) mean square pixels.
    pub fn sample_aspect_ratio(&self) -> (u64, u64) {
        self.sample_aspect_ratio
            .as_deref()
            .and_then(parse_ratio)
            .unwrap_or((1, 1))
    }

    pub fn is_anamorphic(&self) -> bool {
        let (num, den) = self.sample_aspect_ratio();
        num != den
    }

    pub fn is_interlaced(&self) -> bool {
        matches!(
            self.field_order.as_deref(),
            Some("tt") | Some("bb") | Some("tb") | Some("bt")
        )
    }

    /// Display shape of the stream once sample aspect ratio is applied,
    /// reduced by the greatest common divisor.
    pub fn display_ratio(&self) -> (u64, u64) {
        let (sar_num, sar_den) = self.sample_aspect_ratio();
        reduce(
            u64::from(self.frame_size.width) * sar_num,
            u64::from(self.frame_size.height) * sar_den,
        )
    }

    /// Largest square-pixel size with the stream's display shape that fits
    /// inside `target`.
    pub fn square_pixel_frame_size(&self, target: FrameSize) -> FrameSize {
        let (rw, rh) = self.display_ratio();
        fit_within(rw, rh, target)
    }

    /// Smallest square-pixel size with the stream's display shape that
    /// covers `target`; cropping trims the overflow.
    pub fn square_pixel_fill_size(&self, target: FrameSize) -> FrameSize {
        let (rw, rh) = self.display_ratio();
        fill(rw, rh, target)
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn reduce(width: u64, height: u64) -> (u64, u64) {
    match gcd(width, height) {
        0 => (1, 1),
        g => (width / g, height / g),
    }
}

fn parse_ratio(value: &str) -> Option<(u64, u64)> {
    let (num, den) = value.split_once([':', '/'])?;
    let num: u64 = num.trim().parse().ok()?;
    let den: u64 = den.trim().parse().ok()?;
    if num == 0 || den == 0 {
        return None;
    }
    Some(reduce(num, den))
}

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Axis-constrained fit of the ratio `rw:rh` inside `target`. Integer
/// arithmetic only; the free axis is floored.
pub fn fit_within(rw: u64, rh: u64, target: FrameSize) -> FrameSize {
    let (w, h) = (u64::from(target.width), u64::from(target.height));
    if rw == 0 || rh == 0 {
        return target;
    }
    if w * rh <= h * rw {
        FrameSize::new(target.width, to_u32(w * rh / rw))
    } else {
        FrameSize::new(to_u32(h * rw / rh), target.height)
    }
}

/// Axis-constrained cover of `target` by the ratio `rw:rh`.
pub fn fill(rw: u64, rh: u64, target: FrameSize) -> FrameSize {
    let (w, h) = (u64::from(target.width), u64::from(target.height));
    if rw == 0 || rh == 0 {
        return target;
    }
    if w * rh >= h * rw {
        FrameSize::new(target.width, to_u32((w * rh).div_ceil(rw)))
    } else {
        FrameSize::new(to_u32((h * rw).div_ceil(rh)), target.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioStream {
    pub index: u32,
    pub codec: String,
    pub channels: u32,
    pub sample_rate: Option<u32>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleKind {
    #[default]
    Text,
    Image,
}

/// Bitmap subtitle codecs; everything else renders from text.
const IMAGE_SUBTITLE_CODECS: &[&str] = &[
    "hdmv_pgs_subtitle",
    "pgssub",
    "dvd_subtitle",
    "dvdsub",
    "dvb_subtitle",
    "dvbsub",
    "xsub",
];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStream {
    pub index: u32,
    pub codec: String,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_forced: bool,
    pub is_default: bool,
    /// Canvas size of bitmap subtitles, when known.
    pub frame_size: Option<FrameSize>,
}

impl SubtitleStream {
    pub fn kind(&self) -> SubtitleKind {
        if IMAGE_SUBTITLE_CODECS.contains(&self.codec.as_str()) {
            SubtitleKind::Image
        } else {
            SubtitleKind::Text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anamorphic() -> VideoStream {
        VideoStream {
            codec: "mpeg2video".into(),
            frame_size: FrameSize::new(1920, 800),
            sample_aspect_ratio: Some("4:3".into()),
            ..VideoStream::default()
        }
    }

    #[test]
    fn square_pixel_size_uses_reduced_ratio() {
        let video = anamorphic();
        assert_eq!(video.display_ratio(), (16, 5));
        assert_eq!(
            video.square_pixel_frame_size(FrameSize::new(1280, 720)),
            FrameSize::new(1280, 400)
        );
    }

    #[test]
    fn height_constrained_fit() {
        let video = VideoStream {
            frame_size: FrameSize::new(720, 480),
            sample_aspect_ratio: Some("8:9".into()),
            ..VideoStream::default()
        };
        // 720*8 : 480*9 = 4:3
        assert_eq!(video.display_ratio(), (4, 3));
        assert_eq!(
            video.square_pixel_frame_size(FrameSize::new(1920, 1080)),
            FrameSize::new(1440, 1080)
        );
        assert_eq!(
            video.square_pixel_fill_size(FrameSize::new(1920, 1080)),
            FrameSize::new(1920, 1440)
        );
    }

    #[test]
    fn degenerate_sar_is_square() {
        let video = VideoStream {
            frame_size: FrameSize::new(1280, 720),
            sample_aspect_ratio: Some("0:1".into()),
            ..VideoStream::default()
        };
        assert!(!video.is_anamorphic());
        assert_eq!(
            video.square_pixel_frame_size(FrameSize::new(1280, 720)),
            FrameSize::new(1280, 720)
        );
    }

    #[test]
    fn interlacing_from_field_order() {
        let mut video = anamorphic();
        assert!(!video.is_interlaced());
        video.field_order = Some("tt".into());
        assert!(video.is_interlaced());
        video.field_order = Some("progressive".into());
        assert!(!video.is_interlaced());
    }

    #[test]
    fn subtitle_kind_from_codec() {
        let pgs = SubtitleStream {
            codec: "hdmv_pgs_subtitle".into(),
            ..SubtitleStream::default()
        };
        assert_eq!(pgs.kind(), SubtitleKind::Image);
        let srt = SubtitleStream {
            codec: "subrip".into(),
            ..SubtitleStream::default()
        };
        assert_eq!(srt.kind(), SubtitleKind::Text);
    }
}
