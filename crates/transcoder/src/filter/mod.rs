//! Filters.
//!
//! Each filter is one small transform with one state-transition rule. They
//! are grouped per input (see [`crate::input`]) or, for the steps that join
//! inputs or run after the joins, in a [`FilterChain`].

pub mod audio;
pub mod complex;
pub mod crop;
pub mod deinterlace;
pub mod hardware;
pub mod overlay;
pub mod pad;
pub mod pixel_format;
pub mod scale;
pub mod subtitle;
pub mod tonemap;
pub mod watermark;

use channelcast_core::{FrameDataLocation, FrameState};

use crate::step::FrameStateTransition;

pub use audio::AudioFilter;
pub use crop::CropFilter;
pub use deinterlace::{DeinterlaceFilter, DeinterlaceKind};
pub use hardware::{HardwareDownloadFilter, HardwareFormatFilter, HardwareUploadFilter};
pub use overlay::{OverlayFilter, OverlayKind, OverlayPosition};
pub use pad::{PadFilter, PadKind};
pub use pixel_format::PixelFormatFilter;
pub use scale::{ScaleFilter, ScaleKind};
pub use subtitle::SubtitlesFilter;
pub use tonemap::{TonemapFilter, TonemapKind};
pub use watermark::WatermarkFilter;

/// A video filter as it appears in the graph.
pub trait Filter: FrameStateTransition {
    fn filter(&self) -> String;

    /// Where frames must live for the filter to accept them.
    fn expected_location(&self) -> Option<FrameDataLocation> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoFilter {
    Deinterlace(DeinterlaceFilter),
    Tonemap(TonemapFilter),
    Scale(ScaleFilter),
    Crop(CropFilter),
    Pad(PadFilter),
    HardwareUpload(HardwareUploadFilter),
    HardwareDownload(HardwareDownloadFilter),
    HardwareFormat(HardwareFormatFilter),
    PixelFormat(PixelFormatFilter),
    Overlay(OverlayFilter),
    Subtitles(SubtitlesFilter),
    Watermark(WatermarkFilter),
}

impl VideoFilter {
    fn inner(&self) -> &dyn Filter {
        match self {
            Self::Deinterlace(f) => f,
            Self::Tonemap(f) => f,
            Self::Scale(f) => f,
            Self::Crop(f) => f,
            Self::Pad(f) => f,
            Self::HardwareUpload(f) => f,
            Self::HardwareDownload(f) => f,
            Self::HardwareFormat(f) => f,
            Self::PixelFormat(f) => f,
            Self::Overlay(f) => f,
            Self::Subtitles(f) => f,
            Self::Watermark(f) => f,
        }
    }
}

impl Filter for VideoFilter {
    fn filter(&self) -> String {
        self.inner().filter()
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        self.inner().expected_location()
    }
}

impl FrameStateTransition for VideoFilter {
    fn affects_frame_state(&self) -> bool {
        self.inner().affects_frame_state()
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        self.inner().next_state(current)
    }
}

/// Comma-joined filter text, `None` for an empty list.
pub fn join_filters<'a>(filters: impl IntoIterator<Item = &'a VideoFilter>) -> Option<String> {
    let parts: Vec<String> = filters.into_iter().map(|f| f.filter()).collect();
    (!parts.is_empty()).then(|| parts.join(","))
}

/// Filter steps that join inputs, or run after the joins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    pub subtitle_overlay: Vec<VideoFilter>,
    pub watermark_overlay: Vec<VideoFilter>,
    /// Trailing pixel-format fixups.
    pub pixel_format: Vec<VideoFilter>,
}

impl FilterChain {
    pub fn has_overlay(&self) -> bool {
        !self.subtitle_overlay.is_empty() || !self.watermark_overlay.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_overlay() && self.pixel_format.is_empty()
    }
}

pub(crate) fn location_for_hardware(hardware: bool) -> Option<FrameDataLocation> {
    Some(if hardware {
        FrameDataLocation::Hardware
    } else {
        FrameDataLocation::Software
    })
}
