//! Intel QSV: legality comes from the wrapped capabilities (VAAPI on
//! Linux); QSV itself only contributes the set of `*_qsv` decoders the
//! installed tool was built with.

use std::collections::BTreeSet;

use channelcast_core::{PixelFormat, VideoFormat};
use serde::{Deserialize, Serialize};

use super::HardwareCapabilities;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QsvCapabilities {
    inner: Box<HardwareCapabilities>,
    decoders: BTreeSet<String>,
}

impl QsvCapabilities {
    pub fn new(inner: HardwareCapabilities, decoders: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner: Box::new(inner),
            decoders: decoders.into_iter().collect(),
        }
    }

    pub fn inner(&self) -> &HardwareCapabilities {
        &self.inner
    }

    /// Name of the QSV decoder for a format, when the tool has one.
    pub fn decoder_for(&self, format: VideoFormat) -> Option<&'static str> {
        let name = match format {
            VideoFormat::H264 => "h264_qsv",
            VideoFormat::Hevc => "hevc_qsv",
            VideoFormat::Mpeg2Video => "mpeg2_qsv",
            VideoFormat::Vc1 => "vc1_qsv",
            VideoFormat::Vp9 => "vp9_qsv",
            VideoFormat::Av1 => "av1_qsv",
            _ => return None,
        };
        self.decoders.contains(name).then_some(name)
    }

    pub fn can_decode(
        &self,
        format: VideoFormat,
        profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        self.decoder_for(format).is_some() && self.inner.can_decode(format, profile, pixel_format)
    }

    pub fn can_encode(
        &self,
        format: VideoFormat,
        profile: Option<&str>,
        pixel_format: Option<PixelFormat>,
    ) -> bool {
        self.inner.can_encode(format, profile, pixel_format)
    }
}
