use channelcast_core::{
    ColorFormat, FrameDataLocation, FrameState, HardwareSurface, PixelFormat, SoftwarePixelFormat,
};

use super::{Filter, location_for_hardware};
use crate::step::FrameStateTransition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TonemapKind {
    Software,
    Cuda,
    Vaapi,
    Qsv,
}

impl TonemapKind {
    /// Device tonemapper for a surface, with the filter it needs.
    pub fn for_surface(surface: HardwareSurface) -> Option<(Self, &'static str)> {
        match surface {
            HardwareSurface::Cuda => Some((Self::Cuda, "tonemap_cuda")),
            HardwareSurface::Vaapi => Some((Self::Vaapi, "tonemap_vaapi")),
            HardwareSurface::Qsv => Some((Self::Qsv, "vpp_qsv")),
            HardwareSurface::VideoToolbox => None,
        }
    }

    fn surface(self) -> Option<HardwareSurface> {
        match self {
            Self::Software => None,
            Self::Cuda => Some(HardwareSurface::Cuda),
            Self::Vaapi => Some(HardwareSurface::Vaapi),
            Self::Qsv => Some(HardwareSurface::Qsv),
        }
    }
}

/// HDR to BT.709 SDR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TonemapFilter {
    pub kind: TonemapKind,
    /// Output layout.
    pub format: SoftwarePixelFormat,
}

impl Filter for TonemapFilter {
    fn filter(&self) -> String {
        let storage = HardwareSurface::Vaapi.storage_format(self.format);
        match self.kind {
            TonemapKind::Software => format!(
                "zscale=transfer=linear:npl=100,format=gbrpf32le,zscale=primaries=bt709,\
                 tonemap=tonemap=hable:desat=0,zscale=transfer=bt709:matrix=bt709:range=tv,\
                 format={}",
                self.format
            ),
            TonemapKind::Cuda => format!(
                "tonemap_cuda=format={storage}:tonemap=hable:desat=0:primaries=bt709:transfer=bt709:matrix=bt709"
            ),
            TonemapKind::Vaapi => format!("tonemap_vaapi=format={storage}:t=bt709:m=bt709:p=bt709"),
            TonemapKind::Qsv => format!("vpp_qsv=tonemap=1:format={storage}"),
        }
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        location_for_hardware(self.kind != TonemapKind::Software)
    }
}

impl FrameStateTransition for TonemapFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        let format = PixelFormat::from(self.format);
        FrameState {
            color_format: Some(ColorFormat::bt709()),
            pixel_format: Some(match self.kind.surface() {
                Some(surface) => format.wrap(surface),
                None => format,
            }),
            ..current.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_tonemap_lands_on_bt709() {
        let filter = TonemapFilter {
            kind: TonemapKind::Software,
            format: SoftwarePixelFormat::Yuv420p,
        };
        assert!(filter.filter().starts_with("zscale=transfer=linear"));
        assert!(filter.filter().ends_with("format=yuv420p"));
        let hdr = FrameState {
            color_format: Some(ColorFormat {
                color_transfer: Some("smpte2084".into()),
                ..ColorFormat::default()
            }),
            pixel_format: Some(PixelFormat::YUV420P10LE),
            ..FrameState::default()
        };
        let next = filter.next_state(&hdr);
        assert!(next.color_format.unwrap().is_bt709());
        assert_eq!(next.pixel_format, Some(PixelFormat::YUV420P));
    }

    #[test]
    fn vaapi_tonemap_stays_on_device() {
        let filter = TonemapFilter {
            kind: TonemapKind::Vaapi,
            format: SoftwarePixelFormat::Yuv420p,
        };
        assert_eq!(filter.filter(), "tonemap_vaapi=format=nv12:t=bt709:m=bt709:p=bt709");
        let next = filter.next_state(&FrameState::default());
        assert_eq!(next.pixel_format.and_then(|p| p.surface()), Some(HardwareSurface::Vaapi));
    }
}
