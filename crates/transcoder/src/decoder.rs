//! Video decoders.
//!
//! Most backends decode implicitly once the global `-hwaccel` flags are in
//! place; QSV names its decoder explicitly. Every decoder fixes where the
//! decoded frames live.

use channelcast_core::{FrameDataLocation, FrameState, HardwareSurface};

use crate::step::FrameStateTransition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoder {
    /// Software decode chosen by the tool.
    Implicit,
    /// NVDEC through `-hwaccel cuda`, frames stay on the device.
    CudaImplicit,
    VaapiImplicit,
    /// Named `*_qsv` decoder.
    Qsv(&'static str),
    /// VideoToolbox decode, frames copied back to host memory.
    VideoToolbox,
}

impl Decoder {
    pub fn arguments(&self) -> Vec<String> {
        match self {
            Self::Qsv(name) => vec!["-c:v".into(), (*name).into()],
            Self::Implicit | Self::CudaImplicit | Self::VaapiImplicit | Self::VideoToolbox => {
                Vec::new()
            }
        }
    }

    fn surface(&self) -> Option<HardwareSurface> {
        match self {
            Self::CudaImplicit => Some(HardwareSurface::Cuda),
            Self::VaapiImplicit => Some(HardwareSurface::Vaapi),
            Self::Qsv(_) => Some(HardwareSurface::Qsv),
            Self::Implicit | Self::VideoToolbox => None,
        }
    }
}

impl FrameStateTransition for Decoder {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        match self.surface() {
            Some(surface) => FrameState {
                frame_data_location: FrameDataLocation::Hardware,
                pixel_format: current.pixel_format.map(|p| p.wrap(surface)),
                ..current.clone()
            },
            None => FrameState {
                frame_data_location: FrameDataLocation::Software,
                pixel_format: current.pixel_format.map(|p| p.unwrap().into()),
                ..current.clone()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channelcast_core::{FrameSize, PixelFormat, SoftwarePixelFormat, VideoFormat};

    fn source() -> FrameState {
        FrameState {
            pixel_format: Some(PixelFormat::YUV420P10LE),
            ..FrameState::new(VideoFormat::Hevc, FrameSize::new(3840, 2160))
        }
    }

    #[test]
    fn hardware_decoders_wrap_pixel_format() {
        let next = Decoder::CudaImplicit.next_state(&source());
        assert!(next.is_hardware());
        let format = next.pixel_format.unwrap();
        assert_eq!(format.surface(), Some(HardwareSurface::Cuda));
        assert_eq!(format.unwrap(), SoftwarePixelFormat::Yuv420p10le);
        assert_eq!(format.storage_format(), SoftwarePixelFormat::P010le);
    }

    #[test]
    fn software_decoders_keep_frames_on_host() {
        let next = Decoder::VideoToolbox.next_state(&source());
        assert_eq!(next.frame_data_location, FrameDataLocation::Software);
        assert_eq!(next.pixel_format, Some(PixelFormat::YUV420P10LE));
        assert!(Decoder::Implicit.arguments().is_empty());
        assert_eq!(Decoder::Qsv("hevc_qsv").arguments(), ["-c:v", "hevc_qsv"]);
    }
}
