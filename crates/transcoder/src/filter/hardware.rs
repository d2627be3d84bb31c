//! Transfers between host and device memory, and device-side format
//! conversion.
//!
//! Both transfer filters emit their text and flip `frame_data_location`;
//! a download always lands on the unwrapped software format.

use channelcast_core::{FrameDataLocation, FrameState, HardwareSurface, PixelFormat, SoftwarePixelFormat};

use super::Filter;
use crate::step::FrameStateTransition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareUploadFilter {
    pub surface: HardwareSurface,
    /// Software format being uploaded.
    pub format: SoftwarePixelFormat,
    pub extra_frames: Option<u32>,
}

impl Filter for HardwareUploadFilter {
    fn filter(&self) -> String {
        // overlay inputs keep their alpha plane on the device
        let storage = match (self.surface, self.format) {
            (HardwareSurface::Cuda, format) => self.surface.storage_format(format).name(),
            (_, SoftwarePixelFormat::Yuva420p | SoftwarePixelFormat::Rgba) => "bgra",
            (surface, format) => surface.storage_format(format).name(),
        };
        match self.surface {
            HardwareSurface::Cuda => format!("format={storage},hwupload_cuda"),
            HardwareSurface::Vaapi => format!("format={storage}|vaapi,hwupload"),
            HardwareSurface::Qsv => format!(
                "format={storage},hwupload=extra_hw_frames={}",
                self.extra_frames.unwrap_or(64)
            ),
            HardwareSurface::VideoToolbox => "hwupload".into(),
        }
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        Some(FrameDataLocation::Software)
    }
}

impl FrameStateTransition for HardwareUploadFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        FrameState {
            frame_data_location: FrameDataLocation::Hardware,
            pixel_format: Some(PixelFormat::from(self.format).wrap(self.surface)),
            ..current.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareDownloadFilter {
    /// Hardware format of the frames being downloaded.
    pub format: PixelFormat,
}

impl Filter for HardwareDownloadFilter {
    fn filter(&self) -> String {
        let storage = self.format.storage_format();
        let software = self.format.unwrap();
        if storage == software {
            format!("hwdownload,format={storage}")
        } else {
            format!("hwdownload,format={storage},format={software}")
        }
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        Some(FrameDataLocation::Hardware)
    }
}

impl FrameStateTransition for HardwareDownloadFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        FrameState {
            frame_data_location: FrameDataLocation::Software,
            pixel_format: Some(self.format.unwrap().into()),
            ..current.clone()
        }
    }
}

/// Pixel format conversion that stays on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareFormatFilter {
    pub surface: HardwareSurface,
    pub format: SoftwarePixelFormat,
}

impl Filter for HardwareFormatFilter {
    fn filter(&self) -> String {
        let storage = self.surface.storage_format(self.format);
        match self.surface {
            HardwareSurface::Cuda => format!("scale_cuda=format={storage}"),
            HardwareSurface::Vaapi => format!("scale_vaapi=format={storage}"),
            HardwareSurface::Qsv => format!("vpp_qsv=format={storage}"),
            HardwareSurface::VideoToolbox => format!("format={}", self.format),
        }
    }

    fn expected_location(&self) -> Option<FrameDataLocation> {
        Some(FrameDataLocation::Hardware)
    }
}

impl FrameStateTransition for HardwareFormatFilter {
    fn affects_frame_state(&self) -> bool {
        true
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        FrameState {
            pixel_format: Some(PixelFormat::from(self.format).wrap(self.surface)),
            ..current.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_names_storage_then_software_layout() {
        let on_vaapi = PixelFormat::YUV420P.wrap(HardwareSurface::Vaapi);
        let download = HardwareDownloadFilter { format: on_vaapi };
        assert_eq!(download.filter(), "hwdownload,format=nv12,format=yuv420p");
        let next = download.next_state(&FrameState {
            frame_data_location: FrameDataLocation::Hardware,
            pixel_format: Some(on_vaapi),
            ..FrameState::default()
        });
        assert_eq!(next.frame_data_location, FrameDataLocation::Software);
        assert_eq!(next.pixel_format, Some(PixelFormat::YUV420P));

        let nv12 = HardwareDownloadFilter {
            format: PixelFormat::NV12.wrap(HardwareSurface::Cuda),
        };
        assert_eq!(nv12.filter(), "hwdownload,format=nv12");
    }

    #[test]
    fn cuda_upload_converts_to_what_a_download_reads_back() {
        let upload = HardwareUploadFilter {
            surface: HardwareSurface::Cuda,
            format: SoftwarePixelFormat::Yuv420p,
            extra_frames: None,
        };
        assert_eq!(upload.filter(), "format=nv12,hwupload_cuda");
        let uploaded = upload.next_state(&FrameState::default()).pixel_format.unwrap();
        let download = HardwareDownloadFilter { format: uploaded };
        assert_eq!(download.filter(), "hwdownload,format=nv12,format=yuv420p");

        let ten_bit = HardwareUploadFilter {
            format: SoftwarePixelFormat::Yuv420p10le,
            ..upload.clone()
        };
        assert_eq!(ten_bit.filter(), "format=p010le,hwupload_cuda");

        let overlay = HardwareUploadFilter {
            format: SoftwarePixelFormat::Yuva420p,
            ..upload
        };
        assert_eq!(overlay.filter(), "format=yuva420p,hwupload_cuda");
        let next = overlay.next_state(&FrameState::default()).pixel_format.unwrap();
        assert_eq!(next.storage_format(), SoftwarePixelFormat::Yuva420p);
    }

    #[test]
    fn upload_flips_location_and_wraps() {
        let upload = HardwareUploadFilter {
            surface: HardwareSurface::Vaapi,
            format: SoftwarePixelFormat::Yuv420p10le,
            extra_frames: None,
        };
        assert_eq!(upload.filter(), "format=p010le|vaapi,hwupload");
        let overlay = HardwareUploadFilter {
            surface: HardwareSurface::Qsv,
            format: SoftwarePixelFormat::Yuva420p,
            extra_frames: Some(32),
        };
        assert_eq!(overlay.filter(), "format=bgra,hwupload=extra_hw_frames=32");
        let next = upload.next_state(&FrameState::default());
        assert!(next.is_hardware());
        let format = next.pixel_format.unwrap();
        assert_eq!(format.surface(), Some(HardwareSurface::Vaapi));
        assert_eq!(format.unwrap(), SoftwarePixelFormat::Yuv420p10le);
    }

    #[test]
    fn device_format_conversion() {
        let cuda = HardwareFormatFilter {
            surface: HardwareSurface::Cuda,
            format: SoftwarePixelFormat::Yuv420p,
        };
        assert_eq!(cuda.filter(), "scale_cuda=format=nv12");
        let cuda_ten_bit = HardwareFormatFilter {
            surface: HardwareSurface::Cuda,
            format: SoftwarePixelFormat::Yuv420p10le,
        };
        assert_eq!(cuda_ten_bit.filter(), "scale_cuda=format=p010le");
        let qsv = HardwareFormatFilter {
            surface: HardwareSurface::Qsv,
            format: SoftwarePixelFormat::Yuv420p10le,
        };
        assert_eq!(qsv.filter(), "vpp_qsv=format=p010le");
    }
}
