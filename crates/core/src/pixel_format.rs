//! Pixel formats, in software and hardware-wrapped form.
//!
//! A hardware-wrapped format records which device surface holds the frame
//! and the software layout the frame represents. [`PixelFormat::unwrap`]
//! always resolves to that software layout, which is what download and
//! `format=` filters have to name.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A pixel format the tool can decode, filter and encode in host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftwarePixelFormat {
    Yuv420p,
    Yuvj420p,
    Yuv420p10le,
    Yuv422p,
    Yuv444p,
    Yuv444p10le,
    Nv12,
    P010le,
    Yuva420p,
    Rgba,
}

impl SoftwarePixelFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuvj420p => "yuvj420p",
            Self::Yuv420p10le => "yuv420p10le",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv444p10le => "yuv444p10le",
            Self::Nv12 => "nv12",
            Self::P010le => "p010le",
            Self::Yuva420p => "yuva420p",
            Self::Rgba => "rgba",
        }
    }

    pub fn bit_depth(self) -> u8 {
        match self {
            Self::Yuv420p10le | Self::Yuv444p10le | Self::P010le => 10,
            _ => 8,
        }
    }

    /// Whether the format uses 4:2:0 chroma subsampling, the only layout
    /// accelerator surfaces can hold.
    pub fn is_420(self) -> bool {
        matches!(
            self,
            Self::Yuv420p
                | Self::Yuvj420p
                | Self::Yuv420p10le
                | Self::Nv12
                | Self::P010le
                | Self::Yuva420p
        )
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let format = match name.to_ascii_lowercase().as_str() {
            "yuv420p" => Self::Yuv420p,
            "yuvj420p" => Self::Yuvj420p,
            "yuv420p10le" | "yuv420p10" => Self::Yuv420p10le,
            "yuv422p" => Self::Yuv422p,
            "yuv444p" => Self::Yuv444p,
            "yuv444p10le" => Self::Yuv444p10le,
            "nv12" => Self::Nv12,
            "p010le" | "p010" => Self::P010le,
            "yuva420p" => Self::Yuva420p,
            "rgba" => Self::Rgba,
            _ => return None,
        };
        Some(format)
    }

    /// The canonical planar format for a bit depth.
    pub fn for_bit_depth(bit_depth: u8) -> Self {
        if bit_depth > 8 {
            Self::Yuv420p10le
        } else {
            Self::Yuv420p
        }
    }
}

impl std::fmt::Display for SoftwarePixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Device surface type wrapping a hardware-resident frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareSurface {
    Cuda,
    Qsv,
    Vaapi,
    VideoToolbox,
}

impl HardwareSurface {
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Qsv => "qsv",
            Self::Vaapi => "vaapi",
            Self::VideoToolbox => "videotoolbox_vld",
        }
    }

    /// Memory layout of a surface holding frames of `format`. Only CUDA
    /// keeps an alpha plane on the device.
    pub fn storage_format(self, format: SoftwarePixelFormat) -> SoftwarePixelFormat {
        match (self, format) {
            (Self::Cuda, SoftwarePixelFormat::Yuva420p | SoftwarePixelFormat::Rgba) => {
                SoftwarePixelFormat::Yuva420p
            }
            _ if format.bit_depth() > 8 => SoftwarePixelFormat::P010le,
            _ => SoftwarePixelFormat::Nv12,
        }
    }

    /// Software format a frame represents once uploaded. Surfaces hold
    /// 4:2:0 data only, plus alpha overlays on CUDA.
    pub fn upload_format(self, format: SoftwarePixelFormat) -> SoftwarePixelFormat {
        match (self, format) {
            (Self::Cuda, SoftwarePixelFormat::Yuva420p | SoftwarePixelFormat::Rgba) => {
                SoftwarePixelFormat::Yuva420p
            }
            _ if format.is_420() && format != SoftwarePixelFormat::Yuva420p => format,
            _ => SoftwarePixelFormat::for_bit_depth(format.bit_depth()),
        }
    }
}

/// Pixel format of a frame at some point of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PixelFormat {
    Software(SoftwarePixelFormat),
    Hardware {
        surface: HardwareSurface,
        underlying: SoftwarePixelFormat,
    },
}

impl PixelFormat {
    pub const YUV420P: Self = Self::Software(SoftwarePixelFormat::Yuv420p);
    pub const YUV420P10LE: Self = Self::Software(SoftwarePixelFormat::Yuv420p10le);
    pub const NV12: Self = Self::Software(SoftwarePixelFormat::Nv12);
    pub const P010LE: Self = Self::Software(SoftwarePixelFormat::P010le);
    pub const YUVA420P: Self = Self::Software(SoftwarePixelFormat::Yuva420p);

    /// Logical name: the software layout, even when wrapped.
    pub fn name(&self) -> &'static str {
        self.unwrap().name()
    }

    /// Name the tool uses on the command line for this exact format.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Software(format) => format.name(),
            Self::Hardware { surface, .. } => surface.wire_name(),
        }
    }

    pub fn bit_depth(&self) -> u8 {
        self.unwrap().bit_depth()
    }

    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware { .. })
    }

    pub fn surface(&self) -> Option<HardwareSurface> {
        match self {
            Self::Software(_) => None,
            Self::Hardware { surface, .. } => Some(*surface),
        }
    }

    /// The software format underneath, or the format itself.
    pub fn unwrap(&self) -> SoftwarePixelFormat {
        match self {
            Self::Software(format) => *format,
            Self::Hardware { underlying, .. } => *underlying,
        }
    }

    /// Wrap as a frame resident on `surface`.
    pub fn wrap(&self, surface: HardwareSurface) -> Self {
        Self::Hardware {
            surface,
            underlying: surface.upload_format(self.unwrap()),
        }
    }

    /// Layout a download from the device yields before any conversion.
    pub fn storage_format(&self) -> SoftwarePixelFormat {
        match self {
            Self::Software(format) => *format,
            Self::Hardware {
                surface,
                underlying,
            } => surface.storage_format(*underlying),
        }
    }

    /// Equality after unwrapping both sides.
    pub fn same_layout(&self, other: &Self) -> bool {
        self.unwrap() == other.unwrap()
    }
}

impl From<SoftwarePixelFormat> for PixelFormat {
    fn from(format: SoftwarePixelFormat) -> Self {
        Self::Software(format)
    }
}

impl FromStr for PixelFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoftwarePixelFormat::from_name(s)
            .map(Self::Software)
            .ok_or_else(|| CoreError::UnknownPixelFormat(s.to_string()))
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Software(format) => f.write_str(format.name()),
            Self::Hardware {
                surface,
                underlying,
            } => write!(f, "{}({})", surface.wire_name(), underlying.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_formats_unwrap_to_their_software_layout() {
        let wrapped = PixelFormat::YUV420P10LE.wrap(HardwareSurface::Vaapi);
        assert_eq!(wrapped.unwrap(), SoftwarePixelFormat::Yuv420p10le);
        assert_eq!(wrapped.wire_name(), "vaapi");
        assert_eq!(wrapped.storage_format(), SoftwarePixelFormat::P010le);
        assert_eq!(wrapped.bit_depth(), 10);
    }

    #[test]
    fn upload_collapses_non_420_layouts() {
        let yuv444: PixelFormat = SoftwarePixelFormat::Yuv444p.into();
        assert_eq!(
            yuv444.wrap(HardwareSurface::Qsv).unwrap(),
            SoftwarePixelFormat::Yuv420p
        );
        let on_cuda = yuv444.wrap(HardwareSurface::Cuda);
        assert_eq!(on_cuda.unwrap(), SoftwarePixelFormat::Yuv420p);
        assert_eq!(on_cuda.storage_format(), SoftwarePixelFormat::Nv12);
    }

    #[test]
    fn only_cuda_stores_alpha() {
        let overlay = PixelFormat::YUVA420P;
        assert_eq!(
            overlay.wrap(HardwareSurface::Cuda).storage_format(),
            SoftwarePixelFormat::Yuva420p
        );
        assert_eq!(
            overlay.wrap(HardwareSurface::Vaapi).storage_format(),
            SoftwarePixelFormat::Nv12
        );
    }

    #[test]
    fn same_layout_ignores_residency() {
        let hw = PixelFormat::YUV420P.wrap(HardwareSurface::Cuda);
        assert!(hw.same_layout(&PixelFormat::YUV420P));
        assert_ne!(hw, PixelFormat::YUV420P);
    }

    #[test]
    fn parses_known_names_only() {
        assert_eq!("p010".parse::<PixelFormat>().unwrap(), PixelFormat::P010LE);
        assert!("gbrp".parse::<PixelFormat>().is_err());
    }

    #[test]
    fn software_formats_deserialize_from_plain_strings() {
        let parsed: PixelFormat = serde_json::from_str("\"yuv420p\"").unwrap();
        assert_eq!(parsed, PixelFormat::YUV420P);
    }
}
