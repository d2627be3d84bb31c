use channelcast_core::{HardwareAccelerationMode, LogLevel};

use super::pair;

/// Device declaration for the active backend. `decode` adds the flags that
/// keep decoded frames on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareAccelerationOption {
    pub mode: HardwareAccelerationMode,
    pub decode: bool,
    pub device: String,
}

impl HardwareAccelerationOption {
    pub fn arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self.mode {
            HardwareAccelerationMode::None => {}
            HardwareAccelerationMode::Cuda => {
                if self.decode {
                    args.extend(pair("-hwaccel", "cuda"));
                    args.extend(pair("-hwaccel_output_format", "cuda"));
                }
            }
            HardwareAccelerationMode::Vaapi => {
                if self.decode {
                    args.extend(pair("-hwaccel", "vaapi"));
                }
                args.extend(pair("-vaapi_device", &self.device));
                if self.decode {
                    args.extend(pair("-hwaccel_output_format", "vaapi"));
                }
            }
            HardwareAccelerationMode::Qsv => {
                args.extend(pair("-init_hw_device", format!("qsv=hw:{}", self.device)));
                args.extend(pair("-filter_hw_device", "hw"));
                if self.decode {
                    args.extend(pair("-hwaccel", "qsv"));
                    args.extend(pair("-hwaccel_output_format", "qsv"));
                }
            }
            HardwareAccelerationMode::VideoToolbox => {
                if self.decode {
                    args.extend(pair("-hwaccel", "videotoolbox"));
                }
            }
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalOption {
    NoStandardInput,
    HideBanner,
    NoStats,
    LogLevel(LogLevel),
    /// Regenerate missing timestamps and drop corrupt packets.
    StandardFormatFlags,
    Threads(u32),
    HardwareAcceleration(HardwareAccelerationOption),
}

impl GlobalOption {
    pub fn arguments(&self) -> Vec<String> {
        match self {
            Self::NoStandardInput => vec!["-nostdin".into()],
            Self::HideBanner => vec!["-hide_banner".into()],
            Self::NoStats => vec!["-nostats".into()],
            Self::LogLevel(level) => pair("-loglevel", level.as_str()),
            Self::StandardFormatFlags => pair("-fflags", "+genpts+discardcorrupt+igndts"),
            Self::Threads(count) => pair("-threads", count),
            Self::HardwareAcceleration(option) => option.arguments(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hwaccel(mode: HardwareAccelerationMode, decode: bool) -> Vec<String> {
        GlobalOption::HardwareAcceleration(HardwareAccelerationOption {
            mode,
            decode,
            device: "/dev/dri/renderD128".into(),
        })
        .arguments()
    }

    #[test]
    fn vaapi_device_is_declared_even_without_decode() {
        assert_eq!(
            hwaccel(HardwareAccelerationMode::Vaapi, true),
            [
                "-hwaccel",
                "vaapi",
                "-vaapi_device",
                "/dev/dri/renderD128",
                "-hwaccel_output_format",
                "vaapi"
            ]
        );
        assert_eq!(
            hwaccel(HardwareAccelerationMode::Vaapi, false),
            ["-vaapi_device", "/dev/dri/renderD128"]
        );
    }

    #[test]
    fn qsv_initialises_a_filter_device() {
        assert_eq!(
            hwaccel(HardwareAccelerationMode::Qsv, false),
            ["-init_hw_device", "qsv=hw:/dev/dri/renderD128", "-filter_hw_device", "hw"]
        );
        assert!(hwaccel(HardwareAccelerationMode::Cuda, false).is_empty());
        assert_eq!(
            hwaccel(HardwareAccelerationMode::Cuda, true),
            ["-hwaccel", "cuda", "-hwaccel_output_format", "cuda"]
        );
    }

    #[test]
    fn simple_flags() {
        assert_eq!(GlobalOption::LogLevel(LogLevel::Error).arguments(), ["-loglevel", "error"]);
        assert_eq!(GlobalOption::Threads(4).arguments(), ["-threads", "4"]);
    }
}
