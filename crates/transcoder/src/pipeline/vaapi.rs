//! VAAPI. Encoders carry the rate-control mode the driver reports;
//! padding and overlays move to the device only where the tool and the
//! driver handle them.

use channelcast_core::{FfmpegState, HardwareAccelerationMode, HardwareSurface};
use tracing::debug;

use super::BackendPipeline;
use super::context::BuildContext;
use crate::decoder::Decoder;
use crate::encoder::VideoEncoder;
use crate::filter::PadKind;
use crate::input::SubtitleMethod;

/// `pad_vaapi` first shipped with this major version.
const PAD_VAAPI_MIN_MAJOR: u32 = 7;
const PAD_VAAPI: &str = "pad_vaapi";

/// Mesa AMD driver; its `overlay_vaapi` mis-blends alpha.
const RADEONSI_DRIVER: &str = "radeonsi";

pub(crate) struct VaapiPipeline;

impl BackendPipeline for VaapiPipeline {
    fn mode(&self) -> HardwareAccelerationMode {
        HardwareAccelerationMode::Vaapi
    }

    fn surface(&self) -> Option<HardwareSurface> {
        Some(HardwareSurface::Vaapi)
    }

    fn device(&self, state: &FfmpegState) -> String {
        state.vaapi_device_or_default().to_string()
    }

    fn decoder(&self, _ctx: &BuildContext<'_>) -> Decoder {
        Decoder::VaapiImplicit
    }

    fn hardware_encoder(&self, ctx: &BuildContext<'_>) -> Option<VideoEncoder> {
        let format = ctx.desired.video_format;
        Some(VideoEncoder::Vaapi {
            format,
            rate_control: ctx.hardware.rate_control_mode(format, ctx.desired.pixel_format),
        })
    }

    fn pad_kind(&self, ctx: &BuildContext<'_>) -> PadKind {
        if ctx.ffmpeg_state.version.at_least(PAD_VAAPI_MIN_MAJOR, 0)
            && ctx.device_filter_usable(PAD_VAAPI)
        {
            PadKind::Vaapi
        } else {
            PadKind::Software
        }
    }

    fn force_software_overlay(&self, ctx: &BuildContext<'_>) -> bool {
        let both = ctx.watermark.is_some()
            && ctx.subtitle_method() == Some(SubtitleMethod::Overlay);
        let radeonsi = ctx.ffmpeg_state.vaapi_driver.as_deref() == Some(RADEONSI_DRIVER);
        if both || radeonsi {
            debug!(both, radeonsi, "overlays stay in software");
        }
        both || radeonsi
    }

    fn uses_vaapi_driver(&self) -> bool {
        true
    }
}
