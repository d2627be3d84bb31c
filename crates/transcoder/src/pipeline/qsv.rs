//! Intel QSV. Decoders are named explicitly; the device is opened through
//! the VAAPI render node, so the VAAPI driver override applies too.

use channelcast_core::{FfmpegState, HardwareAccelerationMode, HardwareSurface};
use tracing::debug;

use super::BackendPipeline;
use super::context::BuildContext;
use crate::capabilities::HardwareCapabilities;
use crate::decoder::Decoder;
use crate::encoder::VideoEncoder;

pub(crate) struct QsvPipeline;

impl BackendPipeline for QsvPipeline {
    fn mode(&self) -> HardwareAccelerationMode {
        HardwareAccelerationMode::Qsv
    }

    fn surface(&self) -> Option<HardwareSurface> {
        Some(HardwareSurface::Qsv)
    }

    fn device(&self, state: &FfmpegState) -> String {
        state.vaapi_device_or_default().to_string()
    }

    fn decoder(&self, ctx: &BuildContext<'_>) -> Decoder {
        let HardwareCapabilities::Qsv(caps) = ctx.hardware else {
            return Decoder::Implicit;
        };
        match caps.decoder_for(ctx.current.video_format) {
            Some(name) => Decoder::Qsv(name),
            None => {
                debug!(format = %ctx.current.video_format, "no qsv decoder, decoding in software");
                Decoder::Implicit
            }
        }
    }

    fn hardware_encoder(&self, ctx: &BuildContext<'_>) -> Option<VideoEncoder> {
        Some(VideoEncoder::Qsv(ctx.desired.video_format))
    }

    fn uses_vaapi_driver(&self) -> bool {
        true
    }
}
