//! VideoToolbox: decode and encode on the device, but frames cross back to
//! host memory in between, so every filter runs in software.

use channelcast_core::HardwareAccelerationMode;

use super::BackendPipeline;
use super::context::BuildContext;
use crate::decoder::Decoder;
use crate::encoder::VideoEncoder;

pub(crate) struct VideoToolboxPipeline;

impl BackendPipeline for VideoToolboxPipeline {
    fn mode(&self) -> HardwareAccelerationMode {
        HardwareAccelerationMode::VideoToolbox
    }

    fn decoder(&self, _ctx: &BuildContext<'_>) -> Decoder {
        Decoder::VideoToolbox
    }

    fn hardware_encoder(&self, ctx: &BuildContext<'_>) -> Option<VideoEncoder> {
        Some(VideoEncoder::VideoToolbox(ctx.desired.video_format))
    }
}
