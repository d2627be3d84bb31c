//! NVIDIA: NVDEC decode with frames left on the CUDA device, NVENC encode.

use channelcast_core::{HardwareAccelerationMode, HardwareSurface};

use super::BackendPipeline;
use super::context::BuildContext;
use crate::decoder::Decoder;
use crate::encoder::VideoEncoder;

pub(crate) struct NvidiaPipeline;

impl BackendPipeline for NvidiaPipeline {
    fn mode(&self) -> HardwareAccelerationMode {
        HardwareAccelerationMode::Cuda
    }

    fn surface(&self) -> Option<HardwareSurface> {
        Some(HardwareSurface::Cuda)
    }

    fn decoder(&self, _ctx: &BuildContext<'_>) -> Decoder {
        Decoder::CudaImplicit
    }

    fn hardware_encoder(&self, ctx: &BuildContext<'_>) -> Option<VideoEncoder> {
        Some(VideoEncoder::Nvenc(ctx.desired.video_format))
    }
}
