use channelcast_core::HardwareAccelerationMode;

use super::BackendPipeline;

/// No device: every phase falls back to host-memory filters and the
/// preferred software encoder.
pub(crate) struct SoftwarePipeline;

impl BackendPipeline for SoftwarePipeline {
    fn mode(&self) -> HardwareAccelerationMode {
        HardwareAccelerationMode::None
    }
}
