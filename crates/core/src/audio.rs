use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::AudioFormat;

/// Target characteristics of one audio leg.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioState {
    pub audio_encoder: AudioFormat,
    pub audio_channels: Option<u32>,
    /// kbit/s
    pub audio_bitrate: Option<u32>,
    /// kbit
    pub audio_buffer_size: Option<u32>,
    pub audio_sample_rate: Option<u32>,
    /// Percent; 100 leaves the level untouched.
    pub audio_volume: Option<u32>,
    /// Pad or cut the audio to this length so it ends with the video.
    #[serde(with = "crate::duration_ms::option")]
    pub audio_duration: Option<Duration>,
}

impl AudioState {
    pub fn copy() -> Self {
        Self {
            audio_encoder: AudioFormat::Copy,
            ..Self::default()
        }
    }

    pub fn needs_volume_filter(&self) -> bool {
        self.audio_volume.is_some_and(|v| v != 100)
    }
}
