use std::time::Duration;

use channelcast_core::duration_ms::format_millis;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioFilter {
    /// Stretch or squeeze samples to match timestamps.
    Resample,
    /// Percent.
    Volume(u32),
    /// Pad with silence to a total length.
    Pad(Duration),
}

impl AudioFilter {
    pub fn filter(&self) -> String {
        match self {
            Self::Resample => "aresample=async=1".into(),
            Self::Volume(percent) => format!("volume={:.2}", f64::from(*percent) / 100.0),
            Self::Pad(length) => format!("apad=whole_dur={}", format_millis(*length)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texts() {
        assert_eq!(AudioFilter::Resample.filter(), "aresample=async=1");
        assert_eq!(AudioFilter::Volume(150).filter(), "volume=1.50");
        assert_eq!(
            AudioFilter::Pad(Duration::from_millis(1_800_000)).filter(),
            "apad=whole_dur=1800000ms"
        );
    }
}
