//! Serde helpers storing durations as integer milliseconds.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|v| v.map(Duration::from_millis))
    }
}

/// Render a duration the way the tool's time options accept it.
pub fn format_millis(value: Duration) -> String {
    format!("{}ms", value.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Holder {
        #[serde(with = "super::option", default)]
        start: Option<Duration>,
    }

    #[test]
    fn round_trips_millis() {
        let h: Holder = serde_json::from_str(r#"{"start": 1500}"#).unwrap();
        assert_eq!(h.start, Some(Duration::from_millis(1500)));
        assert_eq!(serde_json::to_string(&h).unwrap(), r#"{"start":1500}"#);
        let empty: Holder = serde_json::from_str("{}").unwrap();
        assert!(empty.start.is_none());
    }

    #[test]
    fn formats_for_time_options() {
        assert_eq!(format_millis(Duration::from_secs(90)), "90000ms");
    }
}
