//! Telemetry snapshot as served by `GET /api/live`.

use serde::{Deserialize, Serialize};

use crate::device::DeviceError;

/// One complete reading of every sensor channel plus the pointing position.
///
/// The firmware names the climate fields `temp` and `rh`; the long names are
/// accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Distance reported by the lidar (mm).
    pub lidar: f64,
    /// MQ-2 smoke sensor value.
    pub smoke: f64,
    /// Equivalent CO2 (ppm).
    pub eco2: f64,
    /// Total volatile organic compounds (ppb).
    pub tvoc: f64,
    /// Temperature (°C).
    #[serde(alias = "temp")]
    pub temperature: f64,
    /// Relative humidity (%).
    #[serde(alias = "rh")]
    pub relative_humidity: f64,
    pub x: f64,
    pub y: f64,
}

impl TelemetrySample {
    /// Field labels and values in display order.
    pub fn rows(&self) -> [(&'static str, f64); 8] {
        [
            ("Lidar", self.lidar),
            ("Smoke", self.smoke),
            ("eCO2", self.eco2),
            ("TVOC", self.tvoc),
            ("Temp", self.temperature),
            ("RH", self.relative_humidity),
            ("X", self.x),
            ("Y", self.y),
        ]
    }
}

/// Anything that can produce a fresh telemetry snapshot.
///
/// Implementations block; the poller task calls them from worker threads.
pub trait LiveSource: Send + Sync {
    fn fetch_live(&self) -> Result<TelemetrySample, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_firmware_field_names() {
        let json = r#"{"lidar":812,"smoke":120,"eco2":650,"tvoc":42,"temp":21.5,"rh":48.2,"x":90,"y":45}"#;
        let sample: TelemetrySample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.temperature, 21.5);
        assert_eq!(sample.relative_humidity, 48.2);
        assert_eq!(sample.lidar, 812.0);
    }

    #[test]
    fn accepts_long_field_names() {
        let json = r#"{"lidar":1,"smoke":2,"eco2":3,"tvoc":4,"temperature":5,"relativeHumidity":6,"x":7,"y":8}"#;
        let sample: TelemetrySample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.rows().map(|(_, v)| v), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn rejects_incomplete_payload() {
        let json = r#"{"lidar":1,"smoke":2}"#;
        assert!(serde_json::from_str::<TelemetrySample>(json).is_err());
    }
}
