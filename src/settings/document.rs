//! The device configuration document served by `/api/settings`.
//!
//! Absent and `null` fields fall back to defaults on load. Everything the
//! dashboard does not model is kept in the `extra` maps so that a document
//! survives load, edit and submit without losing fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::ValidationError;

pub const DEFAULT_MQTT_PORT: u16 = 1883;
/// Firmware default for the clog distance (mm).
pub const DEFAULT_CLOG_MIN: f64 = 400.0;
/// Firmware default for the clog hold time (s).
pub const DEFAULT_CLOG_HOLD: f64 = 2.0;

/// Full device configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Station identifier used in MQTT topics.
    #[serde(default, deserialize_with = "null_as_default")]
    pub site_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wifi: WifiSettings,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mqtt: MqttSettings,
    /// Alarm limits keyed by metric name. Only groups present on the device appear here.
    #[serde(default, deserialize_with = "present_thresholds")]
    pub thresholds: BTreeMap<String, ThresholdRange>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clog: ClogParams,
    #[serde(default, deserialize_with = "null_as_default")]
    pub debug_enable: bool,
    /// Web UI user name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ui_user: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Station-mode Wi-Fi credentials.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WifiSettings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ssid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Telemetry broker connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MqttSettings {
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(default = "default_mqtt_port", deserialize_with = "mqtt_port")]
    pub port: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pass: String,
    /// Publish QoS, 0 to 2.
    #[serde(default, deserialize_with = "null_as_default")]
    pub qos: u8,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_MQTT_PORT,
            user: String::new(),
            pass: String::new(),
            qos: 0,
            extra: Map::new(),
        }
    }
}

/// Alarm window for one metric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdRange {
    #[serde(default, deserialize_with = "null_as_default", serialize_with = "serialize_number")]
    pub min: f64,
    #[serde(default, deserialize_with = "null_as_default", serialize_with = "serialize_number")]
    pub max: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ThresholdRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max, extra: Map::new() }
    }
}

/// Chute clog detection: distance below `clog_min` held for `clog_hold` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClogParams {
    #[serde(default = "default_clog_min", deserialize_with = "clog_min", serialize_with = "serialize_number")]
    pub clog_min: f64,
    #[serde(default = "default_clog_hold", deserialize_with = "clog_hold", serialize_with = "serialize_number")]
    pub clog_hold: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ClogParams {
    fn default() -> Self {
        Self {
            clog_min: DEFAULT_CLOG_MIN,
            clog_hold: DEFAULT_CLOG_HOLD,
            extra: Map::new(),
        }
    }
}

impl ConfigDocument {
    /// Check the constraints the device relies on before the document is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mqtt.port == 0 {
            return Err(ValidationError::PortOutOfRange(0));
        }
        if self.mqtt.qos > 2 {
            return Err(ValidationError::QosOutOfRange(self.mqtt.qos as i64));
        }
        for (metric, range) in &self.thresholds {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(ValidationError::NotANumber {
                    field: format!("thresholds.{}", metric),
                    input: format!("{}..{}", range.min, range.max),
                });
            }
            if range.min > range.max {
                return Err(ValidationError::InvertedRange {
                    metric: metric.clone(),
                    min: range.min,
                    max: range.max,
                });
            }
        }
        for (field, value) in [("clog.clogMin", self.clog.clog_min), ("clog.clogHold", self.clog.clog_hold)] {
            if !value.is_finite() {
                return Err(ValidationError::NotANumber {
                    field: field.to_string(),
                    input: value.to_string(),
                });
            }
            if value < 0.0 {
                return Err(ValidationError::Negative {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

fn default_mqtt_port() -> u16 {
    DEFAULT_MQTT_PORT
}

fn default_clog_min() -> f64 {
    DEFAULT_CLOG_MIN
}

fn default_clog_hold() -> f64 {
    DEFAULT_CLOG_HOLD
}

/// Treat `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn mqtt_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    Ok(Option::<u16>::deserialize(deserializer)?.unwrap_or(DEFAULT_MQTT_PORT))
}

fn clog_min<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_CLOG_MIN))
}

fn clog_hold<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(DEFAULT_CLOG_HOLD))
}

/// A `null` threshold group is the same as a missing one.
fn present_thresholds<'de, D>(deserializer: D) -> Result<BTreeMap<String, ThresholdRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let groups = Option::<BTreeMap<String, Option<ThresholdRange>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(groups.into_iter().filter_map(|(metric, range)| range.map(|r| (metric, r))).collect())
}

/// Whole numbers go out as JSON integers, matching what the firmware emits.
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_mqtt_fields_get_defaults() {
        let doc: ConfigDocument = serde_json::from_value(json!({
            "siteName": "CHUTE-3",
            "mqtt": { "host": "broker.local" }
        }))
        .unwrap();

        assert_eq!(doc.mqtt.qos, 0);
        assert_eq!(doc.mqtt.port, 1883);
        assert_eq!(doc.mqtt.host, "broker.local");
        assert!(!doc.debug_enable);
        assert!(doc.thresholds.is_empty());
        assert_eq!(doc.clog, ClogParams::default());
    }

    #[test]
    fn null_fields_get_defaults() {
        let doc: ConfigDocument = serde_json::from_value(json!({
            "siteName": null,
            "mqtt": { "host": "h", "port": null, "qos": null },
            "thresholds": { "lidar": { "min": null, "max": 1500 }, "pressure": null },
            "clog": { "clogMin": null, "clogHold": 5 },
            "debugEnable": null
        }))
        .unwrap();

        assert_eq!(doc.site_name, "");
        assert_eq!(doc.mqtt.port, DEFAULT_MQTT_PORT);
        assert_eq!(doc.mqtt.qos, 0);
        assert_eq!(doc.thresholds.len(), 1);
        assert_eq!(doc.thresholds["lidar"], ThresholdRange::new(0.0, 1500.0));
        assert_eq!(doc.clog.clog_min, DEFAULT_CLOG_MIN);
        assert_eq!(doc.clog.clog_hold, 5.0);
    }

    #[test]
    fn unknown_fields_survive_serialization() {
        let original = json!({
            "siteName": "A",
            "wifi": { "ssid": "s", "password": "p", "channel": 6 },
            "mqtt": { "host": "h", "port": 8883, "user": "u", "pass": "x", "qos": 1, "tls": true },
            "thresholds": { "eco2": { "min": 400, "max": 2000.5, "unit": "ppm" } },
            "clog": { "clogMin": 350, "clogHold": 2 },
            "debugEnable": true,
            "uiUser": "admin",
            "firmware": "1.4.2"
        });
        let doc: ConfigDocument = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(doc.extra.get("firmware"), Some(&json!("1.4.2")));
        assert_eq!(serde_json::to_value(&doc).unwrap(), original);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut doc = ConfigDocument::default();
        assert_eq!(doc.validate(), Ok(()));

        doc.mqtt.qos = 3;
        assert_eq!(doc.validate(), Err(ValidationError::QosOutOfRange(3)));

        doc.mqtt.qos = 2;
        doc.mqtt.port = 0;
        assert_eq!(doc.validate(), Err(ValidationError::PortOutOfRange(0)));

        doc.mqtt.port = 1883;
        doc.thresholds.insert("smoke".into(), ThresholdRange::new(400.0, 10.0));
        assert!(matches!(doc.validate(), Err(ValidationError::InvertedRange { .. })));
    }

    #[test]
    fn fractional_numbers_stay_fractional() {
        let range = ThresholdRange::new(-0.5, 12.25);
        assert_eq!(serde_json::to_value(&range).unwrap(), json!({ "min": -0.5, "max": 12.25 }));
    }
}
