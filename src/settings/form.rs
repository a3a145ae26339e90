//! Text-backed editing model for the settings panel.
//!
//! The panel edits strings; numbers are only parsed when the operator submits.
//! Conversion back starts from the loaded document, so fields the panel does
//! not show are carried over untouched.

use super::{ConfigDocument, ThresholdRange, ValidationError};

/// One editable threshold group.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRow {
    pub metric: String,
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsForm {
    pub site_name: String,
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub mqtt_host: String,
    pub mqtt_port: String,
    pub mqtt_user: String,
    pub mqtt_pass: String,
    pub mqtt_qos: String,
    pub thresholds: Vec<ThresholdRow>,
    pub clog_min: String,
    pub clog_hold: String,
    pub debug_enable: bool,
    pub ui_user: String,
}

impl SettingsForm {
    pub fn from_document(doc: &ConfigDocument) -> Self {
        Self {
            site_name: doc.site_name.clone(),
            wifi_ssid: doc.wifi.ssid.clone(),
            wifi_password: doc.wifi.password.clone(),
            mqtt_host: doc.mqtt.host.clone(),
            mqtt_port: doc.mqtt.port.to_string(),
            mqtt_user: doc.mqtt.user.clone(),
            mqtt_pass: doc.mqtt.pass.clone(),
            mqtt_qos: doc.mqtt.qos.to_string(),
            thresholds: doc
                .thresholds
                .iter()
                .map(|(metric, range)| ThresholdRow {
                    metric: metric.clone(),
                    min: range.min.to_string(),
                    max: range.max.to_string(),
                })
                .collect(),
            clog_min: doc.clog.clog_min.to_string(),
            clog_hold: doc.clog.clog_hold.to_string(),
            debug_enable: doc.debug_enable,
            ui_user: doc.ui_user.clone(),
        }
    }

    /// Build the document to submit, overlaying the form onto `base`.
    ///
    /// # Returns
    /// * `Ok(ConfigDocument)` ready for submission
    /// * `Err(ValidationError)` for the first field that does not parse or is out of range
    pub fn to_document(&self, base: &ConfigDocument) -> Result<ConfigDocument, ValidationError> {
        let mut doc = base.clone();

        doc.site_name = self.site_name.clone();
        doc.wifi.ssid = self.wifi_ssid.clone();
        doc.wifi.password = self.wifi_password.clone();
        doc.mqtt.host = self.mqtt_host.clone();
        doc.mqtt.port = parse_port(&self.mqtt_port)?;
        doc.mqtt.user = self.mqtt_user.clone();
        doc.mqtt.pass = self.mqtt_pass.clone();
        doc.mqtt.qos = parse_qos(&self.mqtt_qos)?;

        for row in &self.thresholds {
            let min = parse_number(&format!("thresholds.{}.min", row.metric), &row.min)?;
            let max = parse_number(&format!("thresholds.{}.max", row.metric), &row.max)?;
            let range = doc.thresholds.entry(row.metric.clone()).or_insert_with(ThresholdRange::default);
            range.min = min;
            range.max = max;
        }

        doc.clog.clog_min = parse_number("clog.clogMin", &self.clog_min)?;
        doc.clog.clog_hold = parse_number("clog.clogHold", &self.clog_hold)?;
        doc.debug_enable = self.debug_enable;
        doc.ui_user = self.ui_user.clone();

        doc.validate()?;
        Ok(doc)
    }
}

fn parse_number(field: &str, input: &str) -> Result<f64, ValidationError> {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::NotANumber {
            field: field.to_string(),
            input: input.to_string(),
        }),
    }
}

fn parse_integer(field: &str, input: &str) -> Result<i64, ValidationError> {
    input.trim().parse::<i64>().map_err(|_| ValidationError::NotANumber {
        field: field.to_string(),
        input: input.to_string(),
    })
}

fn parse_port(input: &str) -> Result<u16, ValidationError> {
    let port = parse_integer("mqtt.port", input)?;
    match u16::try_from(port) {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(ValidationError::PortOutOfRange(port)),
    }
}

fn parse_qos(input: &str) -> Result<u8, ValidationError> {
    let qos = parse_integer("mqtt.qos", input)?;
    match qos {
        0..=2 => Ok(qos as u8),
        _ => Err(ValidationError::QosOutOfRange(qos)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded() -> ConfigDocument {
        serde_json::from_value(json!({
            "siteName": "CHUTE-1",
            "wifi": { "ssid": "plant", "password": "secret" },
            "mqtt": { "host": "broker.hivemq.com", "port": 1883, "user": "", "pass": "", "qos": 1 },
            "thresholds": {
                "lidar": { "min": 0, "max": 1500 },
                "smoke": { "min": 0, "max": 400 },
                "eco2": { "min": 400, "max": 2000 },
                "tvoc": { "min": 0, "max": 600 }
            },
            "clog": { "clogMin": 400, "clogHold": 2 },
            "debugEnable": false,
            "uiUser": "admin",
            "otaEnabled": true
        }))
        .unwrap()
    }

    #[test]
    fn unedited_form_reproduces_document() {
        let doc = loaded();
        let form = SettingsForm::from_document(&doc);
        assert_eq!(form.to_document(&doc), Ok(doc));
    }

    #[test]
    fn edits_overlay_base_document() {
        let doc = loaded();
        let mut form = SettingsForm::from_document(&doc);
        form.mqtt_port = " 8883 ".into();
        form.thresholds[0].max = "1750.5".into();
        form.debug_enable = true;

        let edited = form.to_document(&doc).unwrap();
        assert_eq!(edited.mqtt.port, 8883);
        assert_eq!(edited.thresholds[&form.thresholds[0].metric].max, 1750.5);
        assert!(edited.debug_enable);
        assert_eq!(edited.extra.get("otaEnabled"), Some(&json!(true)));
    }

    #[test]
    fn absent_pressure_group_is_not_fabricated() {
        let doc = loaded();
        let form = SettingsForm::from_document(&doc);
        assert_eq!(form.thresholds.len(), 4);

        let edited = form.to_document(&doc).unwrap();
        assert!(!edited.thresholds.contains_key("pressure"));
        let body = serde_json::to_value(&edited).unwrap();
        assert!(body["thresholds"].get("pressure").is_none());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let doc = loaded();
        let mut form = SettingsForm::from_document(&doc);
        form.clog_hold = "two".into();
        assert_eq!(
            form.to_document(&doc),
            Err(ValidationError::NotANumber {
                field: "clog.clogHold".into(),
                input: "two".into()
            })
        );

        form.clog_hold = "".into();
        assert!(matches!(form.to_document(&doc), Err(ValidationError::NotANumber { .. })));

        form.clog_hold = "inf".into();
        assert!(matches!(form.to_document(&doc), Err(ValidationError::NotANumber { .. })));
    }

    #[test]
    fn port_and_qos_ranges_are_enforced() {
        let doc = loaded();
        let mut form = SettingsForm::from_document(&doc);

        form.mqtt_port = "70000".into();
        assert_eq!(form.to_document(&doc), Err(ValidationError::PortOutOfRange(70000)));
        form.mqtt_port = "0".into();
        assert_eq!(form.to_document(&doc), Err(ValidationError::PortOutOfRange(0)));
        form.mqtt_port = "1883".into();

        form.mqtt_qos = "3".into();
        assert_eq!(form.to_document(&doc), Err(ValidationError::QosOutOfRange(3)));
        form.mqtt_qos = "-1".into();
        assert_eq!(form.to_document(&doc), Err(ValidationError::QosOutOfRange(-1)));
        form.mqtt_qos = "2".into();
        assert_eq!(form.to_document(&doc).map(|d| d.mqtt.qos), Ok(2));
    }

    #[test]
    fn inverted_threshold_is_rejected() {
        let doc = loaded();
        let mut form = SettingsForm::from_document(&doc);
        let row = form.thresholds.iter_mut().find(|r| r.metric == "smoke").unwrap();
        row.min = "500".into();
        assert_eq!(
            form.to_document(&doc),
            Err(ValidationError::InvertedRange {
                metric: "smoke".into(),
                min: 500.0,
                max: 400.0
            })
        );
    }
}
