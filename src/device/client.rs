//! Blocking HTTP client for the device's JSON API.

use reqwest::blocking::{Client, Response};
use serde::Serialize;
use std::time::Duration;

use super::{DeviceError, worker};
use crate::settings::{ConfigDocument, SettingsStore};
use crate::telemetry::{LiveSource, TelemetrySample};

/// Client for the device's `/api` endpoints.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct DeviceClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct PasswordChange<'a> {
    password: &'a str,
}

impl DeviceClient {
    /// Create a client for the device at `base_url` (scheme and host, no path).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DeviceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeviceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /api/live`
    pub fn get_live(&self) -> Result<TelemetrySample, DeviceError> {
        let response = self.client.get(self.url("/api/live")).send()?;
        Ok(check_status(response)?.json()?)
    }

    /// `GET /api/settings`
    pub fn get_settings(&self) -> Result<ConfigDocument, DeviceError> {
        let response = self.client.get(self.url("/api/settings")).send()?;
        Ok(check_status(response)?.json()?)
    }

    /// `POST /api/settings` with the full document.
    pub fn post_settings(&self, document: &ConfigDocument) -> Result<(), DeviceError> {
        let url = self.url("/api/settings");
        log::debug!("Posting settings to {}", url);
        let response = self.client.post(&url).json(document).send()?;
        check_status(response).map(|_| ())
    }

    /// `POST /api/password`
    pub fn post_password(&self, password: &str) -> Result<(), DeviceError> {
        let response = self
            .client
            .post(self.url("/api/password"))
            .json(&PasswordChange { password })
            .send()?;
        check_status(response).map(|_| ())
    }
}

fn check_status(response: Response) -> Result<Response, DeviceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        Err(DeviceError::Status {
            code: status.as_u16(),
            body,
        })
    }
}

impl LiveSource for DeviceClient {
    fn fetch_live(&self) -> Result<TelemetrySample, DeviceError> {
        self.get_live()
    }
}

impl SettingsStore for DeviceClient {
    async fn fetch_settings(&self) -> Result<ConfigDocument, DeviceError> {
        let device = self.clone();
        worker::offload("settings-load", move || device.get_settings()).await
    }

    async fn push_settings(&self, document: &ConfigDocument) -> Result<(), DeviceError> {
        let device = self.clone();
        let document = document.clone();
        worker::offload("settings-submit", move || device.post_settings(&document)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = DeviceClient::new("http://192.168.4.1/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://192.168.4.1");
        assert_eq!(client.url("/api/live"), "http://192.168.4.1/api/live");
    }
}
