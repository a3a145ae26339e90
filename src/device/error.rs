//! Error type shared by every device request.

/// Failure of a single request against the device.
///
/// None of these are fatal: the telemetry poller retries on the next tick,
/// settings stay unloaded, and one-shot actions report back to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Connection refused, timed out, DNS failure and the like.
    Network(String),
    /// The device answered with a non-success status.
    Status { code: u16, body: String },
    /// The response body was not the JSON we expected.
    Decode(String),
    /// The background thread for the request could not be started.
    Worker(String),
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::Network(msg) => write!(f, "Network error: {}", msg),
            DeviceError::Status { code, body } if body.is_empty() => write!(f, "Device returned HTTP {}", code),
            DeviceError::Status { code, body } => write!(f, "Device returned HTTP {}: {}", code, body),
            DeviceError::Decode(msg) => write!(f, "Malformed response: {}", msg),
            DeviceError::Worker(msg) => write!(f, "Failed to start request worker: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<reqwest::Error> for DeviceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DeviceError::Decode(e.to_string())
        } else {
            DeviceError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_omits_empty_body() {
        let bare = DeviceError::Status { code: 503, body: String::new() };
        assert_eq!(bare.to_string(), "Device returned HTTP 503");

        let with_body = DeviceError::Status { code: 400, body: "bad json".into() };
        assert_eq!(with_body.to_string(), "Device returned HTTP 400: bad json");
    }
}
