//! Errors raised while turning operator input into a document the device accepts.

/// Rejected form input. Reported to the operator, never sent to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A numeric field holds text that is not a finite number.
    NotANumber { field: String, input: String },
    /// MQTT port outside `1..=65535`.
    PortOutOfRange(i64),
    /// MQTT QoS other than 0, 1 or 2.
    QosOutOfRange(i64),
    /// Threshold with `min` above `max`.
    InvertedRange { metric: String, min: f64, max: f64 },
    /// A value that must not be negative.
    Negative { field: String, value: f64 },
    EmptyPassword,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NotANumber { field, input } => write!(f, "{}: '{}' is not a number", field, input),
            ValidationError::PortOutOfRange(port) => write!(f, "MQTT port {} is outside 1-65535", port),
            ValidationError::QosOutOfRange(qos) => write!(f, "MQTT QoS {} is not 0, 1 or 2", qos),
            ValidationError::InvertedRange { metric, min, max } => {
                write!(f, "{} threshold: min {} is above max {}", metric, min, max)
            }
            ValidationError::Negative { field, value } => write!(f, "{} must not be negative (got {})", field, value),
            ValidationError::EmptyPassword => write!(f, "Password must not be empty"),
        }
    }
}

impl std::error::Error for ValidationError {}
