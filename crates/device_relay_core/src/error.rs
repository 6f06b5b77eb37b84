use thiserror::Error;

/// Error kinds surfaced by both relay functions.
///
/// Chat notification failures never reach this type; they are logged and
/// dropped by the notifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Missing parameter for {field}")]
    MissingParameter { field: String },

    #[error("Can't call same phone {phone} within the cooldown window. Try again in {retry_after_secs}s.")]
    RateLimited { phone: String, retry_after_secs: u64 },

    #[error("{target} request failed: {message}")]
    UpstreamRequestFailed { target: String, message: String },

    #[error("{target} returned an unexpected response: {message}")]
    MalformedResponse { target: String, message: String },

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RelayError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingParameter {
            field: field.into(),
        }
    }

    pub fn upstream(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamRequestFailed {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn malformed_response(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Stable snake_case code used in structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } => "missing_parameter",
            Self::RateLimited { .. } => "rate_limited",
            Self::UpstreamRequestFailed { .. } => "upstream_request_failed",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::MalformedEvent(_) => "malformed_event",
            Self::Configuration(_) => "configuration",
        }
    }
}
