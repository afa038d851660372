use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid search endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum DriverError {
    /// Connection failures, timeouts and anything else the client raises.
    /// Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid value for header {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },
}
