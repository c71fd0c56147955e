use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("invalid api base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("form page request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("form page endpoint returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("form page response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("form page endpoint reported an unsuccessful response")]
    Unsuccessful,
    #[error("form page response has no data")]
    MissingData,
}
