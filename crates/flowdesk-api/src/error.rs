use flowdesk_core::ConnectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid connection: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
