use thiserror::Error;

/// Failure of a single request against the news API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with {status}{}", message_suffix(.message))]
    Status { status: u16, message: Option<String> },
    #[error("unexpected response: {0}")]
    Malformed(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default()
}

impl ApiError {
    /// Message suitable for showing to the user, when the failure carries one.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ApiError::Transport(err) => Some(err.to_string()),
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Malformed(detail) => Some(detail.clone()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Malformed(err.to_string())
    }
}
