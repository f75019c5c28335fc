use thiserror::Error;

use crate::modules::http::TransportError;
use crate::shared::constants::NETWORK_ERROR_MESSAGE;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            AppError::Api { message, .. }
            | AppError::Unauthorized(message)
            | AppError::NotFound(message)
            | AppError::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();

        AppError::Validation(messages.join(", "))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = AppError::Transport("connection reset by peer".to_string());
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn test_user_message_uses_server_text() {
        let err = AppError::Api {
            status: 400,
            message: "Quota exhausted".to_string(),
        };
        assert_eq!(err.user_message(), "Quota exhausted");
        assert_eq!(err.to_string(), "API error (HTTP 400): Quota exhausted");
    }
}
