use thiserror::Error;

pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// Local form validation failure. Never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Phone number must be 10-15 digits")]
    InvalidPhone,
    #[error("Invalid or missing reset token")]
    MissingResetToken,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Request cancelled")]
    Cancelled,
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Url error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Missing session ID")]
    MissingSessionId,
    #[error("Missing identity token")]
    MissingToken,
    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl ClientError {
    pub fn server(status: u16, message: Option<String>) -> Self {
        ClientError::Server { status, message }
    }

    /// Transport, timeout and decode failures share one generic message.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::Timeout | ClientError::Decode(_)
        )
    }

    /// The single string a view shows for this error. `fallback` is used when
    /// the server rejected the request without a message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(e) => e.to_string(),
            ClientError::Server {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            ClientError::Server { .. } => fallback.to_string(),
            ClientError::MissingSessionId => self.to_string(),
            e if e.is_transport() => SERVER_ERROR_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        assert_eq!(
            ClientError::server(400, Some("Email already registered".into()))
                .user_message("Registration failed"),
            "Email already registered"
        );
        assert_eq!(
            ClientError::server(500, None).user_message("Registration failed"),
            "Registration failed"
        );
        assert_eq!(
            ClientError::server(500, Some("  ".into())).user_message("Registration failed"),
            "Registration failed"
        );
        assert_eq!(
            ClientError::Timeout.user_message("Registration failed"),
            SERVER_ERROR_MESSAGE
        );
        assert_eq!(
            ClientError::from(ValidationError::PasswordMismatch).user_message("x"),
            "Passwords do not match"
        );
        assert_eq!(
            ClientError::MissingSessionId.user_message("x"),
            "Missing session ID"
        );
    }
}
