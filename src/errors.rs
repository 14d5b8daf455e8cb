use serde::Serialize;

/// Errors surfaced by the inventory services and the persistence port.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("Submission disabled: {0}")]
    SubmissionDisabled(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Timed out after {0} ms waiting for the item store")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::ExternalServiceError(format!("request timed out: {}", err))
        } else {
            ServiceError::ExternalServiceError(err.to_string())
        }
    }
}

impl ServiceError {
    /// Whether the error came from the persistence collaborator rather than
    /// from local validation. Persistence failures are recoverable by
    /// resubmitting the same form.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::ExternalServiceError(_)
                | Self::Timeout(_)
                | Self::Conflict(_)
                | Self::SerializationError(_)
                | Self::Other(_)
        )
    }

    /// Message suitable for the transient banner shown to staff.
    /// Internal details are replaced with generic text.
    pub fn banner_message(&self) -> String {
        match self {
            Self::ExternalServiceError(_) | Self::Other(_) => {
                "Could not save the item. Check the connection and try again.".to_string()
            }
            Self::Timeout(_) => "The item store did not answer in time. Try again.".to_string(),
            Self::SerializationError(_) => "Internal error while saving the item".to_string(),
            _ => self.to_string(),
        }
    }
}
