use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error type shared by every service in the crate
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The requested record does not exist (or is not visible to the caller)
    NotFound(String),
    /// Input failed validation
    ValidationError(String),
    /// The operation conflicts with current state
    Conflict(String),
    /// Missing or unknown credentials
    Unauthorized(String),
    /// Upload exceeded the configured size limit
    PayloadTooLarge(String),
    /// Error during pipeline or content processing
    ProcessingError(String),
    /// An external provider (AI, CMS) failed
    ProviderError(String),
    /// Error while reading or writing persisted state
    PersistenceError(String),
    /// The operation was cancelled before it finished
    Cancelled(String),
    /// The operation exceeded its time budget
    Timeout(String),
}

impl ServiceError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::ValidationError(_) => "VALIDATION_ERROR",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServiceError::ProcessingError(_) => "PROCESSING_ERROR",
            ServiceError::ProviderError(_) => "PROVIDER_ERROR",
            ServiceError::PersistenceError(_) => "PERSISTENCE_ERROR",
            ServiceError::Cancelled(_) => "CANCELLED",
            ServiceError::Timeout(_) => "TIMEOUT",
        }
    }

    /// Whether a pipeline step failing with this error may be attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::ProviderError(_) | ServiceError::ProcessingError(_) | ServiceError::Timeout(_)
        )
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ServiceError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            ServiceError::ProviderError(msg) => write!(f, "Provider error: {}", msg),
            ServiceError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            ServiceError::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
            ServiceError::Timeout(msg) => write!(f, "Timed out: {}", msg),
        }
    }
}

impl Error for ServiceError {}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::PersistenceError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::ProcessingError(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout(err.to_string())
        } else {
            ServiceError::ProviderError(err.to_string())
        }
    }
}

impl From<handlebars::RenderError> for ServiceError {
    fn from(err: handlebars::RenderError) -> Self {
        ServiceError::ProcessingError(format!("Template error: {}", err))
    }
}

impl From<prometheus::Error> for ServiceError {
    fn from(err: prometheus::Error) -> Self {
        ServiceError::ProcessingError(format!("Metrics error: {}", err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ServiceError::ProviderError("down".into()).is_retryable());
        assert!(ServiceError::Timeout("slow".into()).is_retryable());
        assert!(!ServiceError::ValidationError("bad".into()).is_retryable());
        assert!(!ServiceError::Cancelled("stop".into()).is_retryable());
    }

    #[test]
    fn test_display_and_code() {
        let err = ServiceError::NotFound("Episode abc".into());
        assert_eq!(err.to_string(), "Not found: Episode abc");
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
