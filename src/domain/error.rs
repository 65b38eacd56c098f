use thiserror::Error;

/// Errors raised by collaborator calls (retrieval, embedding, generation)
///
/// None of these abort a query on their own: the controller downgrades the
/// affected pass and records the degradation in its trace.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Retrieval error: {message}")]
    Retrieval { message: String },

    #[error("Scoring error: {message}")]
    Scoring { message: String },

    #[error("Judge error: {message}")]
    Judge { message: String },

    #[error("Timed out after {millis}ms: {operation}")]
    Timeout { operation: String, millis: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    pub fn scoring(message: impl Into<String>) -> Self {
        Self::Scoring {
            message: message.into(),
        }
    }

    pub fn judge(message: impl Into<String>) -> Self {
        Self::Judge {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, millis: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            millis,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Retrieval { .. } | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_timeout_error() {
        let error = DomainError::timeout("judge", 250);
        assert_eq!(error.to_string(), "Timed out after 250ms: judge");
    }

    #[test]
    fn test_transient_classification() {
        assert!(DomainError::retrieval("connection reset").is_transient());
        assert!(DomainError::timeout("search", 100).is_transient());
        assert!(DomainError::provider("openai", "HTTP 503").is_transient());
        assert!(!DomainError::validation("bad").is_transient());
        assert!(!DomainError::configuration("missing key").is_transient());
    }
}
