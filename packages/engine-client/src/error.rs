//! Error types for the engine client.

use thiserror::Error;

/// Result type for engine client operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine client errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error (missing API key, bad base URL)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure: connection refused, DNS, timeout
    #[error("Engine service unavailable: {0}")]
    Unreachable(String),

    /// Non-2xx response from the engine
    #[error("Engine rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl EngineError {
    /// True for transport failures only. Any non-2xx answer is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Unreachable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(EngineError::Unreachable("connection refused".into()).is_retryable());
        assert!(!EngineError::Rejected { status: 503, detail: "busy".into() }.is_retryable());
        assert!(!EngineError::Rejected { status: 422, detail: "bad".into() }.is_retryable());
        assert!(!EngineError::Parse("eof".into()).is_retryable());
    }

    #[test]
    fn test_rejected_message_includes_detail() {
        let err = EngineError::Rejected {
            status: 401,
            detail: "Invalid or missing API key".into(),
        };
        assert_eq!(
            err.to_string(),
            "Engine rejected request (401): Invalid or missing API key"
        );
    }
}
