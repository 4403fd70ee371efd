//! Job failure taxonomy.

use engine_client::EngineError;
use thiserror::Error;

use crate::kernel::store::StoreError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("no handler registered for {0}")]
    UnknownJobType(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl JobError {
    /// Short class name persisted in front of the message.
    pub fn error_class(&self) -> &'static str {
        match self {
            JobError::Engine(EngineError::Unreachable(_)) => "EngineUnavailable",
            JobError::Engine(EngineError::Rejected { .. }) => "EngineRejected",
            JobError::Engine(_) => "EngineError",
            JobError::Store(StoreError::NotFound { .. }) => "NotFound",
            JobError::Store(_) => "StoreError",
            JobError::InvalidPayload(_) | JobError::UnknownJobType(_) => "InvalidJob",
            JobError::Internal(_) => "InternalError",
        }
    }

    /// Engine transport failures and database errors get another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Engine(e) => e.is_retryable(),
            JobError::Store(StoreError::Database(_)) => true,
            _ => false,
        }
    }

    /// Message written to the job record: class, then the underlying error.
    pub fn record_message(&self) -> String {
        format!("{}: {}", self.error_class(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_unreachable_engine_is_retryable() {
        let err = JobError::from(EngineError::Unreachable("connection refused".into()));
        assert!(err.is_retryable());
        assert_eq!(
            err.record_message(),
            "EngineUnavailable: Engine service unavailable: connection refused"
        );
    }

    #[test]
    fn test_rejected_engine_is_final() {
        let err = JobError::from(EngineError::Rejected {
            status: 422,
            detail: "Maximum 50 items per request".into(),
        });
        assert!(!err.is_retryable());
        assert!(err.record_message().starts_with("EngineRejected: "));
        assert!(err.record_message().contains("Maximum 50 items"));
    }

    #[test]
    fn test_missing_row_is_not_retried() {
        let err = JobError::from(StoreError::NotFound {
            entity: "project",
            id: Uuid::nil(),
        });
        assert!(!err.is_retryable());
        assert_eq!(err.error_class(), "NotFound");
    }
}
