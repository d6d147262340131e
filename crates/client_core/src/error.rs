use thiserror::Error;

/// User-facing failure taxonomy for the session controllers. Validation
/// variants never reach the network; `Connection` covers every
/// transport-class failure behind one generic message (the underlying
/// cause is logged, not displayed); `Analysis` carries the gateway's own
/// failure message from a `success: false` reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("enter some text before submitting")]
    EmptyInput,
    #[error("add at least one text before submitting")]
    EmptyBatch,
    #[error("batch exceeds the gateway limit of {max} texts")]
    BatchTooLarge { max: usize },
    #[error("could not reach the sentiment service")]
    Connection,
    #[error("analysis failed: {0}")]
    Analysis(String),
}

impl SessionError {
    /// Validation errors are detected locally, before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SessionError::EmptyInput | SessionError::EmptyBatch | SessionError::BatchTooLarge { .. }
        )
    }
}
