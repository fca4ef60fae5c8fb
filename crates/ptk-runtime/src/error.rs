/// Coarse classification of a [`RuntimeError`], used by callers that branch on
/// the failure kind rather than on the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StatusCode {
    InvalidArgument,
    FailedPrecondition,
    Internal,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Malformed caller input. Retrying with the same input fails the same way.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// An object was used out of lifecycle order (unbound ports, double init, ...).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),
    /// Engine or unexpected state failure. The caller may retry with a fresh frame.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::InvalidArgument,
            Self::FailedPrecondition(_) => StatusCode::FailedPrecondition,
            Self::Internal(_) => StatusCode::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m) | Self::FailedPrecondition(m) | Self::Internal(m) => m,
        }
    }
}

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
