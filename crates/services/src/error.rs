use thiserror::Error;

use crate::dao::base::DaoError;

/// Domain error taxonomy. `Validation`, `NotFound` and `Policy` are
/// user-facing; `Dependency` wraps collaborator failures (persistence,
/// mail transport, blob storage) that the caller cannot repair.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Policy violation: {0}")]
    Policy(String),
    #[error("Dependency failure: {0}")]
    Dependency(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DaoError> for ServiceError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => ServiceError::NotFound("document"),
            DaoError::Validation(msg) => ServiceError::Validation(msg),
            other => ServiceError::Dependency(other.to_string()),
        }
    }
}
