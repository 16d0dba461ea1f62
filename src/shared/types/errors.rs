use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Unknown step index {0}")]
    UnknownStep(usize),

    /// The first location's address follows the head-office address while
    /// `headOfficeEqualsOperatingAddress` is on.
    #[error("Address of the first business location is locked to the head-office address")]
    AddressLocked,

    #[error("Onboarding session has been disposed")]
    SessionClosed,

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Registry lookup failed: {0}")]
    Registry(String),
}

/// Failure reported by the remote persistence collaborator
#[derive(Debug, Error)]
pub enum RemoteSaveError {
    #[error("Remote save rejected: {0}")]
    Rejected(String),

    #[error("Remote save unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    RemoteSave(#[from] RemoteSaveError),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage and other infrastructure operations
pub type InfraResult<T> = Result<T, InfraError>;
