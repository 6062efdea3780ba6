//! Domain error taxonomy.

/// Errors surfaced by the domain services to their caller
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A business rule blocked the operation; the message is user-facing
    #[error("{0}")]
    InvariantViolation(String),

    #[error("Insufficient currency: cost {cost}, available {available}")]
    InsufficientFunds { cost: u64, available: u64 },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound { entity, id: id.into() }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
