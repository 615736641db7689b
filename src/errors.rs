use thiserror::Error;

/// Error type that captures persistence-layer failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("User not found: {0}")]
    UserNotFound(uuid::Uuid),
    #[error("Account not found: {0}")]
    AccountNotFound(uuid::Uuid),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(uuid::Uuid),
    #[error("Budget not found: {0}")]
    BudgetNotFound(uuid::Uuid),
    #[error("Invalid reference: {0}")]
    InvalidRef(String),
}
