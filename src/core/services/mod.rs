pub mod account_service;
pub mod budget_service;
pub mod transaction_service;

pub use account_service::AccountService;
pub use budget_service::BudgetService;
pub use transaction_service::{NewTransaction, TransactionService};

use crate::errors::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Invalid(String),
}
