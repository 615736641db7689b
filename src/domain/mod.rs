//! Persistence-friendly domain models shared across the crate.

pub mod account;
pub mod budget;
pub mod category;
pub mod transaction;
pub mod user;

pub use account::Account;
pub use budget::Budget;
pub use category::{EXPENSE_CATEGORIES, INCOME_CATEGORIES};
pub use transaction::{RecurringInterval, Transaction, TransactionKind};
pub use user::User;
