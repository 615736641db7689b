pub mod json_backend;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, Budget, Transaction, User};
use crate::errors::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// One row of the per-category expense aggregate, ordered by `amount_cents`
/// descending (ties broken by label).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorySpend {
    pub category: String,
    pub amount_cents: i64,
}

/// Abstraction over the persistence layer for users, accounts, budgets, and
/// transactions.
///
/// All methods take `&self`; backends are expected to provide their own
/// interior synchronization so a store can be shared across concurrent
/// request handlers.
pub trait FinanceStore: Send + Sync {
    fn insert_user(&self, user: User) -> Result<()>;
    fn user(&self, id: Uuid) -> Result<Option<User>>;

    fn insert_account(&self, account: Account) -> Result<()>;
    fn account(&self, id: Uuid) -> Result<Option<Account>>;
    fn accounts_for_user(&self, user_id: Uuid) -> Result<Vec<Account>>;
    fn set_default_account(&self, user_id: Uuid, account_id: Uuid) -> Result<()>;

    fn upsert_budget(&self, budget: Budget) -> Result<()>;
    fn budget_for_user(&self, user_id: Uuid) -> Result<Option<Budget>>;

    /// Inserts the transaction and applies its signed delta to the owning
    /// account balance as one atomic step.
    fn record_transaction(&self, txn: Transaction) -> Result<Transaction>;

    /// Replaces an existing transaction and applies the net balance change
    /// (new delta minus old delta) to the owning account.
    fn replace_transaction(&self, txn: Transaction) -> Result<Transaction>;

    fn transaction(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// All transactions for the user, newest first.
    fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>>;

    /// Sum of EXPENSE amounts for the user since `since`, optionally scoped
    /// to one account.
    fn sum_expenses_since(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<i64>;

    /// Per-category EXPENSE sums for the same window, largest first, capped
    /// at `limit` rows.
    fn top_expense_categories(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CategorySpend>>;

    /// Atomically sets `last_alert_sent = now` on the budget if no alert has
    /// gone out since `month_start`, returning whether this caller won the
    /// slot. This is the de-duplication primitive: concurrent evaluations of
    /// the same budget resolve to exactly one winner.
    fn claim_alert_slot(
        &self,
        budget_id: Uuid,
        now: DateTime<Utc>,
        month_start: DateTime<Utc>,
    ) -> Result<bool>;

    /// Unconditionally rewrites the alert bookkeeping; used to release a
    /// claimed slot when delivery fails.
    fn set_last_alert_sent(&self, budget_id: Uuid, when: Option<DateTime<Utc>>) -> Result<()>;
}

pub use json_backend::JsonStore;
pub use memory::MemoryStore;
