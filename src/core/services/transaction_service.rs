//! The transaction-write operation: validated inserts and edits that keep
//! account balances in step, then hand off to the budget alert evaluator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::alerts::BudgetAlertEvaluator;
use crate::config::Config;
use crate::domain::{RecurringInterval, Transaction, TransactionKind};
use crate::notify::NotificationSender;
use crate::storage::FinanceStore;

use super::{ServiceError, ServiceResult};

/// Caller-supplied fields for a new or edited transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub date: DateTime<Utc>,
    pub category: String,
    pub description: Option<String>,
    pub recurring_interval: Option<RecurringInterval>,
}

pub struct TransactionService {
    store: Arc<dyn FinanceStore>,
    evaluator: BudgetAlertEvaluator,
}

impl TransactionService {
    pub fn new(
        store: Arc<dyn FinanceStore>,
        sender: Arc<dyn NotificationSender>,
        config: Config,
    ) -> Self {
        let evaluator = BudgetAlertEvaluator::new(store.clone(), sender, config);
        Self { store, evaluator }
    }

    /// Records a transaction and updates the account balance, then — for
    /// expenses only — runs budget alert evaluation. The evaluation outcome
    /// never affects the caller: the transaction is already durably recorded
    /// by the time it runs.
    pub fn create(&self, user_id: Uuid, draft: NewTransaction) -> ServiceResult<Transaction> {
        self.create_at(user_id, draft, Utc::now())
    }

    /// [`Self::create`] with an explicit evaluation clock.
    pub fn create_at(
        &self,
        user_id: Uuid,
        draft: NewTransaction,
        now: DateTime<Utc>,
    ) -> ServiceResult<Transaction> {
        self.validate(user_id, &draft)?;
        let mut txn = Transaction::new(
            user_id,
            draft.account_id,
            draft.amount_cents,
            draft.kind,
            draft.date,
            draft.category,
        );
        txn.description = draft.description;
        if let Some(interval) = draft.recurring_interval {
            txn = txn.with_recurrence(interval);
        }

        let txn = self.store.record_transaction(txn)?;
        self.evaluate_if_expense(&txn, now);
        Ok(txn)
    }

    /// Rewrites an existing transaction, applying the net balance change,
    /// and re-runs alert evaluation for expenses.
    pub fn update(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        draft: NewTransaction,
    ) -> ServiceResult<Transaction> {
        self.update_at(user_id, transaction_id, draft, Utc::now())
    }

    pub fn update_at(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        draft: NewTransaction,
        now: DateTime<Utc>,
    ) -> ServiceResult<Transaction> {
        self.validate(user_id, &draft)?;
        let original = self
            .store
            .transaction(transaction_id)?
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| ServiceError::Invalid("Transaction not found".into()))?;

        let mut replacement = Transaction {
            id: original.id,
            user_id,
            account_id: draft.account_id,
            amount_cents: draft.amount_cents,
            kind: draft.kind,
            date: draft.date,
            category: draft.category,
            description: draft.description,
            recurring_interval: None,
            next_recurring_date: None,
        };
        if let Some(interval) = draft.recurring_interval {
            replacement = replacement.with_recurrence(interval);
        }

        let txn = self.store.replace_transaction(replacement)?;
        self.evaluate_if_expense(&txn, now);
        Ok(txn)
    }

    pub fn get(&self, user_id: Uuid, transaction_id: Uuid) -> ServiceResult<Transaction> {
        self.store
            .transaction(transaction_id)?
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| ServiceError::Invalid("Transaction not found".into()))
    }

    /// All of the user's transactions, newest first.
    pub fn list_for_user(&self, user_id: Uuid) -> ServiceResult<Vec<Transaction>> {
        Ok(self.store.transactions_for_user(user_id)?)
    }

    fn validate(&self, user_id: Uuid, draft: &NewTransaction) -> ServiceResult<()> {
        if draft.amount_cents <= 0 {
            return Err(ServiceError::Invalid(
                "Amount must be a positive number of cents".into(),
            ));
        }
        self.store
            .user(user_id)?
            .ok_or_else(|| ServiceError::Invalid("User not found".into()))?;
        self.store
            .account(draft.account_id)?
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| ServiceError::Invalid("Account not found".into()))?;
        Ok(())
    }

    fn evaluate_if_expense(&self, txn: &Transaction, now: DateTime<Utc>) {
        if !txn.is_expense() {
            return;
        }
        let outcome =
            self.evaluator
                .evaluate_at(txn.user_id, txn.account_id, txn.amount_cents, now);
        debug!(transaction = %txn.id, ?outcome, "post-commit budget evaluation");
    }
}
