use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, Budget, Transaction, User};
use crate::errors::StoreError;

use super::{CategorySpend, FinanceStore, Result};

/// Serializable contents of a store; also the on-disk shape used by the JSON
/// backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// In-memory [`FinanceStore`] backend. The reference implementation of the
/// store contract and the default test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the data is still structurally valid, so recover the guard.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FinanceStore for MemoryStore {
    fn insert_user(&self, user: User) -> Result<()> {
        self.lock().users.push(user);
        Ok(())
    }

    fn user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    fn insert_account(&self, account: Account) -> Result<()> {
        self.lock().accounts.push(account);
        Ok(())
    }

    fn account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.lock().accounts.iter().find(|a| a.id == id).cloned())
    }

    fn accounts_for_user(&self, user_id: Uuid) -> Result<Vec<Account>> {
        Ok(self
            .lock()
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    fn set_default_account(&self, user_id: Uuid, account_id: Uuid) -> Result<()> {
        let mut data = self.lock();
        if !data
            .accounts
            .iter()
            .any(|a| a.id == account_id && a.user_id == user_id)
        {
            return Err(StoreError::AccountNotFound(account_id));
        }
        for account in data.accounts.iter_mut().filter(|a| a.user_id == user_id) {
            account.is_default = account.id == account_id;
        }
        Ok(())
    }

    fn upsert_budget(&self, budget: Budget) -> Result<()> {
        let mut data = self.lock();
        match data.budgets.iter_mut().find(|b| b.user_id == budget.user_id) {
            Some(existing) => *existing = budget,
            None => data.budgets.push(budget),
        }
        Ok(())
    }

    fn budget_for_user(&self, user_id: Uuid) -> Result<Option<Budget>> {
        Ok(self
            .lock()
            .budgets
            .iter()
            .find(|b| b.user_id == user_id)
            .cloned())
    }

    fn record_transaction(&self, txn: Transaction) -> Result<Transaction> {
        let mut data = self.lock();
        let delta = txn.balance_delta_cents();
        let account = data
            .accounts
            .iter_mut()
            .find(|a| a.id == txn.account_id)
            .ok_or(StoreError::AccountNotFound(txn.account_id))?;
        account.balance_cents += delta;
        data.transactions.push(txn.clone());
        Ok(txn)
    }

    fn replace_transaction(&self, txn: Transaction) -> Result<Transaction> {
        let mut data = self.lock();
        let old_delta = data
            .transactions
            .iter()
            .find(|t| t.id == txn.id)
            .map(Transaction::balance_delta_cents)
            .ok_or(StoreError::TransactionNotFound(txn.id))?;
        let net = txn.balance_delta_cents() - old_delta;
        let account = data
            .accounts
            .iter_mut()
            .find(|a| a.id == txn.account_id)
            .ok_or(StoreError::AccountNotFound(txn.account_id))?;
        account.balance_cents += net;
        if let Some(slot) = data.transactions.iter_mut().find(|t| t.id == txn.id) {
            *slot = txn.clone();
        }
        Ok(txn)
    }

    fn transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        let mut txns: Vec<Transaction> = self
            .lock()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        txns.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(txns)
    }

    fn sum_expenses_since(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .filter(|t| {
                t.user_id == user_id
                    && t.is_expense()
                    && t.date >= since
                    && account_id.map_or(true, |id| t.account_id == id)
            })
            .map(|t| t.amount_cents)
            .sum())
    }

    fn top_expense_categories(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CategorySpend>> {
        // BTreeMap keeps labels ordered, which makes the descending sort
        // below stable for equal sums.
        let mut sums: BTreeMap<String, i64> = BTreeMap::new();
        for txn in self.lock().transactions.iter().filter(|t| {
            t.user_id == user_id
                && t.is_expense()
                && t.date >= since
                && account_id.map_or(true, |id| t.account_id == id)
        }) {
            *sums.entry(txn.category.clone()).or_insert(0) += txn.amount_cents;
        }
        let mut rows: Vec<CategorySpend> = sums
            .into_iter()
            .map(|(category, amount_cents)| CategorySpend {
                category,
                amount_cents,
            })
            .collect();
        rows.sort_by(|a, b| b.amount_cents.cmp(&a.amount_cents));
        rows.truncate(limit);
        Ok(rows)
    }

    fn claim_alert_slot(
        &self,
        budget_id: Uuid,
        now: DateTime<Utc>,
        month_start: DateTime<Utc>,
    ) -> Result<bool> {
        let mut data = self.lock();
        let budget = data
            .budgets
            .iter_mut()
            .find(|b| b.id == budget_id)
            .ok_or(StoreError::BudgetNotFound(budget_id))?;
        let open = match budget.last_alert_sent {
            None => true,
            Some(sent) => sent < month_start,
        };
        if open {
            budget.last_alert_sent = Some(now);
        }
        Ok(open)
    }

    fn set_last_alert_sent(&self, budget_id: Uuid, when: Option<DateTime<Utc>>) -> Result<()> {
        let mut data = self.lock();
        let budget = data
            .budgets
            .iter_mut()
            .find(|b| b.id == budget_id)
            .ok_or(StoreError::BudgetNotFound(budget_id))?;
        budget.last_alert_sent = when;
        Ok(())
    }
}
