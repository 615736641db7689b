use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Account, Budget, Transaction, User};

use super::memory::{MemoryStore, Snapshot};
use super::{CategorySpend, FinanceStore, Result};

const TMP_SUFFIX: &str = "tmp";

/// File-backed [`FinanceStore`]: [`MemoryStore`] semantics with the snapshot
/// persisted to a JSON file after every mutation.
///
/// Writes go through a temp file followed by a rename so a crash mid-save
/// never leaves a truncated store on disk.
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    /// Opens the store at `path`, loading the existing snapshot if the file
    /// exists and starting empty otherwise.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let data = fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            Snapshot::default()
        };
        Ok(Self {
            path,
            inner: MemoryStore::from_snapshot(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.inner.snapshot())?;
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".");
    tmp.push(TMP_SUFFIX);
    PathBuf::from(tmp)
}

impl FinanceStore for JsonStore {
    fn insert_user(&self, user: User) -> Result<()> {
        self.inner.insert_user(user)?;
        self.persist()
    }

    fn user(&self, id: Uuid) -> Result<Option<User>> {
        self.inner.user(id)
    }

    fn insert_account(&self, account: Account) -> Result<()> {
        self.inner.insert_account(account)?;
        self.persist()
    }

    fn account(&self, id: Uuid) -> Result<Option<Account>> {
        self.inner.account(id)
    }

    fn accounts_for_user(&self, user_id: Uuid) -> Result<Vec<Account>> {
        self.inner.accounts_for_user(user_id)
    }

    fn set_default_account(&self, user_id: Uuid, account_id: Uuid) -> Result<()> {
        self.inner.set_default_account(user_id, account_id)?;
        self.persist()
    }

    fn upsert_budget(&self, budget: Budget) -> Result<()> {
        self.inner.upsert_budget(budget)?;
        self.persist()
    }

    fn budget_for_user(&self, user_id: Uuid) -> Result<Option<Budget>> {
        self.inner.budget_for_user(user_id)
    }

    fn record_transaction(&self, txn: Transaction) -> Result<Transaction> {
        let txn = self.inner.record_transaction(txn)?;
        self.persist()?;
        Ok(txn)
    }

    fn replace_transaction(&self, txn: Transaction) -> Result<Transaction> {
        let txn = self.inner.replace_transaction(txn)?;
        self.persist()?;
        Ok(txn)
    }

    fn transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        self.inner.transaction(id)
    }

    fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        self.inner.transactions_for_user(user_id)
    }

    fn sum_expenses_since(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        self.inner.sum_expenses_since(user_id, account_id, since)
    }

    fn top_expense_categories(
        &self,
        user_id: Uuid,
        account_id: Option<Uuid>,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<CategorySpend>> {
        self.inner
            .top_expense_categories(user_id, account_id, since, limit)
    }

    fn claim_alert_slot(
        &self,
        budget_id: Uuid,
        now: DateTime<Utc>,
        month_start: DateTime<Utc>,
    ) -> Result<bool> {
        let claimed = self.inner.claim_alert_slot(budget_id, now, month_start)?;
        if claimed {
            self.persist()?;
        }
        Ok(claimed)
    }

    fn set_last_alert_sent(&self, budget_id: Uuid, when: Option<DateTime<Utc>>) -> Result<()> {
        self.inner.set_last_alert_sent(budget_id, when)?;
        self.persist()
    }
}
