use std::sync::Arc;

use uuid::Uuid;

use crate::domain::Account;
use crate::storage::FinanceStore;

use super::{ServiceError, ServiceResult};

pub struct AccountService {
    store: Arc<dyn FinanceStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn FinanceStore>) -> Self {
        Self { store }
    }

    /// Creates an account for the user. The user's first account becomes the
    /// default automatically; `make_default` moves the flag for later ones.
    pub fn create(
        &self,
        user_id: Uuid,
        name: &str,
        initial_balance_cents: i64,
        make_default: bool,
    ) -> ServiceResult<Account> {
        self.store
            .user(user_id)?
            .ok_or_else(|| ServiceError::Invalid("User not found".into()))?;

        let existing = self.store.accounts_for_user(user_id)?;
        let account = Account::new(user_id, name).with_balance(initial_balance_cents);
        let id = account.id;
        self.store.insert_account(account)?;
        if existing.is_empty() || make_default {
            self.store.set_default_account(user_id, id)?;
        }
        self.get(user_id, id)
    }

    pub fn get(&self, user_id: Uuid, account_id: Uuid) -> ServiceResult<Account> {
        self.store
            .account(account_id)?
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| ServiceError::Invalid("Account not found".into()))
    }

    pub fn list_for_user(&self, user_id: Uuid) -> ServiceResult<Vec<Account>> {
        Ok(self.store.accounts_for_user(user_id)?)
    }
}
