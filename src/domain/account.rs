use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A financial account holding a running balance, owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub balance_cents: i64,
    pub is_default: bool,
}

impl Account {
    /// Creates a new account with a zero balance.
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            balance_cents: 0,
            is_default: false,
        }
    }

    pub fn with_balance(mut self, balance_cents: i64) -> Self {
        self.balance_cents = balance_cents;
        self
    }
}
