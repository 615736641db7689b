use std::sync::Arc;

use uuid::Uuid;

use crate::domain::Budget;
use crate::storage::FinanceStore;

use super::{ServiceError, ServiceResult};

pub struct BudgetService {
    store: Arc<dyn FinanceStore>,
}

impl BudgetService {
    pub fn new(store: Arc<dyn FinanceStore>) -> Self {
        Self { store }
    }

    pub fn current(&self, user_id: Uuid) -> ServiceResult<Option<Budget>> {
        Ok(self.store.budget_for_user(user_id)?)
    }

    /// Creates or replaces the user's budget limit. Alert bookkeeping on an
    /// existing budget survives the edit; only the evaluator moves it.
    pub fn set_amount(&self, user_id: Uuid, amount_cents: i64) -> ServiceResult<Budget> {
        if amount_cents < 0 {
            return Err(ServiceError::Invalid(
                "Budget amount cannot be negative".into(),
            ));
        }
        self.store
            .user(user_id)?
            .ok_or_else(|| ServiceError::Invalid("User not found".into()))?;

        let budget = match self.store.budget_for_user(user_id)? {
            Some(mut existing) => {
                existing.amount_cents = amount_cents;
                existing
            }
            None => Budget::new(user_id, amount_cents),
        };
        self.store.upsert_budget(budget.clone())?;
        Ok(budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn service_with_user() -> (BudgetService, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("jo@example.com", "Jo");
        store.insert_user(user.clone()).unwrap();
        (BudgetService::new(store.clone()), store, user)
    }

    #[test]
    fn set_amount_creates_then_updates() {
        let (service, _, user) = service_with_user();
        assert!(service.current(user.id).unwrap().is_none());

        let created = service.set_amount(user.id, 100_000).unwrap();
        assert_eq!(created.amount_cents, 100_000);

        let updated = service.set_amount(user.id, 120_000).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.amount_cents, 120_000);
    }

    #[test]
    fn editing_the_limit_keeps_alert_bookkeeping() {
        let (service, store, user) = service_with_user();
        let budget = service.set_amount(user.id, 100_000).unwrap();
        let sent = Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap();
        store
            .claim_alert_slot(budget.id, sent, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap())
            .unwrap();

        let updated = service.set_amount(user.id, 90_000).unwrap();
        assert_eq!(updated.last_alert_sent, Some(sent));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let (service, _, user) = service_with_user();
        let err = service.set_amount(user.id, -1).unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));
    }
}
