use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::StoreError;
use crate::notify::{BudgetAlertEmail, NotificationSender};
use crate::storage::FinanceStore;

use super::month::MonthWindow;
use super::usage::{alert_kind, AlertKind, BudgetUsage};

/// What an evaluation did. Callers on the transaction-write path ignore
/// this; tests and observability assert on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// The user has no budget configured; nothing to evaluate.
    NoBudget,
    /// Evaluation ran but decided not to notify.
    NotAlerting { reason: NotAlertingReason },
    /// A notification was delivered and the alert slot recorded.
    AlertSent { kind: AlertKind },
    /// Something went wrong; the alert slot is left open so a later
    /// qualifying expense can retry.
    AlertFailed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotAlertingReason {
    /// The owning user record could not be resolved.
    UserMissing,
    /// The budget limit is zero or negative; usage is undefined.
    DegenerateLimit,
    /// Spending is below every alert band.
    BelowThresholds,
    /// An alert already went out this calendar month.
    AlreadyAlertedThisMonth,
}

/// Decides, after each committed expense, whether the user should be told
/// about their budget. Fire-and-forget: nothing here ever propagates an
/// error to the transaction-write path that invoked it.
pub struct BudgetAlertEvaluator {
    store: Arc<dyn FinanceStore>,
    sender: Arc<dyn NotificationSender>,
    config: Config,
}

impl BudgetAlertEvaluator {
    pub fn new(
        store: Arc<dyn FinanceStore>,
        sender: Arc<dyn NotificationSender>,
        config: Config,
    ) -> Self {
        Self {
            store,
            sender,
            config,
        }
    }

    /// Evaluates against the current clock.
    pub fn evaluate(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        triggering_amount_cents: i64,
    ) -> EvaluationOutcome {
        self.evaluate_at(user_id, account_id, triggering_amount_cents, Utc::now())
    }

    /// Evaluates at an explicit instant. The triggering amount is a signal
    /// that an expense just landed; the window total is always re-aggregated
    /// from the store rather than tracked incrementally.
    pub fn evaluate_at(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        triggering_amount_cents: i64,
        now: DateTime<Utc>,
    ) -> EvaluationOutcome {
        match self.run(user_id, account_id, now) {
            Ok(outcome) => {
                debug!(
                    %user_id,
                    %account_id,
                    amount_cents = triggering_amount_cents,
                    ?outcome,
                    "budget alert evaluation finished"
                );
                outcome
            }
            Err(err) => {
                warn!(%user_id, %account_id, error = %err, "budget alert evaluation failed");
                EvaluationOutcome::AlertFailed {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn run(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<EvaluationOutcome, StoreError> {
        let budget = match self.store.budget_for_user(user_id)? {
            Some(budget) => budget,
            None => return Ok(EvaluationOutcome::NoBudget),
        };
        let user = match self.store.user(user_id)? {
            Some(user) => user,
            None => {
                return Ok(EvaluationOutcome::NotAlerting {
                    reason: NotAlertingReason::UserMissing,
                })
            }
        };

        if budget.amount_cents <= 0 {
            return Ok(EvaluationOutcome::NotAlerting {
                reason: NotAlertingReason::DegenerateLimit,
            });
        }

        let window = MonthWindow::containing(now);
        let scope = self
            .config
            .account_scoped_expenses
            .then_some(account_id);
        let total = self
            .store
            .sum_expenses_since(user_id, scope, window.start)?;
        let categories = self.store.top_expense_categories(
            user_id,
            scope,
            window.start,
            self.config.top_category_count,
        )?;
        let usage = BudgetUsage::compute(window, budget.amount_cents, total, categories);

        let kind = match alert_kind(&usage, &self.config) {
            Some(kind) => kind,
            None => {
                return Ok(EvaluationOutcome::NotAlerting {
                    reason: NotAlertingReason::BelowThresholds,
                })
            }
        };

        // Cheap pre-check on the already-loaded record; the claim below is
        // the authoritative, atomic gate.
        if budget.last_alert_sent.is_some_and(|sent| window.contains(sent)) {
            return Ok(EvaluationOutcome::NotAlerting {
                reason: NotAlertingReason::AlreadyAlertedThisMonth,
            });
        }
        let account_name = self
            .store
            .account(account_id)?
            .map(|a| a.name)
            .unwrap_or_else(|| "Default Account".to_string());
        if !self.store.claim_alert_slot(budget.id, now, window.start)? {
            return Ok(EvaluationOutcome::NotAlerting {
                reason: NotAlertingReason::AlreadyAlertedThisMonth,
            });
        }

        let payload = BudgetAlertEmail {
            user_name: user.name.clone(),
            account_name,
            alert_kind: kind,
            percentage_used: usage.percentage_used,
            budget_amount_cents: usage.limit_cents,
            total_expenses_cents: usage.total_expenses_cents,
            remaining_budget_cents: usage.remaining_cents,
            days_remaining: usage.window.days_remaining(),
            projected_expenses_cents: usage.projected_expenses_cents.round() as i64,
            projected_percentage: usage.projected_percentage,
            top_categories: usage.top_categories.clone(),
        };

        let delivered = self
            .sender
            .send(&user.email, &payload.subject(), &payload);
        match delivered {
            Ok(delivery) if delivery.accepted => Ok(EvaluationOutcome::AlertSent { kind }),
            other => {
                // Release the claimed slot so the next qualifying expense
                // this month retries. Best-effort: a failed release costs a
                // retry, but must not replace the delivery outcome.
                if let Err(err) = self
                    .store
                    .set_last_alert_sent(budget.id, budget.last_alert_sent)
                {
                    warn!(%user_id, error = %err, "could not release alert slot after failed delivery");
                }
                let reason = match other {
                    Ok(_) => "delivery not accepted by provider".to_string(),
                    Err(err) => err.to_string(),
                };
                warn!(%user_id, reason = %reason, "budget alert delivery failed; slot released");
                Ok(EvaluationOutcome::AlertFailed { reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, Budget, Transaction, TransactionKind, User};
    use crate::notify::{FailingSender, RecordingSender};
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        sender: Arc<RecordingSender>,
        user: User,
        account: Account,
    }

    fn fixture(limit_cents: i64) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let sender = Arc::new(RecordingSender::new());
        let user = User::new("jo@example.com", "Jo");
        let account = Account::new(user.id, "Checking");
        store.insert_user(user.clone()).unwrap();
        store.insert_account(account.clone()).unwrap();
        store.upsert_budget(Budget::new(user.id, limit_cents)).unwrap();
        Fixture {
            store,
            sender,
            user,
            account,
        }
    }

    fn spend(fx: &Fixture, cents: i64, when: DateTime<Utc>, category: &str) {
        fx.store
            .record_transaction(Transaction::new(
                fx.user.id,
                fx.account.id,
                cents,
                TransactionKind::Expense,
                when,
                category,
            ))
            .unwrap();
    }

    fn evaluator(fx: &Fixture) -> BudgetAlertEvaluator {
        BudgetAlertEvaluator::new(fx.store.clone(), fx.sender.clone(), Config::default())
    }

    #[test]
    fn missing_budget_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let sender = Arc::new(RecordingSender::new());
        let user = User::new("jo@example.com", "Jo");
        let account = Account::new(user.id, "Checking");
        store.insert_user(user.clone()).unwrap();
        store.insert_account(account.clone()).unwrap();
        let eval = BudgetAlertEvaluator::new(store, sender.clone(), Config::default());

        let outcome = eval.evaluate_at(user.id, account.id, 1_000, at(2025, 4, 10));
        assert_eq!(outcome, EvaluationOutcome::NoBudget);
        assert_eq!(sender.sent_count(), 0);
    }

    #[test]
    fn warning_band_sends_and_records() {
        // 850 of 1000 spent late in the month, no prior alert.
        let fx = fixture(100_000);
        spend(&fx, 85_000, at(2025, 4, 28), "groceries");

        let outcome = evaluator(&fx).evaluate_at(fx.user.id, fx.account.id, 85_000, at(2025, 4, 28));
        assert_eq!(
            outcome,
            EvaluationOutcome::AlertSent {
                kind: AlertKind::Warning
            }
        );
        let sent = fx.sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jo@example.com");
        assert_eq!(sent[0].email.percentage_used, 85.0);
        assert_eq!(sent[0].email.remaining_budget_cents, 15_000);

        let budget = fx.store.budget_for_user(fx.user.id).unwrap().unwrap();
        assert_eq!(budget.last_alert_sent, Some(at(2025, 4, 28)));
    }

    #[test]
    fn exceeded_band_wins_over_projection() {
        // 1050 of 1000 spent early in the month, so the
        // projection is also over; kind must still be exceeded.
        let fx = fixture(100_000);
        spend(&fx, 105_000, at(2025, 4, 5), "shopping");

        let outcome = evaluator(&fx).evaluate_at(fx.user.id, fx.account.id, 105_000, at(2025, 4, 5));
        assert_eq!(
            outcome,
            EvaluationOutcome::AlertSent {
                kind: AlertKind::Exceeded
            }
        );
        assert_eq!(
            fx.sender.sent()[0].subject,
            "Budget Alert: Budget Exceeded"
        );
    }

    #[test]
    fn projection_band_fires_under_actual_limit() {
        // 400 of 1000 spent by day 10 of a 30-day month.
        let fx = fixture(100_000);
        spend(&fx, 40_000, at(2025, 4, 9), "utilities");

        let outcome = evaluator(&fx).evaluate_at(fx.user.id, fx.account.id, 40_000, at(2025, 4, 10));
        assert_eq!(
            outcome,
            EvaluationOutcome::AlertSent {
                kind: AlertKind::Projection
            }
        );
        let email = &fx.sender.sent()[0].email;
        assert_eq!(email.percentage_used, 40.0);
        assert!((email.projected_percentage - 106.666).abs() < 0.01);
    }

    #[test]
    fn second_qualifying_expense_same_month_is_suppressed() {
        let fx = fixture(100_000);
        spend(&fx, 85_000, at(2025, 4, 12), "groceries");
        let eval = evaluator(&fx);

        let first = eval.evaluate_at(fx.user.id, fx.account.id, 85_000, at(2025, 4, 12));
        assert!(matches!(first, EvaluationOutcome::AlertSent { .. }));

        spend(&fx, 5_000, at(2025, 4, 13), "food");
        let second = eval.evaluate_at(fx.user.id, fx.account.id, 5_000, at(2025, 4, 13));
        assert_eq!(
            second,
            EvaluationOutcome::NotAlerting {
                reason: NotAlertingReason::AlreadyAlertedThisMonth
            }
        );
        assert_eq!(fx.sender.sent_count(), 1);
    }

    #[test]
    fn month_rollover_reopens_eligibility() {
        let fx = fixture(100_000);
        spend(&fx, 85_000, at(2025, 4, 12), "groceries");
        let eval = evaluator(&fx);
        assert!(matches!(
            eval.evaluate_at(fx.user.id, fx.account.id, 85_000, at(2025, 4, 12)),
            EvaluationOutcome::AlertSent { .. }
        ));

        spend(&fx, 85_000, at(2025, 5, 3), "groceries");
        let next_month = eval.evaluate_at(fx.user.id, fx.account.id, 85_000, at(2025, 5, 3));
        assert!(matches!(next_month, EvaluationOutcome::AlertSent { .. }));
        assert_eq!(fx.sender.sent_count(), 2);
    }

    #[test]
    fn zero_budget_never_alerts_or_panics() {
        let fx = fixture(0);
        spend(&fx, 85_000, at(2025, 4, 12), "groceries");
        let outcome = evaluator(&fx).evaluate_at(fx.user.id, fx.account.id, 85_000, at(2025, 4, 12));
        assert_eq!(
            outcome,
            EvaluationOutcome::NotAlerting {
                reason: NotAlertingReason::DegenerateLimit
            }
        );
        assert_eq!(fx.sender.sent_count(), 0);
    }

    #[test]
    fn delivery_failure_releases_the_slot_for_retry() {
        let fx = fixture(100_000);
        spend(&fx, 85_000, at(2025, 4, 12), "groceries");
        let failing = BudgetAlertEvaluator::new(
            fx.store.clone(),
            Arc::new(FailingSender),
            Config::default(),
        );

        let outcome = failing.evaluate_at(fx.user.id, fx.account.id, 85_000, at(2025, 4, 12));
        assert!(matches!(outcome, EvaluationOutcome::AlertFailed { .. }));
        let budget = fx.store.budget_for_user(fx.user.id).unwrap().unwrap();
        assert!(budget.last_alert_sent.is_none());

        // A later expense in the same month retries and succeeds.
        let retry = evaluator(&fx).evaluate_at(fx.user.id, fx.account.id, 1_000, at(2025, 4, 14));
        assert!(matches!(retry, EvaluationOutcome::AlertSent { .. }));
        assert_eq!(fx.sender.sent_count(), 1);
    }

    /// Store whose alert-slot release always errors; everything else
    /// behaves like [`MemoryStore`].
    struct StuckSlotStore(MemoryStore);

    impl crate::storage::FinanceStore for StuckSlotStore {
        fn insert_user(&self, user: User) -> crate::storage::Result<()> {
            self.0.insert_user(user)
        }
        fn user(&self, id: Uuid) -> crate::storage::Result<Option<User>> {
            self.0.user(id)
        }
        fn insert_account(&self, account: Account) -> crate::storage::Result<()> {
            self.0.insert_account(account)
        }
        fn account(&self, id: Uuid) -> crate::storage::Result<Option<Account>> {
            self.0.account(id)
        }
        fn accounts_for_user(&self, user_id: Uuid) -> crate::storage::Result<Vec<Account>> {
            self.0.accounts_for_user(user_id)
        }
        fn set_default_account(
            &self,
            user_id: Uuid,
            account_id: Uuid,
        ) -> crate::storage::Result<()> {
            self.0.set_default_account(user_id, account_id)
        }
        fn upsert_budget(&self, budget: Budget) -> crate::storage::Result<()> {
            self.0.upsert_budget(budget)
        }
        fn budget_for_user(&self, user_id: Uuid) -> crate::storage::Result<Option<Budget>> {
            self.0.budget_for_user(user_id)
        }
        fn record_transaction(
            &self,
            txn: Transaction,
        ) -> crate::storage::Result<Transaction> {
            self.0.record_transaction(txn)
        }
        fn replace_transaction(
            &self,
            txn: Transaction,
        ) -> crate::storage::Result<Transaction> {
            self.0.replace_transaction(txn)
        }
        fn transaction(&self, id: Uuid) -> crate::storage::Result<Option<Transaction>> {
            self.0.transaction(id)
        }
        fn transactions_for_user(
            &self,
            user_id: Uuid,
        ) -> crate::storage::Result<Vec<Transaction>> {
            self.0.transactions_for_user(user_id)
        }
        fn sum_expenses_since(
            &self,
            user_id: Uuid,
            account_id: Option<Uuid>,
            since: DateTime<Utc>,
        ) -> crate::storage::Result<i64> {
            self.0.sum_expenses_since(user_id, account_id, since)
        }
        fn top_expense_categories(
            &self,
            user_id: Uuid,
            account_id: Option<Uuid>,
            since: DateTime<Utc>,
            limit: usize,
        ) -> crate::storage::Result<Vec<crate::storage::CategorySpend>> {
            self.0
                .top_expense_categories(user_id, account_id, since, limit)
        }
        fn claim_alert_slot(
            &self,
            budget_id: Uuid,
            now: DateTime<Utc>,
            month_start: DateTime<Utc>,
        ) -> crate::storage::Result<bool> {
            self.0.claim_alert_slot(budget_id, now, month_start)
        }
        fn set_last_alert_sent(
            &self,
            _budget_id: Uuid,
            _when: Option<DateTime<Utc>>,
        ) -> crate::storage::Result<()> {
            Err(StoreError::InvalidRef("store unavailable".into()))
        }
    }

    #[test]
    fn failed_slot_release_still_reports_the_delivery_failure() {
        let user = User::new("jo@example.com", "Jo");
        let account = Account::new(user.id, "Checking");
        let inner = MemoryStore::new();
        inner.insert_user(user.clone()).unwrap();
        inner.insert_account(account.clone()).unwrap();
        inner.upsert_budget(Budget::new(user.id, 100_000)).unwrap();
        inner
            .record_transaction(Transaction::new(
                user.id,
                account.id,
                85_000,
                TransactionKind::Expense,
                at(2025, 4, 12),
                "groceries",
            ))
            .unwrap();

        let store = Arc::new(StuckSlotStore(inner));
        let eval =
            BudgetAlertEvaluator::new(store, Arc::new(FailingSender), Config::default());
        let outcome = eval.evaluate_at(user.id, account.id, 85_000, at(2025, 4, 12));

        // The delivery failure is what gets reported, not the store error
        // raised while releasing the slot.
        match outcome {
            EvaluationOutcome::AlertFailed { reason } => {
                assert!(reason.contains("provider unavailable"), "reason: {reason}")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn below_thresholds_stays_quiet() {
        let fx = fixture(100_000);
        spend(&fx, 10_000, at(2025, 4, 25), "food");
        let outcome = evaluator(&fx).evaluate_at(fx.user.id, fx.account.id, 10_000, at(2025, 4, 25));
        assert_eq!(
            outcome,
            EvaluationOutcome::NotAlerting {
                reason: NotAlertingReason::BelowThresholds
            }
        );
    }

    #[test]
    fn top_categories_ride_along_in_the_payload() {
        let fx = fixture(100_000);
        for (cents, category) in [
            (30_000, "groceries"),
            (20_000, "transportation"),
            (15_000, "utilities"),
            (5_000, "other-expense"),
        ] {
            spend(&fx, cents, at(2025, 4, 8), category);
        }
        let outcome = evaluator(&fx).evaluate_at(fx.user.id, fx.account.id, 5_000, at(2025, 4, 20));
        assert!(matches!(outcome, EvaluationOutcome::AlertSent { .. }));
        let email = &fx.sender.sent()[0].email;
        let labels: Vec<&str> = email
            .top_categories
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(labels, vec!["groceries", "transportation", "utilities"]);
    }

    #[test]
    fn user_wide_scope_sums_across_accounts() {
        let fx = fixture(100_000);
        let second = Account::new(fx.user.id, "Savings");
        fx.store.insert_account(second.clone()).unwrap();
        spend(&fx, 50_000, at(2025, 4, 10), "groceries");
        fx.store
            .record_transaction(Transaction::new(
                fx.user.id,
                second.id,
                40_000,
                TransactionKind::Expense,
                at(2025, 4, 11),
                "bills",
            ))
            .unwrap();

        // Account-scoped (default): 50% used on Checking, quiet.
        let scoped = evaluator(&fx).evaluate_at(fx.user.id, fx.account.id, 50_000, at(2025, 4, 28));
        assert_eq!(
            scoped,
            EvaluationOutcome::NotAlerting {
                reason: NotAlertingReason::BelowThresholds
            }
        );

        // User-wide: 90% used across both accounts.
        let config = Config {
            account_scoped_expenses: false,
            ..Config::default()
        };
        let wide = BudgetAlertEvaluator::new(fx.store.clone(), fx.sender.clone(), config);
        let outcome = wide.evaluate_at(fx.user.id, fx.account.id, 50_000, at(2025, 4, 28));
        assert_eq!(
            outcome,
            EvaluationOutcome::AlertSent {
                kind: AlertKind::Warning
            }
        );
    }
}
