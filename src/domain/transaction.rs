use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single income or expense event against one account.
///
/// `amount_cents` is always a non-negative magnitude; the sign applied to the
/// account balance comes from `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub amount_cents: i64,
    pub kind: TransactionKind,
    pub date: DateTime<Utc>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_interval: Option<RecurringInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_recurring_date: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        account_id: Uuid,
        amount_cents: i64,
        kind: TransactionKind,
        date: DateTime<Utc>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_id,
            amount_cents,
            kind,
            date,
            category: category.into(),
            description: None,
            recurring_interval: None,
            next_recurring_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the transaction as recurring and computes its next occurrence
    /// from the transaction date.
    pub fn with_recurrence(mut self, interval: RecurringInterval) -> Self {
        self.next_recurring_date = Some(interval.next_date(self.date));
        self.recurring_interval = Some(interval);
        self
    }

    /// Signed delta this transaction applies to its account balance.
    pub fn balance_delta_cents(&self) -> i64 {
        match self.kind {
            TransactionKind::Income => self.amount_cents,
            TransactionKind::Expense => -self.amount_cents,
        }
    }

    pub fn is_expense(&self) -> bool {
        matches!(self.kind, TransactionKind::Expense)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// Cadence for recurring transactions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurringInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringInterval {
    /// Next occurrence after `from`. Month and year steps keep the
    /// day-of-month, clamping back to `from` if the target month is shorter.
    pub fn next_date(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RecurringInterval::Daily => from + Duration::days(1),
            RecurringInterval::Weekly => from + Duration::weeks(1),
            RecurringInterval::Monthly => {
                let mut year = from.year();
                let mut month = from.month() + 1;
                if month > 12 {
                    month = 1;
                    year += 1;
                }
                from.with_year(year)
                    .and_then(|d| d.with_month(month))
                    .unwrap_or(from)
            }
            RecurringInterval::Yearly => from.with_year(from.year() + 1).unwrap_or(from),
        }
    }
}
