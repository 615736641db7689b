use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::storage::CategorySpend;

use super::month::MonthWindow;

/// Derived spending metrics for one (user, window) evaluation. Computed
/// fresh on every invocation, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetUsage {
    pub window: MonthWindow,
    pub limit_cents: i64,
    pub total_expenses_cents: i64,
    pub remaining_cents: i64,
    pub percentage_used: f64,
    /// Even spend rate the limit allows, in cents per day.
    pub daily_budget_cents: f64,
    /// Linear extrapolation: spend so far plus the daily budget for each day
    /// left in the month.
    pub projected_expenses_cents: f64,
    pub projected_percentage: f64,
    pub top_categories: Vec<CategoryShare>,
}

/// One top-spending category with its share of total expenses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryShare {
    pub category: String,
    pub amount_cents: i64,
    /// This category's share of total expenses, as a percentage.
    pub share_pct: f64,
}

impl BudgetUsage {
    /// Computes the full metric set. Callers must have rejected
    /// non-positive limits already; the division guards here only keep the
    /// math finite if that contract is ever broken.
    pub fn compute(
        window: MonthWindow,
        limit_cents: i64,
        total_expenses_cents: i64,
        category_sums: Vec<CategorySpend>,
    ) -> Self {
        let limit = limit_cents.max(1) as f64;
        let percentage_used = total_expenses_cents as f64 / limit * 100.0;
        let daily_budget_cents = limit / window.days_in_month.max(1) as f64;
        let projected_expenses_cents =
            total_expenses_cents as f64 + daily_budget_cents * window.days_remaining() as f64;
        let projected_percentage = projected_expenses_cents / limit * 100.0;

        let total = total_expenses_cents.max(1) as f64;
        let top_categories = category_sums
            .into_iter()
            .map(|spend| CategoryShare {
                share_pct: spend.amount_cents as f64 / total * 100.0,
                category: spend.category,
                amount_cents: spend.amount_cents,
            })
            .collect();

        Self {
            window,
            limit_cents,
            total_expenses_cents,
            remaining_cents: limit_cents - total_expenses_cents,
            percentage_used,
            daily_budget_cents,
            projected_expenses_cents,
            projected_percentage,
            top_categories,
        }
    }
}

/// Alert severity, mutually exclusive, in priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertKind {
    #[serde(rename = "budget-exceeded")]
    Exceeded,
    #[serde(rename = "budget-projection")]
    Projection,
    #[serde(rename = "budget-warning")]
    Warning,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Exceeded => "budget-exceeded",
            AlertKind::Projection => "budget-projection",
            AlertKind::Warning => "budget-warning",
        }
    }
}

/// Decides whether the usage crosses an alert band and which one.
///
/// Exceeded wins over projection, projection over warning. Returns `None`
/// below the warning threshold with an in-budget projection.
pub fn alert_kind(usage: &BudgetUsage, config: &Config) -> Option<AlertKind> {
    if usage.percentage_used >= config.exceeded_threshold_pct {
        Some(AlertKind::Exceeded)
    } else if usage.projected_percentage >= config.exceeded_threshold_pct {
        Some(AlertKind::Projection)
    } else if usage.percentage_used >= config.warning_threshold_pct {
        Some(AlertKind::Warning)
    } else {
        None
    }
}
