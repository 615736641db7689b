use serde::{Deserialize, Serialize};

use crate::alerts::usage::{AlertKind, CategoryShare};

/// Structured body of a budget alert notification. Everything a mail
/// template needs to render the alert, already formatted-friendly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetAlertEmail {
    pub user_name: String,
    pub account_name: String,
    pub alert_kind: AlertKind,
    pub percentage_used: f64,
    pub budget_amount_cents: i64,
    pub total_expenses_cents: i64,
    pub remaining_budget_cents: i64,
    pub days_remaining: u32,
    pub projected_expenses_cents: i64,
    pub projected_percentage: f64,
    pub top_categories: Vec<CategoryShare>,
}

impl BudgetAlertEmail {
    pub fn subject(&self) -> String {
        match self.alert_kind {
            AlertKind::Exceeded => "Budget Alert: Budget Exceeded".into(),
            AlertKind::Projection | AlertKind::Warning => "Budget Alert: Budget Warning".into(),
        }
    }

    /// Plain-text rendering of the alert body.
    pub fn render_text(&self) -> String {
        let mut body = String::new();
        body.push_str(&format!("Hello {},\n\n", self.user_name));
        body.push_str(&format!(
            "You've used {:.1}% of your monthly budget on {}.\n\n",
            self.percentage_used, self.account_name
        ));
        body.push_str(&format!(
            "Budget:    {}\nSpent:     {}\nRemaining: {}\n",
            format_cents(self.budget_amount_cents),
            format_cents(self.total_expenses_cents),
            format_cents(self.remaining_budget_cents),
        ));
        body.push_str(&format!(
            "\nWith {} days left, you're on track to spend {} ({:.1}% of budget).\n",
            self.days_remaining,
            format_cents(self.projected_expenses_cents),
            self.projected_percentage,
        ));
        if !self.top_categories.is_empty() {
            body.push_str("\nTop spending categories this month:\n");
            for share in &self.top_categories {
                body.push_str(&format!(
                    "  {:<16} {:>12}  ({:.1}%)\n",
                    share.category,
                    format_cents(share.amount_cents),
                    share.share_pct,
                ));
            }
        }
        body
    }
}

/// Formats a cent amount as dollars, keeping money arithmetic fixed-point
/// right up to the display boundary.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}
