use serde::{Deserialize, Serialize};

/// Tunable knobs for alert evaluation and outbound mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Percentage of the budget at which the warning band opens.
    pub warning_threshold_pct: f64,
    /// Percentage at which the budget counts as exceeded (and at which a
    /// projection triggers the projection band).
    pub exceeded_threshold_pct: f64,
    /// How many top spending categories to include in the alert payload.
    pub top_category_count: usize,
    /// When true, the expense window is scoped to the account that triggered
    /// evaluation; when false, it spans all of the user's accounts. The
    /// historical behavior is account-scoped even though the budget limit is
    /// user-wide.
    pub account_scoped_expenses: bool,
    /// From-address stamped on outgoing alert mail.
    pub sender_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            warning_threshold_pct: 80.0,
            exceeded_threshold_pct: 100.0,
            top_category_count: 3,
            account_scoped_expenses: true,
            sender_address: "Welth <alerts@welth.app>".into(),
        }
    }
}
