use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's monthly spending ceiling, plus bookkeeping for when the last
/// threshold alert went out. At most one budget exists per user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Monthly limit in cents. Money is fixed-point throughout; floats only
    /// ever appear in derived percentages.
    pub amount_cents: i64,
    /// Set when an alert is delivered; gates at most one alert per calendar
    /// month.
    pub last_alert_sent: Option<DateTime<Utc>>,
}

impl Budget {
    pub fn new(user_id: Uuid, amount_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount_cents,
            last_alert_sent: None,
        }
    }
}
