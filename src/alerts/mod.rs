//! Budget alert evaluation: calendar-month windows, derived usage metrics,
//! band decisions, and the fire-and-forget evaluator that ties them to the
//! store and the mail seam.

pub mod evaluator;
pub mod month;
pub mod usage;

pub use evaluator::{BudgetAlertEvaluator, EvaluationOutcome, NotAlertingReason};
pub use month::MonthWindow;
pub use usage::{alert_kind, AlertKind, BudgetUsage, CategoryShare};
