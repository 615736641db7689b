//! Outbound notification seam. Production wires a real mail provider behind
//! [`NotificationSender`]; the evaluator only sees the trait.

pub mod email;

use std::sync::Mutex;

use thiserror::Error;

pub use email::{format_cents, BudgetAlertEmail};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result of a delivery attempt. A sender may also return an unaccepted
/// delivery instead of an error; both count as failure to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub accepted: bool,
    pub message_id: Option<String>,
}

impl Delivery {
    pub fn accepted(message_id: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message_id: Some(message_id.into()),
        }
    }

    pub fn rejected() -> Self {
        Self {
            accepted: false,
            message_id: None,
        }
    }
}

/// Abstraction over the mail provider.
pub trait NotificationSender: Send + Sync {
    fn send(
        &self,
        to: &str,
        subject: &str,
        email: &BudgetAlertEmail,
    ) -> Result<Delivery, NotifyError>;
}

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub email: BudgetAlertEmail,
}

/// Sender that records every message in memory and accepts them all. Used
/// in tests and local sandboxes where no mail provider is configured.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl NotificationSender for RecordingSender {
    fn send(
        &self,
        to: &str,
        subject: &str,
        email: &BudgetAlertEmail,
    ) -> Result<Delivery, NotifyError> {
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            email: email.clone(),
        });
        Ok(Delivery::accepted(format!("mem-{}", sent.len())))
    }
}

/// Sender that always fails; exercises the delivery-failure path.
#[derive(Debug, Default)]
pub struct FailingSender;

impl NotificationSender for FailingSender {
    fn send(&self, _: &str, _: &str, _: &BudgetAlertEmail) -> Result<Delivery, NotifyError> {
        Err(NotifyError::Delivery("provider unavailable".into()))
    }
}
