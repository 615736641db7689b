use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An application user. Owns accounts and transactions, and at most one
/// budget; the email is where budget alerts get delivered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
        }
    }
}
