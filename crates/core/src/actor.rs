//! Actor identity: who posted a transaction.
//!
//! Authentication itself is an external collaborator; it resolves a request
//! to this shape before the ledger is invoked. The ledger only snapshots it
//! onto transactions and audit entries.

use serde::{Deserialize, Serialize};

use crate::id::ActorId;

/// Resolved actor identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            role: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}
