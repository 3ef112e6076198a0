//! Principal domain model.
//!
//! A principal is the authenticated caller. Authentication (password
//! verification, token issuance) happens in an external collaborator;
//! this core only ever reads principals.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Resident,
    Security,
    Maintenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub active: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.active && self.role == Role::Admin
    }
}
