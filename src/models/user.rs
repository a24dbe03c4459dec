use serde::{Deserialize, Serialize};

use crate::config::TokenIdentity;

pub const DEV_USER_ID: &str = "dev-user";

/// Authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    /// Identity used in development when no API tokens are configured
    pub fn development() -> Self {
        Self {
            id: DEV_USER_ID.to_string(),
            email: "dev@localhost".to_string(),
            name: "Development User".to_string(),
        }
    }

    pub fn from_identity(identity: &TokenIdentity) -> Self {
        Self {
            id: identity.user_id.clone(),
            email: identity
                .email
                .clone()
                .unwrap_or_else(|| format!("{}@localhost", identity.user_id)),
            name: identity.user_id.clone(),
        }
    }
}
