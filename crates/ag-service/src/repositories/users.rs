//! Read-only user directory.
//!
//! Loaded once at startup and immutable thereafter. Stands in for a real
//! credential store; the rest of the service only ever calls [`UserDirectory::find`].

use crate::models::{Role, User};
use std::collections::HashMap;

/// Username → user record lookup.
pub struct UserDirectory {
    users: HashMap<String, User>,
}

impl UserDirectory {
    /// Build a directory from explicit user records.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.name.clone(), u)).collect(),
        }
    }

    /// The fixed user set the service ships with.
    pub fn seeded() -> Self {
        Self::with_users([
            User {
                name: "publisher1".to_string(),
                password: "pass".to_string(),
                role: Role::Publisher,
            },
            User {
                name: "publisher2".to_string(),
                password: "pass".to_string(),
                role: Role::Publisher,
            },
            User {
                name: "subscriber".to_string(),
                password: "pass".to_string(),
                role: Role::Subscriber,
            },
        ])
    }

    /// Look up a user by name.
    pub fn find(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }
}
