//! Staff credential storage
//!
//! The login and registration flows only need two lookups, so storage sits
//! behind [`UserStore`]. [`InMemoryUserStore`] backs tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hms_auth::{Principal, Role};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Stored staff account
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.username.clone(), self.role)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user '{0}' already exists")]
    Duplicate(String),

    #[error("user store error: {0}")]
    Backend(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a new account; usernames are unique
    async fn insert(&self, user: UserRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(user.username));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }
}
