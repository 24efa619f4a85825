use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    error::{UserError, UserResult},
    user::{NewUser, Select, User},
};

use super::UserStore;

/// In-process store with the same rules as the database one.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> UserResult<User> {
        user.validate().map_err(|violations| {
            warn!(count = violations.len(), "user failed validation");
            UserError::Validation(violations)
        })?;

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            warn!(email = %user.email, "email already registered");
            return Err(UserError::UniquenessConflict { field: "email" });
        }

        let stored = User {
            id: Uuid::new_v4(),
            fullname: user.fullname,
            email: user.email,
            password: Some(user.password),
            socket_id: user.socket_id,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(stored.id, stored.clone());
        debug!(user_id = %stored.id, "user created");
        Ok(stored.project(Select::Default))
    }

    async fn find_by_id(&self, id: Uuid, select: Select) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned().map(|u| u.project(select)))
    }

    async fn find_by_email(&self, email: &str, select: Select) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .map(|u| u.project(select)))
    }

    async fn set_socket_id(&self, id: Uuid, socket_id: Option<&str>) -> UserResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.socket_id = socket_id.map(str::to_owned);
                debug!(user_id = %id, connected = socket_id.is_some(), "socket id updated");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let removed = self.users.write().await.remove(&id).is_some();
        if removed {
            debug!(user_id = %id, "user deleted");
        }
        Ok(removed)
    }
}
