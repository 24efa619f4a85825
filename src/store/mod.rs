use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::UserResult,
    user::{NewUser, Select, User},
};

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Persistence for user accounts.
///
/// `create` validates before writing and reports a taken email as
/// [`UserError::UniquenessConflict`](crate::UserError::UniquenessConflict).
/// Reads honour [`Select`]: the password hash is only returned when asked for.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> UserResult<User>;
    async fn find_by_id(&self, id: Uuid, select: Select) -> UserResult<Option<User>>;
    async fn find_by_email(&self, email: &str, select: Select) -> UserResult<Option<User>>;
    /// Records or clears the user's live connection id. `false` if the user does not exist.
    async fn set_socket_id(&self, id: Uuid, socket_id: Option<&str>) -> UserResult<bool>;
    async fn delete(&self, id: Uuid) -> UserResult<bool>;
}
