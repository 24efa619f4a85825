use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    error::{UserError, UserResult},
    user::{FullName, HashedPassword, NewUser, Select, User},
};

use super::UserStore;

const EMAIL_CONSTRAINT: &str = "users_email_key";

const DEFAULT_COLUMNS: &str =
    "id, firstname, lastname, email, NULL::text AS password, socket_id, created_at";
const WITH_PASSWORD_COLUMNS: &str =
    "id, firstname, lastname, email, password, socket_id, created_at";

fn columns(select: Select) -> &'static str {
    match select {
        Select::Default => DEFAULT_COLUMNS,
        Select::WithPassword => WITH_PASSWORD_COLUMNS,
    }
}

/// Row in the `users` table.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    firstname: String,
    lastname: Option<String>,
    email: String,
    password: Option<String>,
    socket_id: Option<String>,
    created_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            fullname: FullName {
                firstname: r.firstname,
                lastname: r.lastname,
            },
            email: r.email,
            password: r.password.map(HashedPassword::from_stored),
            socket_id: r.socket_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    /// Creates the `users` table and its unique email index if missing.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

fn map_insert_error(e: sqlx::Error) -> UserError {
    match e {
        sqlx::Error::Database(ref db)
            if db.is_unique_violation() && db.constraint() == Some(EMAIL_CONSTRAINT) =>
        {
            UserError::UniquenessConflict { field: "email" }
        }
        other => UserError::Store(other),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> UserResult<User> {
        user.validate().map_err(|violations| {
            warn!(count = violations.len(), "user failed validation");
            UserError::Validation(violations)
        })?;

        let sql = format!(
            "INSERT INTO users (id, firstname, lastname, email, password, socket_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {DEFAULT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.fullname.firstname)
            .bind(&user.fullname.lastname)
            .bind(&user.email)
            .bind(user.password.as_str())
            .bind(&user.socket_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                let err = map_insert_error(e);
                warn!(error = %err, email = %user.email, "insert user failed");
                err
            })?;
        debug!(user_id = %row.id, "user created");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid, select: Select) -> UserResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", columns(select));
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str, select: Select) -> UserResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", columns(select));
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn set_socket_id(&self, id: Uuid, socket_id: Option<&str>) -> UserResult<bool> {
        let result = sqlx::query("UPDATE users SET socket_id = $2 WHERE id = $1")
            .bind(id)
            .bind(socket_id)
            .execute(&self.db)
            .await?;
        debug!(user_id = %id, connected = socket_id.is_some(), "socket id updated");
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
