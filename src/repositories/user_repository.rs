use super::{map_write_error, RepositoryError, RepositoryResult};
use crate::models::{Role, User, UserInput};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    /// All users, most recently created first.
    async fn find_many(&self) -> RepositoryResult<Vec<User>>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn create(&self, input: UserInput) -> RepositoryResult<User>;
    /// Replaces every mutable field; `id` and `created_at` are left alone.
    async fn update(&self, id: i64, input: UserInput) -> RepositoryResult<User>;
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
    async fn count(&self) -> RepositoryResult<i64>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            created_at: row.created_at,
        })
    }
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_many(&self) -> RepositoryResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at
            FROM users
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create(&self, input: UserInput) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, role, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        User::try_from(row)
    }

    async fn update(&self, id: i64, input: UserInput) -> RepositoryResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = ?, email = ?, role = ?
            WHERE id = ?
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.role.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(User::try_from)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
