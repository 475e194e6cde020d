pub mod test_helpers {
    use crate::config::AppConfig;
    use crate::AppState;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use std::time::Duration;
    use tempfile::NamedTempFile;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        // A single connection: every connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        crate::db::run_migrations(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when two pools (server and CLI) must see the same data
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = crate::db::create_pool(&database_url).await?;

        Ok((pool, temp_file))
    }

    /// Configuration for router tests; the listing cache keeps fragments for
    /// a minute so cache behaviour is observable.
    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: ":memory:".to_string(),
            listing_cache_ttl: Duration::from_secs(60),
            ..AppConfig::default()
        }
    }

    /// Full application state over a fresh in-memory database.
    pub async fn create_test_state() -> Result<AppState, sqlx::Error> {
        let pool = create_test_db().await?;
        Ok(AppState::new(pool, &test_config()))
    }

    /// Insert a user row directly, bypassing validation
    pub async fn insert_test_user(
        pool: &SqlitePool,
        name: &str,
        email: &str,
        role: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert a product row directly, bypassing validation
    pub async fn insert_test_product(
        pool: &SqlitePool,
        name: &str,
        price: &str,
        stock: i64,
    ) -> Result<i64, sqlx::Error> {
        let now = chrono::Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, description, price, stock, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind("Test product description")
        .bind(price)
        .bind(stock)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}
