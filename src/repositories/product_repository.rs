use super::{map_write_error, RepositoryError, RepositoryResult};
use crate::models::{Product, ProductInput};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::str::FromStr;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ProductRepository: Send + Sync {
    /// All products, most recently created first.
    async fn find_many(&self) -> RepositoryResult<Vec<Product>>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>>;
    async fn create(&self, input: ProductInput) -> RepositoryResult<Product>;
    /// Replaces every mutable field and refreshes `updated_at`.
    async fn update(&self, id: i64, input: ProductInput) -> RepositoryResult<Product>;
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
    async fn count(&self) -> RepositoryResult<i64>;
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: String,
    stock: i64,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price).map_err(|e| {
            RepositoryError::Corrupt(format!("price {:?} of product {}: {}", row.price, row.id, e))
        })?;

        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            stock: row.stock,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn find_many(&self) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, description, price, stock, image_url, created_at, updated_at
            FROM products
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, description, price, stock, image_url, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn create(&self, input: ProductInput) -> RepositoryResult<Product> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, description, price, stock, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, description, price, stock, image_url, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price.to_string())
        .bind(input.stock)
        .bind(&input.image_url)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Product::try_from(row)
    }

    async fn update(&self, id: i64, input: ProductInput) -> RepositoryResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = ?, description = ?, price = ?, stock = ?, image_url = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, name, description, price, stock, image_url, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price.to_string())
        .bind(input.stock)
        .bind(&input.image_url)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(Product::try_from)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
