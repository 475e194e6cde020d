pub mod product_repository;
pub mod user_repository;

pub use product_repository::{ProductRepository, SqliteProductRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Stored value could not be decoded: {0}")]
    Corrupt(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Unique-constraint violations become `AlreadyExists`; everything else is
/// passed through as a database error.
pub(crate) fn map_write_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::AlreadyExists
        }
        _ => RepositoryError::Database(err),
    }
}
