pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod validation;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use config::AppConfig;
use repositories::{SqliteProductRepository, SqliteUserRepository};
use services::{ProductService, UserService, ViewCache};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub product_service: Arc<ProductService>,
    pub view_cache: Arc<ViewCache>,
    pub pool: sqlx::SqlitePool,
    pub production: bool,
}

impl AppState {
    /// Wires repositories and services over `pool`. Both services report
    /// their writes to the same listing cache the handlers read from.
    pub fn new(pool: sqlx::SqlitePool, config: &AppConfig) -> Self {
        let view_cache = Arc::new(ViewCache::new(config.listing_cache_ttl));

        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let product_repository = Arc::new(SqliteProductRepository::new(pool.clone()));

        let user_service = Arc::new(UserService::new(user_repository, view_cache.clone()));
        let product_service = Arc::new(ProductService::new(product_repository, view_cache.clone()));

        Self {
            user_service,
            product_service,
            view_cache,
            pool,
            production: config.is_production(),
        }
    }
}
