use crate::config::{
    session::{SessionConfig, SessionLayer},
    AppConfig,
};
use crate::handlers::{self, api_handlers as api};
use crate::middleware::add_security_headers;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tower_sessions_sqlx_store::SqliteStore;

/// Session store in the application database, table `sessions`.
pub async fn session_layer(
    pool: SqlitePool,
    config: &AppConfig,
) -> Result<SessionLayer, sqlx::Error> {
    let session_store = SqliteStore::new(pool)
        .with_table_name("sessions")
        .map_err(|e| sqlx::Error::Configuration(e.into()))?;
    session_store.migrate().await?;

    Ok(SessionConfig::for_config(config).create_layer(session_store))
}

/// Complete router: HTML pages (session + CSRF), JSON API (CORS), static
/// assets and a 404 fallback.
pub fn build_router(state: AppState, session_layer: SessionLayer) -> Router {
    let html_routes = Router::new()
        .route("/", get(handlers::home_handler))
        // User routes
        .route(
            "/users",
            get(handlers::list_users_page).post(handlers::create_user_handler),
        )
        .route("/users/new", get(handlers::new_user_page))
        .route("/users/{id}", post(handlers::update_user_handler))
        .route("/users/{id}/edit", get(handlers::edit_user_page))
        .route("/users/{id}/delete", post(handlers::delete_user_handler))
        // Product routes
        .route(
            "/products",
            get(handlers::list_products_page).post(handlers::create_product_handler),
        )
        .route("/products/new", get(handlers::new_product_page))
        .route("/products/{id}", post(handlers::update_product_handler))
        .route("/products/{id}/edit", get(handlers::edit_product_page))
        .route(
            "/products/{id}/delete",
            post(handlers::delete_product_handler),
        )
        .layer(session_layer);

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    let api_routes = Router::new()
        .route("/api/users", get(api::list_users).post(api::create_user))
        .route(
            "/api/users/{id}",
            get(api::get_user)
                .put(api::update_user)
                .delete(api::delete_user),
        )
        .route(
            "/api/products",
            get(api::list_products).post(api::create_product),
        )
        .route(
            "/api/products/{id}",
            get(api::get_product)
                .put(api::update_product)
                .delete(api::delete_product),
        )
        .layer(cors_layer);

    Router::new()
        .merge(html_routes)
        .merge(api_routes)
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.production,
            add_security_headers,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router with its session store created in the state's own pool.
pub async fn build_app(state: AppState, config: &AppConfig) -> Result<Router, sqlx::Error> {
    let session_layer = session_layer(state.pool.clone(), config).await?;
    Ok(build_router(state, session_layer))
}
