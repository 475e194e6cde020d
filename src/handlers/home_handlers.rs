use crate::error::AppError;
use crate::handlers::read_failure;
use crate::AppState;
use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    active: &'static str,
    user_count: i64,
    product_count: i64,
}

/// GET / - Dashboard with record counts
pub async fn home_handler(State(state): State<AppState>) -> Result<HomeTemplate, AppError> {
    let user_count = state
        .user_service
        .count_users()
        .await
        .map_err(read_failure)?;
    let product_count = state
        .product_service
        .count_products()
        .await
        .map_err(read_failure)?;

    Ok(HomeTemplate {
        active: "home",
        user_count,
        product_count,
    })
}

/// Fallback for unknown paths
pub async fn not_found_handler() -> AppError {
    AppError::NotFound
}
