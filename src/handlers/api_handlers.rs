//! JSON surface over the same actions as the HTML pages.
//!
//! Success bodies are `{"success": true, "data": ...}`; failures are
//! `{"error": {"<field>": ["message"], "_form": "message"}}` with the status
//! chosen by [`ActionError::status`].

use crate::error::ActionError;
use crate::handlers::parse_id;
use crate::models::{ProductForm, UserForm};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiSuccess<T> {
    fn with(data: T) -> Self {
        ApiSuccess {
            success: true,
            data: Some(data),
        }
    }
}

impl ApiSuccess<()> {
    fn empty() -> Self {
        ApiSuccess {
            success: true,
            data: None,
        }
    }
}

pub struct ApiError(ActionError);

impl From<ActionError> for ApiError {
    fn from(err: ActionError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let body = serde_json::json!({ "error": self.0.into_form_errors() });
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

fn api_id(raw: &str) -> Result<i64, ApiError> {
    parse_id(raw).ok_or(ApiError(ActionError::NotFound))
}

// Users

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult {
    let users = state.user_service.list_users().await?;
    Ok(Json(users).into_response())
}

/// GET /api/users/{id}
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let user = state.user_service.get_user(api_id(&id)?).await?;
    Ok(Json(user).into_response())
}

/// POST /api/users
pub async fn create_user(State(state): State<AppState>, Form(form): Form<UserForm>) -> ApiResult {
    let user = state.user_service.create_user(&form).await?;
    Ok((StatusCode::CREATED, Json(ApiSuccess::with(user))).into_response())
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<UserForm>,
) -> ApiResult {
    let user = state.user_service.update_user(api_id(&id)?, &form).await?;
    Ok(Json(ApiSuccess::with(user)).into_response())
}

/// DELETE /api/users/{id}
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.user_service.delete_user(api_id(&id)?).await?;
    Ok(Json(ApiSuccess::empty()).into_response())
}

// Products

/// GET /api/products
pub async fn list_products(State(state): State<AppState>) -> ApiResult {
    let products = state.product_service.list_products().await?;
    Ok(Json(products).into_response())
}

/// GET /api/products/{id}
pub async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let product = state.product_service.get_product(api_id(&id)?).await?;
    Ok(Json(product).into_response())
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> ApiResult {
    let product = state.product_service.create_product(&form).await?;
    Ok((StatusCode::CREATED, Json(ApiSuccess::with(product))).into_response())
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> ApiResult {
    let product = state
        .product_service
        .update_product(api_id(&id)?, &form)
        .await?;
    Ok(Json(ApiSuccess::with(product)).into_response())
}

/// DELETE /api/products/{id}
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.product_service.delete_product(api_id(&id)?).await?;
    Ok(Json(ApiSuccess::empty()).into_response())
}
