pub mod api_handlers;
pub mod home_handlers;
pub mod product_handlers;
pub mod user_handlers;

pub use home_handlers::{home_handler, not_found_handler};
pub use product_handlers::{
    create_product_handler, delete_product_handler, edit_product_page, list_products_page,
    new_product_page, update_product_handler,
};
pub use user_handlers::{
    create_user_handler, delete_user_handler, edit_user_page, list_users_page, new_user_page,
    update_user_handler,
};

use crate::error::{ActionError, AppError};
use axum::response::Redirect;
use serde::Deserialize;

/// Outcome of the last delete, carried across the redirect to a listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Body of the per-row delete buttons.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// Path ids that are not integers address nothing.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok()
}

/// 303 back to a listing with a one-line flash in the query string.
pub(crate) fn listing_redirect(listing: &str, key: &str, message: &str) -> Redirect {
    Redirect::to(&format!(
        "{}?{}={}",
        listing,
        key,
        urlencoding::encode(message)
    ))
}

/// Reads that fail for any reason other than a missing record are server
/// errors for the HTML pages; the service has already logged the cause.
pub(crate) fn read_failure(err: ActionError) -> AppError {
    match err {
        ActionError::NotFound => AppError::NotFound,
        _ => AppError::InternalError,
    }
}

pub(crate) fn display_date(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
