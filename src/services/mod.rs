pub mod product_service;
pub mod user_service;
pub mod view_cache;

pub use product_service::ProductService;
pub use user_service::UserService;
pub use view_cache::{ListingInvalidator, ViewCache, PRODUCTS_LISTING, USERS_LISTING};

pub type ActionResult<T> = Result<T, crate::error::ActionError>;
