pub mod csrf;
pub mod security_headers;

pub use csrf::{get_or_create_csrf_token, validate_csrf_form_field};
pub use security_headers::add_security_headers;
