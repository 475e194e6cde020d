pub mod product;
pub mod user;

pub use product::{Product, ProductForm, ProductInput};
pub use user::{Role, User, UserForm, UserInput};
