pub mod auth;

pub use auth::{CurrentUser, MaybeUser, ACCESS_TOKEN_COOKIE};
