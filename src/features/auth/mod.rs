//! Caller identity.
//!
//! Tokens are issued elsewhere; this feature only verifies them. Requests
//! without a valid bearer token run as the configured default user.

mod validator;

pub mod model;

pub use model::CurrentUser;
pub use validator::JwtValidator;
