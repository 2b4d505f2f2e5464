mod auth;
mod error_handler;
mod policy;
mod rate_limit;

pub use auth::{AuthUserId, CredentialError, auth_middleware, bearer_token};
pub use error_handler::{log_errors, panic_response};
pub use policy::{CurrentUser, PolicyGuard, authorize};
pub use rate_limit::{RateLimiter, rate_limit};
