pub mod permission;
pub mod policy;
pub mod token;

pub use permission::{Permission, Permissions, WILDCARD};
pub use policy::{AuthzError, DenyReason, LookupError, PermissionSubject, Policy, authorize};
pub use token::{Claims, TokenConfig, TokenError, TokenPair, TokenService};
