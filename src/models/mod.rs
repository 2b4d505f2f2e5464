pub mod biz;
pub mod role;
pub mod user;

pub use biz::BizType;
pub use role::{Role, predefined_roles};
pub use user::{NewUser, User, UserStatus};
