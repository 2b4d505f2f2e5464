// 数据库实体
pub mod user;

pub use user::{RoleEntity, UserEntity};
