// 数据库模块
// 包含数据库实体定义和用户存储库

use thiserror::Error;

pub mod entities; // 数据库实体定义
pub mod repositories; // 存储库接口与实现

// 重新导出常用类型，方便其他模块使用
pub use repositories::{MemoryUserRepository, PgUserRepository, UserRepository};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("user store lock poisoned")]
    Poisoned,
}
