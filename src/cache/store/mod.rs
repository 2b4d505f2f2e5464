use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("value at {0} is not an integer")]
    NotAnInteger(String),
    #[error("memory store lock poisoned")]
    Poisoned,
}

/// 带原生过期能力的键值存储
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 批量写入，所有键共享同一个过期时间
    async fn set_ex(&self, entries: &[(&str, &str)], ttl: Duration) -> Result<(), KvError>;

    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// 原子自增并返回新值；键不存在时从 0 开始且不带过期时间
    async fn incr(&self, key: &str) -> Result<i64, KvError>;

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), KvError>;

    /// 批量删除，返回实际删除的键数量，不存在的键不计入
    async fn delete(&self, keys: &[&str]) -> Result<u64, KvError>;
}
