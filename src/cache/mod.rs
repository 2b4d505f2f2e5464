// 缓存模块
// 包含键值存储抽象、键生成和缓存操作逻辑

pub mod keys;
pub mod operations;
pub mod store;

// 重新导出常用类型，方便其他模块使用
pub use operations::{CodeCache, CodeError, RateLimitCacheOperations};
pub use store::{KvError, KvStore, MemoryStore, RedisStore};
