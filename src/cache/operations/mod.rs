/// 缓存操作
/// 基于键值存储实现的业务缓存逻辑

// 短信验证码
pub mod sms_code;

// 请求限流计数
pub mod rate_limit;

pub use rate_limit::RateLimitCacheOperations;
pub use sms_code::{CodeCache, CodeError};
