/// 缓存键生成函数
use crate::models::BizType;

/// 验证码缓存键前缀
const SMS_CODE_PREFIX: &str = "sms:code:";

/// 验证次数缓存键前缀
const SMS_ATTEMPTS_PREFIX: &str = "sms:attempts:";

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成验证码缓存键
pub fn sms_code_key(biz: BizType, phone: &str) -> String {
    format!("{}{}:{}", SMS_CODE_PREFIX, biz, phone)
}

/// 生成验证次数缓存键
pub fn sms_attempts_key(biz: BizType, phone: &str) -> String {
    format!("{}{}:{}", SMS_ATTEMPTS_PREFIX, biz, phone)
}

/// 生成限流计数键
pub fn rate_limit_key(client: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, client)
}
