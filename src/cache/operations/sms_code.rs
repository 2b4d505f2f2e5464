use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::cache::keys::{sms_attempts_key, sms_code_key};
use crate::cache::store::{KvError, KvStore};
use crate::models::BizType;

#[derive(Debug, Error)]
pub enum CodeError {
    #[error("verification code mismatch")]
    Mismatch,
    #[error("verification code expired")]
    Expired,
    #[error("too many verification attempts")]
    TooManyAttempts,
    #[error(transparent)]
    Store(#[from] KvError),
}

/// 短信验证码缓存
///
/// 每个 (业务类型, 手机号) 对应一个验证码和一个尝试计数，两者同时写入并共享过期时间。
/// `max_attempts` 是一个验证码允许的校验次数，计数在比较之前递增。
/// 校验成功以删除验证码键为准，并发的正确校验只有一次成功。
#[derive(Clone)]
pub struct CodeCache {
    store: Arc<dyn KvStore>,
    ttl: Duration,
    max_attempts: u32,
}

impl CodeCache {
    pub fn new(store: Arc<dyn KvStore>, ttl: Duration, max_attempts: u32) -> Self {
        Self {
            store,
            ttl,
            max_attempts,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 生成新验证码并重置尝试次数，返回验证码
    pub async fn set(&self, biz: BizType, phone: &str) -> Result<String, CodeError> {
        let code = generate_code();
        self.store_code(biz, phone, &code).await?;
        Ok(code)
    }

    async fn store_code(&self, biz: BizType, phone: &str, code: &str) -> Result<(), CodeError> {
        let key = sms_code_key(biz, phone);
        let attempts_key = sms_attempts_key(biz, phone);

        self.store
            .set_ex(&[(key.as_str(), code), (attempts_key.as_str(), "0")], self.ttl)
            .await?;
        Ok(())
    }

    pub async fn verify(&self, biz: BizType, phone: &str, code: &str) -> Result<(), CodeError> {
        let key = sms_code_key(biz, phone);
        let attempts_key = sms_attempts_key(biz, phone);

        // 原子递增，并发请求各自拿到不同的计数
        let attempts = self.store.incr(&attempts_key).await?;
        let stored = self.store.get(&key).await?;

        if stored.is_none() && attempts == 1 {
            // 计数键是本次递增新建的，补上过期时间，避免残留
            self.store.expire(&attempts_key, self.ttl).await?;
        }

        if attempts > i64::from(self.max_attempts) {
            tracing::warn!(%biz, attempts, "verification attempts exhausted");
            return Err(CodeError::TooManyAttempts);
        }

        let Some(stored) = stored else {
            return Err(CodeError::Expired);
        };
        if stored != code {
            return Err(CodeError::Mismatch);
        }

        // 删掉验证码的那次调用才算消费成功，其余并发调用视为已失效
        let consumed = self.store.delete(&[key.as_str()]).await?;
        if consumed == 0 {
            tracing::info!(%biz, "verification code consumed concurrently");
            return Err(CodeError::Expired);
        }
        self.store.delete(&[attempts_key.as_str()]).await?;
        Ok(())
    }

    pub async fn remove(&self, biz: BizType, phone: &str) -> Result<(), CodeError> {
        let key = sms_code_key(biz, phone);
        let attempts_key = sms_attempts_key(biz, phone);
        self.store.delete(&[key.as_str(), attempts_key.as_str()]).await?;
        Ok(())
    }
}

/// 六位数字验证码，不足六位补前导 0
fn generate_code() -> String {
    let num: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", num)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use async_trait::async_trait;
    use tokio::task::JoinSet;

    const PHONE: &str = "13800000000";

    fn cache() -> (Arc<MemoryStore>, CodeCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = CodeCache::new(store.clone(), Duration::from_secs(300), 3);
        (store, cache)
    }

    fn wrong(code: &str) -> String {
        if code == "000000" {
            "000001".into()
        } else {
            "000000".into()
        }
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn correct_code_is_single_use() {
        let (store, cache) = cache();
        let code = cache.set(BizType::Login, PHONE).await.unwrap();

        cache.verify(BizType::Login, PHONE, &code).await.unwrap();
        assert!(matches!(
            cache.verify(BizType::Login, PHONE, &code).await,
            Err(CodeError::Expired)
        ));
        // 只剩失败校验留下的计数键
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn attempts_are_capped_even_for_the_right_code() {
        let (_store, cache) = cache();
        let code = cache.set(BizType::Login, PHONE).await.unwrap();

        for _ in 0..3 {
            assert!(matches!(
                cache.verify(BizType::Login, PHONE, &wrong(&code)).await,
                Err(CodeError::Mismatch)
            ));
        }
        assert!(matches!(
            cache.verify(BizType::Login, PHONE, &code).await,
            Err(CodeError::TooManyAttempts)
        ));
    }

    #[tokio::test]
    async fn resending_resets_the_budget() {
        let (_store, cache) = cache();
        let first = cache.set(BizType::Register, PHONE).await.unwrap();
        for _ in 0..3 {
            let _ = cache.verify(BizType::Register, PHONE, &wrong(&first)).await;
        }

        let second = cache.set(BizType::Register, PHONE).await.unwrap();
        cache.verify(BizType::Register, PHONE, &second).await.unwrap();
    }

    #[tokio::test]
    async fn contexts_do_not_share_codes() {
        let (_store, cache) = cache();
        let code = cache.set(BizType::Login, PHONE).await.unwrap();
        assert!(matches!(
            cache.verify(BizType::ResetPwd, PHONE, &code).await,
            Err(CodeError::Expired)
        ));
        cache.verify(BizType::Login, PHONE, &code).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn code_and_counter_expire_together() {
        let (store, cache) = cache();
        let code = cache.set(BizType::ChangePhone, PHONE).await.unwrap();

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(matches!(
            cache.verify(BizType::ChangePhone, PHONE, &code).await,
            Err(CodeError::Expired)
        ));

        // 过期后的校验新建了计数键，它同样会过期
        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (store, cache) = cache();
        let code = cache.set(BizType::Login, PHONE).await.unwrap();

        cache.remove(BizType::Login, PHONE).await.unwrap();
        cache.remove(BizType::Login, PHONE).await.unwrap();
        assert!(store.is_empty().unwrap());
        assert!(matches!(
            cache.verify(BizType::Login, PHONE, &code).await,
            Err(CodeError::Expired)
        ));
    }

    #[tokio::test]
    async fn concurrent_guesses_never_exceed_the_budget() {
        let (_store, cache) = cache();
        let code = cache.set(BizType::Login, PHONE).await.unwrap();
        let guess = wrong(&code);

        let mut tasks = JoinSet::new();
        for _ in 0..20 {
            let cache = cache.clone();
            let guess = guess.clone();
            tasks.spawn(async move { cache.verify(BizType::Login, PHONE, &guess).await });
        }

        let mut mismatches = 0;
        let mut exhausted = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Err(CodeError::Mismatch) => mismatches += 1,
                Err(CodeError::TooManyAttempts) => exhausted += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(mismatches, 3);
        assert_eq!(exhausted, 17);
    }

    /// 读取后让出执行权，使并发校验在读取和删除之间交错
    struct YieldingStore(MemoryStore);

    #[async_trait]
    impl KvStore for YieldingStore {
        async fn set_ex(&self, entries: &[(&str, &str)], ttl: Duration) -> Result<(), KvError> {
            self.0.set_ex(entries, ttl).await
        }

        async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            let value = self.0.get(key).await;
            tokio::task::yield_now().await;
            value
        }

        async fn incr(&self, key: &str) -> Result<i64, KvError> {
            self.0.incr(key).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<(), KvError> {
            self.0.expire(key, ttl).await
        }

        async fn delete(&self, keys: &[&str]) -> Result<u64, KvError> {
            self.0.delete(keys).await
        }
    }

    #[tokio::test]
    async fn concurrent_correct_codes_succeed_once() {
        let store = Arc::new(YieldingStore(MemoryStore::new()));
        let cache = CodeCache::new(store, Duration::from_secs(300), 3);
        let code = cache.set(BizType::Login, PHONE).await.unwrap();

        let mut tasks = JoinSet::new();
        for _ in 0..3 {
            let cache = cache.clone();
            let code = code.clone();
            tasks.spawn(async move { cache.verify(BizType::Login, PHONE, &code).await });
        }

        let mut succeeded = 0;
        let mut expired = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(()) => succeeded += 1,
                Err(CodeError::Expired) => expired += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(succeeded, 1);
        assert_eq!(expired, 2);
    }
}
