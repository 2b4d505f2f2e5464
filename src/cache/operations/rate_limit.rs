use std::sync::Arc;
use std::time::Duration;

use crate::cache::keys::rate_limit_key;
use crate::cache::store::{KvError, KvStore};

/// 固定窗口限流计数
pub struct RateLimitCacheOperations;

impl RateLimitCacheOperations {
    /// 记录一次请求并返回窗口内的累计次数
    pub async fn hit(
        store: &Arc<dyn KvStore>,
        client: &str,
        window: Duration,
    ) -> Result<i64, KvError> {
        let key = rate_limit_key(client);
        let count = store.incr(&key).await?;

        if count == 1 {
            // 如果是窗口内第一次请求，设置过期时间
            store.expire(&key, window).await?;
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_expiry() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let window = Duration::from_secs(60);

        for expected in 1..=3 {
            let count = RateLimitCacheOperations::hit(&store, "10.0.0.1", window)
                .await
                .unwrap();
            assert_eq!(count, expected);
        }
        assert_eq!(
            RateLimitCacheOperations::hit(&store, "10.0.0.2", window)
                .await
                .unwrap(),
            1
        );

        tokio::time::advance(window).await;
        assert_eq!(
            RateLimitCacheOperations::hit(&store, "10.0.0.1", window)
                .await
                .unwrap(),
            1
        );
    }
}
