use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::{task::JoinHandle, time::Instant};

use super::{KvError, KvStore};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// 进程内实现，过期在读取时判断，后台清理器只负责回收内存
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, KvError> {
        self.items.lock().map_err(|_| KvError::Poisoned)
    }

    /// 删除已过期的项，返回删除数量
    pub fn purge_expired(&self) -> Result<usize, KvError> {
        let now = Instant::now();
        let mut items = self.lock()?;
        let before = items.len();
        items.retain(|_, entry| !entry.expired(now));
        Ok(before - items.len())
    }

    /// 当前存活的键数量
    pub fn len(&self) -> Result<usize, KvError> {
        let now = Instant::now();
        Ok(self.lock()?.values().filter(|e| !e.expired(now)).count())
    }

    pub fn is_empty(&self) -> Result<bool, KvError> {
        Ok(self.len()? == 0)
    }

    /// 定期清理，存储被释放后自动退出
    pub fn spawn_janitor(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                match store.purge_expired() {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!(purged = n, "memory cache purged expired keys"),
                    Err(e) => {
                        tracing::error!(error = %e, "memory cache janitor stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set_ex(&self, entries: &[(&str, &str)], ttl: Duration) -> Result<(), KvError> {
        let expires_at = Some(Instant::now() + ttl);
        let mut items = self.lock()?;
        for (key, value) in entries {
            items.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at,
                },
            );
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let now = Instant::now();
        let items = self.lock()?;
        Ok(items
            .get(key)
            .filter(|e| !e.expired(now))
            .map(|e| e.value.clone()))
    }

    async fn incr(&self, key: &str) -> Result<i64, KvError> {
        let now = Instant::now();
        let mut items = self.lock()?;

        let (current, expires_at) = match items.get(key) {
            Some(entry) if !entry.expired(now) => {
                let current = entry
                    .value
                    .parse::<i64>()
                    .map_err(|_| KvError::NotAnInteger(key.to_string()))?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };

        let next = current + 1;
        items.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), KvError> {
        let now = Instant::now();
        let mut items = self.lock()?;
        if let Some(entry) = items.get_mut(key) {
            if !entry.expired(now) {
                entry.expires_at = Some(now + ttl);
            }
        }
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64, KvError> {
        let now = Instant::now();
        let mut items = self.lock()?;
        let mut removed = 0;
        for key in keys {
            // 已过期但尚未清理的项与 Redis 一样视为不存在
            if items.remove(*key).is_some_and(|e| !e.expired(now)) {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
