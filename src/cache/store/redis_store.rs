use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient, aio::MultiplexedConnection};

use super::{KvError, KvStore};

/// Redis 实现，复用一条多路复用连接
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = RedisClient::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

// Redis 的过期时间以秒计，且不能为 0
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl KvStore for RedisStore {
    async fn set_ex(&self, entries: &[(&str, &str)], ttl: Duration) -> Result<(), KvError> {
        let mut conn = self.conn.clone();

        // 用管道批量执行命令
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            pipe.set_ex(*key, *value, ttl_secs(ttl)).ignore();
        }
        pipe.query_async::<()>(&mut conn).await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn incr(&self, key: &str) -> Result<i64, KvError> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.incr(key, 1).await?;
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn.expire(key, ttl_secs(ttl) as i64).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<u64, KvError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(keys).await?;
        Ok(removed)
    }
}
