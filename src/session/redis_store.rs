use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use super::store::{SessionError, SessionId, SessionStore};

// 会话哈希中始终存在的字段，保证空会话也有对应的键
const CREATED_AT_FIELD: &str = "__created_at";

/// 基于 Redis 的会话存储，每个会话是一个带 TTL 的哈希键
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: Arc<RedisClient>,
    namespace: String,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(redis: Arc<RedisClient>, ttl: Duration) -> Self {
        Self {
            redis,
            namespace: "session".to_string(),
            ttl,
        }
    }

    fn key(&self, id: &SessionId) -> String {
        format!("{}:{}", self.namespace, id)
    }

    fn ttl_secs(&self) -> i64 {
        self.ttl.as_secs().clamp(1, i64::MAX as u64) as i64
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self) -> Result<SessionId, SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let id = SessionId::random();
        let key = self.key(&id);

        let _: () = redis::pipe()
            .atomic()
            .hset(&key, CREATED_AT_FIELD, chrono::Utc::now().timestamp())
            .ignore()
            .expire(&key, self.ttl_secs())
            .ignore()
            .query_async(&mut conn)
            .await?;

        tracing::debug!("Created redis session {}", id);
        Ok(id)
    }

    async fn touch(&self, id: &SessionId) -> Result<bool, SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        // EXPIRE 对不存在的键返回 0
        let exists: bool = conn.expire(self.key(id), self.ttl_secs()).await?;
        Ok(exists)
    }

    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<String>, SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.hget(self.key(id), key).await?;
        Ok(value)
    }

    async fn get_or_insert(
        &self,
        id: &SessionId,
        key: &str,
        value: String,
    ) -> Result<String, SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let session_key = self.key(id);

        let (bound,): (String,) = redis::pipe()
            .atomic()
            .hset_nx(&session_key, key, value)
            .ignore()
            .hget(&session_key, key)
            .expire(&session_key, self.ttl_secs())
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(bound)
    }

    async fn insert(&self, id: &SessionId, key: &str, value: String) -> Result<(), SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let session_key = self.key(id);

        let _: () = redis::pipe()
            .atomic()
            .hset(&session_key, key, value)
            .ignore()
            .expire(&session_key, self.ttl_secs())
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn invalidate(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(self.key(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl: Duration) -> RedisSessionStore {
        // Client::open 只解析地址，不建立连接
        let client = RedisClient::open("redis://127.0.0.1/").unwrap();
        RedisSessionStore::new(Arc::new(client), ttl)
    }

    #[test]
    fn keys_are_namespaced() {
        let store = store(Duration::from_secs(60));
        let id = SessionId::random();
        assert_eq!(store.key(&id), format!("session:{}", id));
    }

    #[test]
    fn ttl_is_clamped_to_redis_range() {
        assert_eq!(store(Duration::from_secs(90)).ttl_secs(), 90);
        assert_eq!(store(Duration::ZERO).ttl_secs(), 1);
        assert_eq!(store(Duration::from_secs(u64::MAX)).ttl_secs(), i64::MAX);
    }

    // 需要可用的 Redis：REDIS_URL=redis://... cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn round_trip_against_live_redis() {
        let Ok(url) = std::env::var("REDIS_URL") else {
            return;
        };
        let client = RedisClient::open(url).unwrap();
        let store = RedisSessionStore::new(Arc::new(client), Duration::from_secs(60));

        let id = store.create().await.unwrap();
        assert!(store.touch(&id).await.unwrap());
        assert_eq!(store.get(&id, "k").await.unwrap(), None);

        let first = store.get_or_insert(&id, "k", "a".into()).await.unwrap();
        let second = store.get_or_insert(&id, "k", "b".into()).await.unwrap();
        assert_eq!(first, "a");
        assert_eq!(second, "a");

        store.insert(&id, "k", "c".into()).await.unwrap();
        assert_eq!(store.get(&id, "k").await.unwrap().as_deref(), Some("c"));

        store.invalidate(&id).await.unwrap();
        assert!(!store.touch(&id).await.unwrap());
        assert!(!store.touch(&SessionId::random()).await.unwrap());
    }
}
