use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{SessionError, SessionId, SessionStore};

struct SessionEntry {
    state: Mutex<SessionState>,
}

struct SessionState {
    values: HashMap<String, String>,
    last_seen: DateTime<Utc>,
}

type Shard = RwLock<HashMap<SessionId, Arc<SessionEntry>>>;

/// 进程内会话存储。
///
/// 会话按标识分片，分片锁只在查找或插入映射时持有；每个会话的数据另有一把
/// 互斥锁，因此不同会话的请求不会争用同一把锁。过期会话在访问时惰性清除，
/// 新建会话时还会清理所在分片中的全部过期会话。
pub struct MemorySessionStore {
    shards: Box<[Shard]>,
    ttl: chrono::Duration,
}

impl MemorySessionStore {
    pub fn new(shards: usize, ttl: Duration) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self { shards, ttl }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().unwrap().len()).sum()
    }

    fn shard(&self, id: &SessionId) -> &Shard {
        &self.shards[(id.shard_hint() % self.shards.len() as u64) as usize]
    }

    /// 取出未过期的会话条目，过期条目顺带从分片中移除
    fn live_entry(&self, id: &SessionId) -> Result<Option<Arc<SessionEntry>>, SessionError> {
        let entry = {
            let shard = self.shard(id).read().map_err(|_| SessionError::Poisoned)?;
            shard.get(id).cloned()
        };
        let Some(entry) = entry else {
            return Ok(None);
        };

        let expired = {
            let state = entry.state.lock().map_err(|_| SessionError::Poisoned)?;
            Utc::now() - state.last_seen > self.ttl
        };
        if expired {
            tracing::debug!("Session {} expired", id);
            self.shard(id)
                .write()
                .map_err(|_| SessionError::Poisoned)?
                .remove(id);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn with_state<T>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut SessionState) -> T,
    ) -> Result<T, SessionError> {
        let entry = self.live_entry(id)?.ok_or(SessionError::Unknown(*id))?;
        let mut state = entry.state.lock().map_err(|_| SessionError::Poisoned)?;
        state.last_seen = Utc::now();
        Ok(f(&mut state))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self) -> Result<SessionId, SessionError> {
        let id = SessionId::random();
        let entry = Arc::new(SessionEntry {
            state: Mutex::new(SessionState {
                values: HashMap::new(),
                last_seen: Utc::now(),
            }),
        });
        let mut shard = self.shard(&id).write().map_err(|_| SessionError::Poisoned)?;
        // 顺带清理同一分片中的过期会话，不再访问的会话也不会一直留在内存里
        let now = Utc::now();
        let before = shard.len();
        shard.retain(|_, entry| {
            entry
                .state
                .lock()
                .map(|state| now - state.last_seen <= self.ttl)
                .unwrap_or(true)
        });
        let swept = before - shard.len();
        if swept > 0 {
            tracing::debug!("Swept {} expired sessions", swept);
        }
        shard.insert(id, entry);
        Ok(id)
    }

    async fn touch(&self, id: &SessionId) -> Result<bool, SessionError> {
        match self.with_state(id, |_| ()) {
            Ok(()) => Ok(true),
            Err(SessionError::Unknown(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<String>, SessionError> {
        self.with_state(id, |state| state.values.get(key).cloned())
    }

    async fn get_or_insert(
        &self,
        id: &SessionId,
        key: &str,
        value: String,
    ) -> Result<String, SessionError> {
        self.with_state(id, |state| {
            state
                .values
                .entry(key.to_string())
                .or_insert(value)
                .clone()
        })
    }

    async fn insert(&self, id: &SessionId, key: &str, value: String) -> Result<(), SessionError> {
        self.with_state(id, |state| {
            state.values.insert(key.to_string(), value);
        })
    }

    async fn invalidate(&self, id: &SessionId) -> Result<(), SessionError> {
        self.shard(id)
            .write()
            .map_err(|_| SessionError::Poisoned)?
            .remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemorySessionStore {
        MemorySessionStore::new(4, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn created_session_is_live() {
        let store = store();
        let id = store.create().await.unwrap();
        assert!(store.touch(&id).await.unwrap());
        assert_eq!(store.get(&id, "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_session_is_not_live() {
        let store = store();
        assert!(!store.touch(&SessionId::random()).await.unwrap());
        assert!(matches!(
            store.get(&SessionId::random(), "k").await,
            Err(SessionError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn get_or_insert_keeps_first_value() {
        let store = store();
        let id = store.create().await.unwrap();
        let first = store.get_or_insert(&id, "k", "a".into()).await.unwrap();
        let second = store.get_or_insert(&id, "k", "b".into()).await.unwrap();
        assert_eq!(first, "a");
        assert_eq!(second, "a");

        store.insert(&id, "k", "c".into()).await.unwrap();
        assert_eq!(store.get(&id, "k").await.unwrap().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn sessions_do_not_share_values() {
        let store = store();
        let a = store.create().await.unwrap();
        let b = store.create().await.unwrap();
        store.insert(&a, "k", "a".into()).await.unwrap();
        assert_eq!(store.get(&b, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalidated_session_is_gone() {
        let store = store();
        let id = store.create().await.unwrap();
        store.invalidate(&id).await.unwrap();
        assert!(!store.touch(&id).await.unwrap());
    }

    #[tokio::test]
    async fn expired_session_is_dropped() {
        let store = MemorySessionStore::new(1, Duration::ZERO);
        let id = store.create().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!store.touch(&id).await.unwrap());
    }

    #[tokio::test]
    async fn create_sweeps_expired_sessions() {
        let store = MemorySessionStore::new(1, Duration::ZERO);
        for _ in 0..1000 {
            store.create().await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(5)).await;

        let id = store.create().await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.shard(&id).read().unwrap().contains_key(&id));
    }

    #[tokio::test]
    async fn create_keeps_live_sessions() {
        let store = MemorySessionStore::new(1, Duration::from_secs(3600));
        let first = store.create().await.unwrap();
        store.create().await.unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.touch(&first).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_writers_agree() {
        let store = Arc::new(store());
        let id = store.create().await.unwrap();

        let handles = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.get_or_insert(&id, "k", i.to_string()).await })
            })
            .collect::<Vec<_>>();

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap().unwrap());
        }
        assert!(seen.iter().all(|v| v == &seen[0]));
    }
}
