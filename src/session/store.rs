use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// 客户端通过 cookie 携带的不透明会话标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub(crate) fn shard_hint(&self) -> u64 {
        self.0.as_u64_pair().1
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("redis session backend error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("session state lock poisoned")]
    Poisoned,
    #[error("session `{0}` does not exist")]
    Unknown(SessionId),
}

/// 会话状态的存储后端。
///
/// 实现必须支持并发访问：不同会话之间互不阻塞，同一会话上的修改串行执行。
/// 所有写入都以单个键为粒度，`get_or_insert` 必须是原子的。
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 创建一个空会话并返回它的标识
    async fn create(&self) -> Result<SessionId, SessionError>;

    /// 会话存在时刷新过期时间并返回 `true`
    async fn touch(&self, id: &SessionId) -> Result<bool, SessionError>;

    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<String>, SessionError>;

    /// 键不存在时写入 `value`，返回最终绑定的值
    async fn get_or_insert(
        &self,
        id: &SessionId,
        key: &str,
        value: String,
    ) -> Result<String, SessionError>;

    async fn insert(&self, id: &SessionId, key: &str, value: String) -> Result<(), SessionError>;

    async fn invalidate(&self, id: &SessionId) -> Result<(), SessionError>;
}
