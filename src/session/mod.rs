// 会话模块
// 包含会话存储后端和请求级会话解析

mod memory;
mod redis_store;
mod resolver;
mod store;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;
pub use resolver::{Session, SessionCookieConfig, SessionResolver, resolve_session};
pub use store::{SessionError, SessionId, SessionStore};
