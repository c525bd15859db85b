use async_trait::async_trait;
use thiserror::Error;

/// 持久化层返回的错误，对控制器而言是不透明的
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Backend(String),
}

/// 实体的存储协作者
#[async_trait]
pub trait Repository<E>: Send + Sync
where
    E: Send + 'static,
{
    async fn list(&self) -> Result<Vec<E>, PersistenceError>;

    /// 新建表单的默认值
    async fn new_form_defaults(&self) -> Result<E, PersistenceError>;

    async fn insert(&self, record: E) -> Result<(), PersistenceError>;
}
