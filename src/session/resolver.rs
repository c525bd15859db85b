use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::store::{SessionError, SessionId, SessionStore};
use crate::error::AppError;

/// 处理器持有的会话句柄，所有读写都委托给底层存储
#[derive(Clone)]
pub struct Session {
    id: SessionId,
    store: Arc<dyn SessionStore>,
    is_new: bool,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// 本次请求是否新建了会话
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.store.get(&self.id, key).await
    }

    pub async fn get_or_insert_with(
        &self,
        key: &str,
        init: impl FnOnce() -> String,
    ) -> Result<String, SessionError> {
        if let Some(value) = self.store.get(&self.id, key).await? {
            return Ok(value);
        }
        self.store.get_or_insert(&self.id, key, init()).await
    }

    pub async fn insert(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.store.insert(&self.id, key, value).await
    }

    pub async fn invalidate(self) -> Result<(), SessionError> {
        self.store.invalidate(&self.id).await
    }
}

#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub secure: bool,
}

/// 根据请求 cookie 定位会话，缺失或失效时新建
pub struct SessionResolver {
    store: Arc<dyn SessionStore>,
    cookie: SessionCookieConfig,
}

impl SessionResolver {
    pub fn new(store: Arc<dyn SessionStore>, cookie: SessionCookieConfig) -> Self {
        Self { store, cookie }
    }

    pub async fn resolve(&self, jar: &CookieJar) -> Result<Session, SessionError> {
        let presented = jar
            .get(&self.cookie.name)
            .and_then(|c| c.value().parse::<SessionId>().ok());

        if let Some(id) = presented {
            if self.store.touch(&id).await? {
                return Ok(Session {
                    id,
                    store: self.store.clone(),
                    is_new: false,
                });
            }
            tracing::debug!("Session {} not found, creating a new one", id);
        }

        let id = self.store.create().await?;
        Ok(Session {
            id,
            store: self.store.clone(),
            is_new: true,
        })
    }

    pub fn cookie_for(&self, session: &Session) -> Cookie<'static> {
        Cookie::build((self.cookie.name.clone(), session.id().to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie.secure)
            .build()
    }
}

/// 解析会话并放入请求扩展；新会话在响应中下发 cookie
pub async fn resolve_session(
    State(resolver): State<Arc<SessionResolver>>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let session = resolver.resolve(&jar).await?;
    let is_new = session.is_new();
    let cookie = resolver.cookie_for(&session);

    req.extensions_mut().insert(session);
    let response = next.run(req).await;

    if is_new {
        Ok((jar.add(cookie), response).into_response())
    } else {
        Ok(response)
    }
}
