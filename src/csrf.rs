//! 与会话绑定的 CSRF 令牌。
//!
//! 令牌在会话内首次需要时生成并保存，之后在会话有效期内保持不变，
//! 同一会话中渲染的所有表单共用一个令牌。

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::session::{Session, SessionError};

/// 非表单请求可通过该请求头提交令牌
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

const SESSION_KEY: &str = "csrf_token";
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CsrfToken(String);

impl CsrfToken {
    fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct CsrfGuard;

impl CsrfGuard {
    /// 返回会话绑定的令牌，首次调用时生成
    pub async fn token_for(session: &Session) -> Result<CsrfToken, SessionError> {
        session
            .get_or_insert_with(SESSION_KEY, || CsrfToken::generate().0)
            .await
            .map(CsrfToken)
    }

    pub async fn validate(session: &Session, candidate: Option<&str>) -> Result<bool, SessionError> {
        let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
            return Ok(false);
        };
        let Some(bound) = session.get(SESSION_KEY).await? else {
            return Ok(false);
        };
        Ok(bound.as_bytes().ct_eq(candidate.as_bytes()).into())
    }

    /// 替换会话令牌，此前签发的令牌随即失效
    pub async fn rotate(session: &Session) -> Result<CsrfToken, SessionError> {
        let token = CsrfToken::generate();
        session.insert(SESSION_KEY, token.0.clone()).await?;
        Ok(token)
    }
}
