use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    controller::FieldCoercionError, repository::PersistenceError, session::SessionError,
};

/// 控制器边界上的请求级错误，每个变体对应一个 HTTP 状态码
#[derive(Debug, Error)]
pub enum AppError {
    #[error("session store unavailable: {0}")]
    SessionUnavailable(#[from] SessionError),
    #[error("CSRF token missing or invalid")]
    CsrfValidationFailed,
    #[error("failed to render view `{view}`: {source}")]
    Render {
        view: &'static str,
        #[source]
        source: minijinja::Error,
    },
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    FieldCoercion(#[from] FieldCoercionError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SessionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::CsrfValidationFailed => StatusCode::FORBIDDEN,
            AppError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::FieldCoercion(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::SessionUnavailable(_) => "Session service unavailable".to_string(),
            AppError::CsrfValidationFailed => "Invalid or missing CSRF token".to_string(),
            AppError::Render { .. } => "Failed to render page".to_string(),
            AppError::Persistence(_) => "Failed to access storage".to_string(),
            // 字段名和原始值来自客户端，需转义后再输出
            AppError::FieldCoercion(e) => minijinja::HtmlEscape(&e.to_string()).to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = Html(format!(
            "<!doctype html><title>{code}</title><h1>{code}</h1><p>{message}</p>",
            code = status.as_u16(),
            message = self.public_message(),
        ));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_each_condition_to_its_status() {
        assert_eq!(
            AppError::SessionUnavailable(SessionError::Poisoned).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::CsrfValidationFailed.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Persistence(PersistenceError::Backend("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let coercion = FieldCoercionError::new("cliente", "abc");
        assert_eq!(
            AppError::from(coercion).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn coercion_message_is_escaped() {
        let err = AppError::from(FieldCoercionError::new("cliente", "<b>1</b>"));
        let message = err.public_message();
        assert!(!message.contains("<b>"));
        assert!(message.contains("&lt;b&gt;"));
    }
}
