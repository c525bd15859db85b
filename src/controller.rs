//! 通用实体控制器：列表、新建表单、保存后重定向。
//!
//! 每个实体实现 [`Entity`] 并通过 [`entity_routes`] 注册三条路由：
//! `GET {ROUTE}`、`GET {ROUTE}/create` 与 `POST {ROUTE}`。

use std::sync::Arc;

use axum::{
    Extension, Form, Router,
    extract::{FromRef, State},
    http::HeaderMap,
    response::{Html, Redirect},
    routing::get,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    csrf::{CSRF_HEADER_NAME, CsrfGuard},
    error::AppError,
    repository::Repository,
    session::Session,
    view::{View, ViewModel, ViewRenderer},
};

/// 表单字段无法转换为目标类型
#[derive(Debug, Error, PartialEq, Eq)]
#[error("field `{field}` has an invalid value `{value}`")]
pub struct FieldCoercionError {
    pub field: &'static str,
    pub value: String,
}

impl FieldCoercionError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

pub trait Entity: Serialize + Sized + Send + Sync + 'static {
    /// 提交的原始表单字段
    type Form: DeserializeOwned + Send + 'static;

    const NAME: &'static str;
    const ROUTE: &'static str;
    const LIST_VIEW: View;
    const CREATE_VIEW: View;

    fn from_form(form: Self::Form) -> Result<Self, FieldCoercionError>;
}

/// 单个实体的控制器依赖
pub struct Controller<E: Send + 'static> {
    pub repository: Arc<dyn Repository<E>>,
    pub views: Arc<ViewRenderer>,
}

impl<E: Send + 'static> Clone for Controller<E> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            views: self.views.clone(),
        }
    }
}

/// 带 CSRF 令牌的表单，`token` 之外的字段交给实体自己的表单类型
#[derive(Debug, Deserialize)]
pub struct CsrfForm<F> {
    #[serde(default)]
    token: Option<String>,
    #[serde(flatten)]
    fields: F,
}

pub async fn show<E: Entity>(
    State(controller): State<Controller<E>>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>, AppError> {
    let token = CsrfGuard::token_for(&session).await?;
    let records = controller.repository.list().await?;

    let model = ViewModel::new(&token).with(E::LIST_VIEW.payload_key(), &records);
    controller.views.render(E::LIST_VIEW, model)
}

pub async fn show_create_form<E: Entity>(
    State(controller): State<Controller<E>>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>, AppError> {
    let token = CsrfGuard::token_for(&session).await?;
    let defaults = controller.repository.new_form_defaults().await?;

    let model = ViewModel::new(&token).with(E::CREATE_VIEW.payload_key(), &defaults);
    controller.views.render(E::CREATE_VIEW, model)
}

pub async fn store<E: Entity>(
    State(controller): State<Controller<E>>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    Form(form): Form<CsrfForm<E::Form>>,
) -> Result<Redirect, AppError> {
    // 表单字段优先，其次是请求头
    let candidate = form.token.as_deref().or_else(|| {
        headers
            .get(CSRF_HEADER_NAME)
            .and_then(|value| value.to_str().ok())
    });

    if !CsrfGuard::validate(&session, candidate).await? {
        return Err(AppError::CsrfValidationFailed);
    }

    let record = E::from_form(form.fields)?;
    controller.repository.insert(record).await?;
    // 307 会让浏览器以原方法重放表单，轮换令牌使重放的请求无法再次写入
    CsrfGuard::rotate(&session).await?;
    tracing::info!("Stored {} for session {}", E::NAME, session.id());

    Ok(Redirect::temporary(E::ROUTE))
}

pub fn entity_routes<E, S>() -> Router<S>
where
    E: Entity,
    S: Clone + Send + Sync + 'static,
    Controller<E>: FromRef<S>,
{
    Router::new()
        .route(E::ROUTE, get(show::<E>).post(store::<E>))
        .route(&format!("{}/create", E::ROUTE), get(show_create_form::<E>))
}
