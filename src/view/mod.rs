//! HTML 视图渲染。
//!
//! 所有模板在编译期嵌入，并在 [`ViewRenderer::new`] 中逐一编译校验；
//! 处理器只能通过封闭的 [`View`] 枚举选择模板。

use std::collections::BTreeMap;

use axum::response::Html;
use minijinja::{Environment, UndefinedBehavior, Value};
use serde::Serialize;

use crate::{csrf::CsrfToken, error::AppError};

/// 视图模型中存放 CSRF 令牌的保留键
pub const TOKEN_KEY: &str = "token";

const LAYOUT: (&str, &str) = ("layout.html", include_str!("../../templates/layout.html"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    BeneficList,
    BeneficCreate,
}

impl View {
    pub const ALL: [View; 2] = [View::BeneficList, View::BeneficCreate];

    pub fn template_name(self) -> &'static str {
        match self {
            View::BeneficList => "benefic/list.html",
            View::BeneficCreate => "benefic/create.html",
        }
    }

    /// 页面数据在视图模型中的键名
    pub fn payload_key(self) -> &'static str {
        match self {
            View::BeneficList => "benefics",
            View::BeneficCreate => "benefic",
        }
    }

    fn source(self) -> &'static str {
        match self {
            View::BeneficList => include_str!("../../templates/benefic/list.html"),
            View::BeneficCreate => include_str!("../../templates/benefic/create.html"),
        }
    }
}

/// 单次请求的模板变量
#[derive(Debug, Clone)]
pub struct ViewModel {
    vars: BTreeMap<&'static str, Value>,
}

impl ViewModel {
    pub fn new(token: &CsrfToken) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(TOKEN_KEY, Value::from(token.as_str()));
        Self { vars }
    }

    pub fn with<T: Serialize>(mut self, key: &'static str, value: &T) -> Self {
        debug_assert_ne!(key, TOKEN_KEY, "`token` is reserved for the CSRF token");
        self.vars.insert(key, Value::from_serialize(value));
        self
    }
}

pub struct ViewRenderer {
    env: Environment<'static>,
}

impl ViewRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template(LAYOUT.0, LAYOUT.1)?;
        for view in View::ALL {
            env.add_template(view.template_name(), view.source())?;
        }

        // 启动时确认每个视图都能解析到模板
        for view in View::ALL {
            env.get_template(view.template_name())?;
        }
        tracing::debug!("Registered {} views", View::ALL.len());

        Ok(Self { env })
    }

    pub fn render(&self, view: View, model: ViewModel) -> Result<Html<String>, AppError> {
        let to_render_error = |source| AppError::Render {
            view: view.template_name(),
            source,
        };

        let template = self
            .env
            .get_template(view.template_name())
            .map_err(to_render_error)?;
        let body = template.render(&model.vars).map_err(to_render_error)?;

        Ok(Html(body))
    }
}
