pub mod benefic;

use axum::response::Redirect;

// 首页跳转到受益人列表
pub async fn index() -> Redirect {
    Redirect::temporary("/benefic")
}

pub async fn health() -> &'static str {
    "ok"
}
