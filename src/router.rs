use axum::{Router, middleware, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    middleware::log_errors,
    routes,
    session::resolve_session,
};

// 需要会话的页面路由
fn page_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(routes::benefic::routes())
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            resolve_session,
        ))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(page_routes(&state))
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(log_errors)),
        )
        .with_state(state)
}
