use std::sync::Arc;

use repository::Repository;
use routes::benefic::Benefic;
use session::SessionResolver;
use view::ViewRenderer;

pub mod config;
pub mod controller;
pub mod csrf;
pub mod error;
pub mod middleware;
pub mod repository;
pub mod router;
pub mod routes;
pub mod session;
pub mod view;

pub use router::build_router;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionResolver>,
    pub views: Arc<ViewRenderer>,
    pub benefics: Arc<dyn Repository<Benefic>>,
}
