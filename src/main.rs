use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use benefic_admin::{
    AppState, build_router,
    config::Config,
    routes::benefic::PgBeneficRepository,
    session::{
        MemorySessionStore, RedisSessionStore, SessionCookieConfig, SessionResolver,
        SessionStore,
    },
    view::ViewRenderer,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'benefic_admin';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 选择会话存储：配置了 Redis 则共享会话，否则使用进程内存储
    let store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).expect("Failed to create Redis client");
            tracing::info!("Using Redis session store");
            Arc::new(RedisSessionStore::new(Arc::new(client), config.session_ttl()))
        }
        None => {
            tracing::info!(
                "Using in-memory session store with {} shards",
                config.session_shards
            );
            Arc::new(MemorySessionStore::new(
                config.session_shards,
                config.session_ttl(),
            ))
        }
    };

    let sessions = SessionResolver::new(
        store,
        SessionCookieConfig {
            name: config.session_cookie_name.clone(),
            secure: config.session_cookie_secure,
        },
    );

    let views = ViewRenderer::new().expect("Failed to compile templates");

    // 设置应用状态
    let state = AppState {
        sessions: Arc::new(sessions),
        views: Arc::new(views),
        benefics: Arc::new(PgBeneficRepository::new(pool)),
    };

    let app = build_router(state);

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
