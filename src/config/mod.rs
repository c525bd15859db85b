use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub session_ttl_secs: u64,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,
    pub session_shards: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            // 未配置 Redis 时使用进程内会话存储
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".into()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(3000),
            session_ttl_secs: hours_to_secs(&env::var("SESSION_TTL").unwrap_or_default(), 24),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "session_id".into()),
            session_cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            session_shards: env::var("SESSION_SHARDS")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(16),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

// "24h" 或 "24" 形式的小时数，无法解析时使用默认值
fn hours_to_secs(raw: &str, default_hours: u64) -> u64 {
    raw.trim_end_matches('h')
        .parse::<u64>()
        .unwrap_or(default_hours)
        .saturating_mul(3600)
}
