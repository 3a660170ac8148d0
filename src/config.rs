use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Deployment mode. Development exposes internal error details in responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Close the double-approval gap: atomic check-and-insert and a locked approval.
    pub slot_guard: bool,
    pub notify_webhook_url: Option<String>,
    /// Upper bound for one webhook delivery.
    pub notify_timeout: Duration,
    pub log_dir: Option<PathBuf>,
    pub max_connections: u32,
}

impl Config {
    /// ✅ Defaults for everything but the signing secret
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            environment: Environment::Production,
            slot_guard: false,
            notify_webhook_url: None,
            notify_timeout: Duration::from_secs(10),
            log_dir: None,
            max_connections: 10,
        }
    }

    /// ✅ Load environment variables and set defaults
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let mut config = Self::with_secret(jwt_secret);

        config.database_url = non_empty_var("DATABASE_URL");

        if let Some(addr) = non_empty_var("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("BIND_ADDR is not a socket address: {addr}"))?;
        }

        config.environment = match non_empty_var("APP_ENV").as_deref() {
            Some("development") | Some("dev") => Environment::Development,
            _ => Environment::Production,
        };

        config.slot_guard = flag_var("SLOT_GUARD");
        config.notify_webhook_url = non_empty_var("NOTIFY_WEBHOOK_URL");
        config.log_dir = non_empty_var("LOG_DIR").map(PathBuf::from);

        if let Some(secs) = non_empty_var("NOTIFY_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("NOTIFY_TIMEOUT_SECS is not a number: {secs}"))?;
            config.notify_timeout = Duration::from_secs(secs);
        }

        if let Some(max) = non_empty_var("DB_MAX_CONNECTIONS") {
            config.max_connections = max
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {max}"))?;
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn flag_var(key: &str) -> bool {
    matches!(
        non_empty_var(key).as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("true") | Some("1") | Some("yes")
    )
}
