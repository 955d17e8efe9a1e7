use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

/// Placeholder secret used when `TERRA_JWT_SECRET` is unset. Refused in production.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    /// Allowed CORS origins; the first one is the front end advertised in dev.
    pub client_urls: Vec<String>,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    /// Behind a reverse proxy: rate-limit on its `X-Forwarded-For` hop.
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = Environment::parse(&get("TERRA_ENV", "development"));

        let jwt_secret = get("TERRA_JWT_SECRET", DEV_JWT_SECRET);
        if environment.is_production()
            && (jwt_secret.trim().is_empty() || jwt_secret == DEV_JWT_SECRET)
        {
            bail!("TERRA_JWT_SECRET must be set to a real secret in production");
        }

        let client_urls = get(
            "TERRA_CLIENT_URL",
            "http://localhost:5173,http://127.0.0.1:5173",
        )
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();

        let port = get("TERRA_PORT", "5000")
            .parse()
            .context("TERRA_PORT must be a port number")?;
        let rate_limit_max = get("TERRA_RATE_LIMIT_MAX", "100")
            .parse()
            .context("TERRA_RATE_LIMIT_MAX must be a positive integer")?;
        let window_secs: u64 = get("TERRA_RATE_LIMIT_WINDOW_SECS", "900")
            .parse()
            .context("TERRA_RATE_LIMIT_WINDOW_SECS must be a number of seconds")?;

        Ok(Self {
            environment,
            db_path: PathBuf::from(get("TERRA_DB_PATH", "terra.db")),
            jwt_secret,
            client_urls,
            host: get("TERRA_HOST", "0.0.0.0"),
            port,
            static_dir: PathBuf::from(get("TERRA_STATIC_DIR", "client/dist")),
            rate_limit_max,
            rate_limit_window: Duration::from_secs(window_secs),
            trust_proxy: parse_flag(&get("TERRA_TRUST_PROXY", "false")),
        })
    }

    pub fn frontend_url(&self) -> &str {
        self.client_urls
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost:5173")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
