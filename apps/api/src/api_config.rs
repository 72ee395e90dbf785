use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ipnet::IpNet;
use quotagate_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_DAILY_FREE_LIMIT: u64 = 100;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 250;
const DEFAULT_WATERMARK_TOOL_PATH: &str = "/opt/byewatermark/GeminiWatermarkTool";
const WATERMARK_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ProfileStoreConfig {
    pub url: String,
    pub service_key: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: Option<String>,
    pub redis_url: Option<String>,
    pub profile_store: Option<ProfileStoreConfig>,
    pub webhook_secret: Option<String>,
    pub watermark_tool_path: PathBuf,
    pub work_dir: PathBuf,
    pub trusted_proxies: Vec<IpNet>,
    pub daily_free_limit: u64,
    pub store_timeout: Duration,
    pub watermark_tool_timeout: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = match optional_env("API_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))?,
            None => 3001,
        };

        let profile_store = match (
            optional_env("PROFILE_STORE_URL"),
            optional_env("PROFILE_STORE_SERVICE_KEY"),
        ) {
            (Some(url), Some(service_key)) => Some(ProfileStoreConfig { url, service_key }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "PROFILE_STORE_URL and PROFILE_STORE_SERVICE_KEY must be set together"
                        .to_owned(),
                ));
            }
        };

        let trusted_proxies = parse_trusted_proxies(
            optional_env("TRUSTED_PROXY_CIDRS")
                .unwrap_or_default()
                .as_str(),
        )?;

        let daily_free_limit = parse_u64_env("DAILY_FREE_LIMIT", DEFAULT_DAILY_FREE_LIMIT)?;
        let store_timeout = Duration::from_millis(parse_u64_env(
            "STORE_TIMEOUT_MS",
            DEFAULT_STORE_TIMEOUT_MS,
        )?);

        Ok(Self {
            api_host,
            api_port,
            frontend_url: optional_env("FRONTEND_URL"),
            redis_url: optional_env("REDIS_URL"),
            profile_store,
            webhook_secret: optional_env("WEBHOOK_SECRET"),
            watermark_tool_path: optional_env("WATERMARK_TOOL_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_WATERMARK_TOOL_PATH), PathBuf::from),
            work_dir: optional_env("WORK_DIR").map_or_else(env::temp_dir, PathBuf::from),
            trusted_proxies,
            daily_free_limit,
            store_timeout,
            watermark_tool_timeout: WATERMARK_TOOL_TIMEOUT,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_u64_env(name: &str, default: u64) -> Result<u64, AppError> {
    match optional_env(name) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}

/// Parses a comma separated CIDR list. Bare addresses become host routes.
pub fn parse_trusted_proxies(value: &str) -> Result<Vec<IpNet>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            IpNet::from_str(entry)
                .or_else(|_| IpAddr::from_str(entry).map(IpNet::from))
                .map_err(|error| {
                    AppError::Validation(format!("invalid TRUSTED_PROXY_CIDRS entry '{entry}': {error}"))
                })
        })
        .collect()
}
