use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_MAX_UPLOAD_MB: u64 = 5;
const BYTES_PER_MB: u64 = 1024 * 1024;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub intake: IntakeConfig,
    pub sharing: SharingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let max_upload_bytes = match env::var("MAX_UPLOAD_SIZE_MB") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|mb| *mb > 0)
                .and_then(|mb| mb.checked_mul(BYTES_PER_MB))
                .ok_or(ConfigError::InvalidUploadLimit(raw))?,
            Err(_) => DEFAULT_MAX_UPLOAD_MB * BYTES_PER_MB,
        };

        let default_country = env::var("DEFAULT_COUNTRY")
            .map(|code| code.trim().to_string())
            .ok()
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| "GLOBAL".to_string());

        let public_base_url = env::var("APP_PUBLIC_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let email_from = env::var("EMAIL_FROM")
            .ok()
            .filter(|sender| !sender.trim().is_empty());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            intake: IntakeConfig {
                max_upload_bytes,
                default_country,
            },
            sharing: SharingConfig {
                public_base_url,
                email_from,
            },
        })
    }

    /// Base URL used when building shareable report links.
    pub fn public_base_url(&self) -> String {
        match &self.sharing.public_base_url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.server.host, self.server.port),
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Limits and defaults applied to uploaded invoice data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    pub max_upload_bytes: u64,
    pub default_country: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * BYTES_PER_MB,
            default_country: "GLOBAL".to_string(),
        }
    }
}

/// Shareable link and notification settings.
#[derive(Debug, Clone, Default)]
pub struct SharingConfig {
    pub public_base_url: Option<String>,
    pub email_from: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUploadLimit(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUploadLimit(value) => write!(
                f,
                "MAX_UPLOAD_SIZE_MB must be a positive integer (got '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidUploadLimit(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
