use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_BILLPLZ_URL: &str = "https://www.billplz.com";
const DEFAULT_BILLPLZ_SANDBOX_URL: &str = "https://www.billplz-sandbox.com";
const DEFAULT_TOYYIBPAY_URL: &str = "https://toyyibpay.com";
const DEFAULT_TOYYIBPAY_SANDBOX_URL: &str = "https://dev.toyyibpay.com";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;

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
    pub payments: PaymentsConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            payments: PaymentsConfig::from_env()?,
        })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Base URLs and client limits for the payment gateways.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentsConfig {
    pub billplz_url: String,
    pub billplz_sandbox_url: String,
    pub toyyibpay_url: String,
    pub toyyibpay_sandbox_url: String,
    pub request_timeout: Duration,
}

impl PaymentsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout_secs = match env::var("APP_GATEWAY_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidGatewayTimeout { value: raw })?,
            Err(_) => DEFAULT_GATEWAY_TIMEOUT_SECS,
        };

        Ok(Self {
            billplz_url: env::var("APP_BILLPLZ_URL").unwrap_or(defaults.billplz_url),
            billplz_sandbox_url: env::var("APP_BILLPLZ_SANDBOX_URL")
                .unwrap_or(defaults.billplz_sandbox_url),
            toyyibpay_url: env::var("APP_TOYYIBPAY_URL").unwrap_or(defaults.toyyibpay_url),
            toyyibpay_sandbox_url: env::var("APP_TOYYIBPAY_SANDBOX_URL")
                .unwrap_or(defaults.toyyibpay_sandbox_url),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Point every gateway, sandbox or not, at a single base URL.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            billplz_url: base.clone(),
            billplz_sandbox_url: base.clone(),
            toyyibpay_url: base.clone(),
            toyyibpay_sandbox_url: base,
            request_timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS),
        }
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            billplz_url: DEFAULT_BILLPLZ_URL.to_string(),
            billplz_sandbox_url: DEFAULT_BILLPLZ_SANDBOX_URL.to_string(),
            toyyibpay_url: DEFAULT_TOYYIBPAY_URL.to_string(),
            toyyibpay_sandbox_url: DEFAULT_TOYYIBPAY_SANDBOX_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidGatewayTimeout { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must be a valid IP address or 'localhost'")
            }
            ConfigError::InvalidGatewayTimeout { value } => write!(
                f,
                "APP_GATEWAY_TIMEOUT_SECS must be a positive number of seconds (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort | ConfigError::InvalidGatewayTimeout { .. } => None,
        }
    }
}
