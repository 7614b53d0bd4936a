use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MPESA_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const DEFAULT_MPESA_SHORTCODE: &str = "174379";
const DEFAULT_MAIL_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

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
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub mpesa: MpesaConfig,
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
        let data_file = non_empty_var("APP_DATA_FILE").map(PathBuf::from);

        let timeout_secs = env::var("OUTBOUND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;
        let outbound_timeout = Duration::from_secs(timeout_secs.max(1));

        let mail = MailConfig {
            api_url: non_empty_var("MAIL_API_URL")
                .unwrap_or_else(|| DEFAULT_MAIL_API_URL.to_string()),
            api_key: non_empty_var("MAIL_API_KEY"),
            sender: non_empty_var("MAIL_SENDER")
                .unwrap_or_else(|| "no-reply@waterconnect.local".to_string()),
            timeout: outbound_timeout,
        };

        let mpesa = MpesaConfig {
            base_url: non_empty_var("MPESA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MPESA_BASE_URL.to_string()),
            consumer_key: non_empty_var("MPESA_CONSUMER_KEY"),
            consumer_secret: non_empty_var("MPESA_CONSUMER_SECRET"),
            shortcode: non_empty_var("MPESA_SHORTCODE")
                .unwrap_or_else(|| DEFAULT_MPESA_SHORTCODE.to_string()),
            passkey: non_empty_var("MPESA_PASSKEY"),
            callback_url: non_empty_var("MPESA_CALLBACK_URL"),
            timeout: outbound_timeout,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            storage: StorageConfig { data_file },
            mail,
            mpesa,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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

/// Where the entity store keeps its snapshot. `None` keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub data_file: Option<PathBuf>,
}

/// Transactional email API used for staff notifications.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub sender: String,
    pub timeout: Duration,
}

/// Daraja (M-Pesa) credentials for STK push requests.
#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub base_url: String,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub shortcode: String,
    pub passkey: Option<String>,
    pub callback_url: Option<String>,
    pub timeout: Duration,
}

impl MpesaConfig {
    /// Credentials are usable only when every secret and the callback are present.
    pub fn credentials(&self) -> Option<MpesaCredentials> {
        Some(MpesaCredentials {
            consumer_key: self.consumer_key.clone()?,
            consumer_secret: self.consumer_secret.clone()?,
            passkey: self.passkey.clone()?,
            callback_url: self.callback_url.clone()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpesaCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub passkey: String,
    pub callback_url: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidTimeout,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidTimeout => {
                write!(f, "OUTBOUND_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidTimeout => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
