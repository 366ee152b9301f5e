use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_MODEL_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

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
    pub access: AccessConfig,
    pub model: ModelConfig,
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
            access: AccessConfig {
                api_key: non_empty_var("APP_API_KEY"),
            },
            model: ModelConfig::from_env()?,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(key) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw,
        }),
        None => Ok(default),
    }
}

/// A zero timeout would elapse before any model call could complete.
fn model_timeout() -> Result<Duration, ConfigError> {
    match parsed_var::<u64>("GEMINI_TIMEOUT_SECS", 10)? {
        0 => Err(ConfigError::InvalidValue {
            key: "GEMINI_TIMEOUT_SECS",
            value: "0".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
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

/// Bearer credential guarding the discount API.
#[derive(Clone, Default)]
pub struct AccessConfig {
    pub api_key: Option<String>,
}

impl AccessConfig {
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingSecret("APP_API_KEY"))
    }
}

impl fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Connection and generation settings for the hosted text model.
#[derive(Clone)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl ModelConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: non_empty_var("GOOGLE_API_KEY"),
            model: non_empty_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            endpoint: non_empty_var("GEMINI_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_MODEL_ENDPOINT.to_string()),
            temperature: parsed_var("GEMINI_TEMPERATURE", 0.1)?,
            max_output_tokens: parsed_var("GEMINI_MAX_OUTPUT_TOKENS", 150)?,
            timeout: model_timeout()?,
        })
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingSecret("GOOGLE_API_KEY"))
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            temperature: 0.1,
            max_output_tokens: 150,
            timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str, value: String },
    MissingSecret(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
            ConfigError::MissingSecret(key) => write!(f, "{key} must be set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::MissingSecret(_) => None,
        }
    }
}
