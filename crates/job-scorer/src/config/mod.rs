use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::job::SchemaPolicy;
use crate::workflows::scoring::ScoringPolicy;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

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
    pub model: ModelConfig,
    pub scoring: ScoringPolicy,
    pub schema_policy: SchemaPolicy,
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

        let api_key = first_var(&["ANTHROPIC_API_KEY", "AI_INTEGRATIONS_ANTHROPIC_API_KEY"]);
        let base_url = first_var(&["ANTHROPIC_BASE_URL", "AI_INTEGRATIONS_ANTHROPIC_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = env::var("SCORER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = parse_var("SCORER_MAX_TOKENS", 1024u32)?;

        let defaults = ScoringPolicy::default();
        let max_attempts = parse_var("SCORER_MAX_ATTEMPTS", defaults.max_attempts)?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidNumber {
                name: "SCORER_MAX_ATTEMPTS",
            });
        }
        let timeout_secs = parse_var(
            "SCORER_ATTEMPT_TIMEOUT_SECS",
            defaults.attempt_timeout.as_secs(),
        )?;
        let backoff_ms = parse_var(
            "SCORER_RETRY_BACKOFF_MS",
            defaults.retry_backoff.as_millis() as u64,
        )?;

        let schema_policy = match env::var("SCORER_SCHEMA_POLICY") {
            Ok(raw) => SchemaPolicy::parse(&raw).ok_or(ConfigError::InvalidSchemaPolicy)?,
            Err(_) => SchemaPolicy::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            model: ModelConfig {
                api_key,
                base_url,
                model,
                max_tokens,
            },
            scoring: ScoringPolicy {
                max_attempts,
                attempt_timeout: Duration::from_secs(timeout_secs),
                retry_backoff: Duration::from_millis(backoff_ms),
            },
            schema_policy,
        })
    }
}

/// First of `names` that is set to a non-blank value.
fn first_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        env::var(name)
            .ok()
            .filter(|value| !value.trim().is_empty())
    })
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name }),
        Err(_) => Ok(default),
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

/// Connection settings for the scoring model.
#[derive(Clone)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl ModelConfig {
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str },
    InvalidSchemaPolicy,
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name } => {
                write!(f, "{name} must be a positive integer")
            }
            ConfigError::InvalidSchemaPolicy => {
                write!(f, "SCORER_SCHEMA_POLICY must be 'fail' or 'skip'")
            }
            ConfigError::MissingApiKey => write!(
                f,
                "ANTHROPIC_API_KEY (or AI_INTEGRATIONS_ANTHROPIC_API_KEY) must be set"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidSchemaPolicy
            | ConfigError::MissingApiKey => None,
        }
    }
}
