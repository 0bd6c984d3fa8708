use crate::workflows::attendance::{Blacklist, RunContext, DEFAULT_ASSUMED_YEAR};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub attendance: AttendanceConfig,
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

        let assumed_year = match env::var("ATTENDANCE_ASSUMED_YEAR") {
            Ok(raw) => parse_assumed_year(&raw)?,
            Err(_) => DEFAULT_ASSUMED_YEAR,
        };
        let extra_blacklist = env::var("ATTENDANCE_EXTRA_BLACKLIST")
            .map(|raw| split_word_list(&raw))
            .unwrap_or_default();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            attendance: AttendanceConfig {
                assumed_year,
                extra_blacklist,
            },
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Defaults applied to every tally run.
#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    pub assumed_year: i32,
    pub extra_blacklist: Vec<String>,
}

impl AttendanceConfig {
    pub fn run_context(&self) -> RunContext {
        RunContext::new(self.assumed_year)
            .with_blacklist(Blacklist::standard().with_extra(&self.extra_blacklist))
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            assumed_year: DEFAULT_ASSUMED_YEAR,
            extra_blacklist: Vec::new(),
        }
    }
}

/// Accepts calendar years 1 through 9999.
pub fn validate_assumed_year(year: i32) -> Result<i32, ConfigError> {
    if (1..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(ConfigError::InvalidAssumedYear {
            value: year.to_string(),
        })
    }
}

pub fn parse_assumed_year(raw: &str) -> Result<i32, ConfigError> {
    let year = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| ConfigError::InvalidAssumedYear {
            value: raw.to_string(),
        })?;
    validate_assumed_year(year)
}

fn split_word_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAssumedYear { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAssumedYear { value } => write!(
                f,
                "assumed year '{}' must be a calendar year between 1 and 9999",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidAssumedYear { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
