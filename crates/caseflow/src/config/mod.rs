use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};

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

/// Top-level configuration for the host process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub matching: MatchingConfig,
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
            matching: MatchingConfig::from_env()?,
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

/// Thresholds and limits applied by the assignment pipeline.
///
/// Scoring weights live as constants in `matching::scoring::weights`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    pub min_score: f64,
    pub top_n: usize,
    pub auto_assign_score: f64,
    pub reassignment_min_score: f64,
    pub reassignment_top_n: usize,
    pub max_reassignment_attempts: u32,
    /// Offset applied to "now" before comparing against lawyer office hours.
    pub office_hours_offset: FixedOffset,
}

const DEFAULT_OFFICE_HOURS_OFFSET_HOURS: i32 = -3;

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: 50.0,
            top_n: 1,
            auto_assign_score: 80.0,
            reassignment_min_score: 60.0,
            reassignment_top_n: 3,
            max_reassignment_attempts: 3,
            office_hours_offset: offset_from_hours(DEFAULT_OFFICE_HOURS_OFFSET_HOURS)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl MatchingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let offset_hours = env_or(
            "MATCH_OFFICE_HOURS_UTC_OFFSET",
            DEFAULT_OFFICE_HOURS_OFFSET_HOURS,
        )?;
        let office_hours_offset =
            offset_from_hours(offset_hours).ok_or(ConfigError::InvalidValue {
                key: "MATCH_OFFICE_HOURS_UTC_OFFSET",
            })?;

        let config = Self {
            min_score: env_or("MATCH_MIN_SCORE", defaults.min_score)?,
            top_n: env_or("MATCH_TOP_N", defaults.top_n)?,
            auto_assign_score: env_or("MATCH_AUTO_ASSIGN_SCORE", defaults.auto_assign_score)?,
            reassignment_min_score: env_or(
                "MATCH_REASSIGN_MIN_SCORE",
                defaults.reassignment_min_score,
            )?,
            reassignment_top_n: env_or("MATCH_REASSIGN_TOP_N", defaults.reassignment_top_n)?,
            max_reassignment_attempts: env_or(
                "MATCH_MAX_REASSIGNMENTS",
                defaults.max_reassignment_attempts,
            )?,
            office_hours_offset,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, score) in [
            ("MATCH_MIN_SCORE", self.min_score),
            ("MATCH_AUTO_ASSIGN_SCORE", self.auto_assign_score),
            ("MATCH_REASSIGN_MIN_SCORE", self.reassignment_min_score),
        ] {
            if !(0.0..=100.0).contains(&score) {
                return Err(ConfigError::InvalidValue { key });
            }
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidValue { key: "MATCH_TOP_N" });
        }
        if self.reassignment_top_n == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MATCH_REASSIGN_TOP_N",
            });
        }
        Ok(())
    }
}

fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours.checked_mul(3600)?)
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key } => write!(f, "{key} has an invalid value"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
