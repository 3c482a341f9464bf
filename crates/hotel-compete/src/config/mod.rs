use crate::analysis::EngineConfig;
use crate::datasets::DatasetSources;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub datasets: DatasetConfig,
    pub engine: EngineConfig,
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

        let datasets = DatasetConfig {
            internal_rates: env_path("COMPETE_INTERNAL_CSV"),
            external_offers: env_path("COMPETE_EXTERNAL_CSV"),
            channel_config: env_path("COMPETE_CHANNEL_CSV"),
        };

        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            price_elasticity: env_f64("COMPETE_PRICE_ELASTICITY", defaults.price_elasticity)?,
            similarity_threshold_pct: env_f64(
                "COMPETE_SIMILARITY_THRESHOLD_PCT",
                defaults.similarity_threshold_pct,
            )?,
            anomaly_z_threshold: env_f64(
                "COMPETE_ANOMALY_Z_THRESHOLD",
                defaults.anomaly_z_threshold,
            )?,
        };

        // A price cut must never cost competitive positions.
        if engine.price_elasticity > 0.0 {
            return Err(ConfigError::InvalidNumber {
                key: "COMPETE_PRICE_ELASTICITY",
                value: engine.price_elasticity.to_string(),
            });
        }
        if engine.similarity_threshold_pct < 0.0 {
            return Err(ConfigError::InvalidNumber {
                key: "COMPETE_SIMILARITY_THRESHOLD_PCT",
                value: engine.similarity_threshold_pct.to_string(),
            });
        }
        if engine.anomaly_z_threshold <= 0.0 {
            return Err(ConfigError::InvalidNumber {
                key: "COMPETE_ANOMALY_Z_THRESHOLD",
                value: engine.anomaly_z_threshold.to_string(),
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            datasets,
            engine,
        })
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn env_f64(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or(ConfigError::InvalidNumber { key, value: raw }),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Dataset locations to preload at startup. All three must be present to preload.
#[derive(Debug, Clone, Default)]
pub struct DatasetConfig {
    pub internal_rates: Option<PathBuf>,
    pub external_offers: Option<PathBuf>,
    pub channel_config: Option<PathBuf>,
}

impl DatasetConfig {
    pub fn sources(&self) -> Option<DatasetSources> {
        match (
            &self.internal_rates,
            &self.external_offers,
            &self.channel_config,
        ) {
            (Some(internal), Some(external), Some(channel)) => Some(DatasetSources {
                internal_rates: internal.clone(),
                external_offers: external.clone(),
                channel_config: channel.clone(),
            }),
            _ => None,
        }
    }

    /// Like [`DatasetConfig::sources`], naming the first missing variable on failure.
    pub fn require_sources(&self) -> Result<DatasetSources, ConfigError> {
        let require = |path: &Option<PathBuf>, key: &'static str| {
            path.clone().ok_or(ConfigError::MissingDatasetPath { key })
        };
        Ok(DatasetSources {
            internal_rates: require(&self.internal_rates, "COMPETE_INTERNAL_CSV")?,
            external_offers: require(&self.external_offers, "COMPETE_EXTERNAL_CSV")?,
            channel_config: require(&self.channel_config, "COMPETE_CHANNEL_CSV")?,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    MissingDatasetPath { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has an unusable value '{value}'")
            }
            ConfigError::MissingDatasetPath { key } => {
                write!(f, "no dataset path given; pass it as a flag or set {key}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::MissingDatasetPath { .. } => None,
        }
    }
}
