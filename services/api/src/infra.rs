use clap::Args;
use hotel_compete::analysis::CompetitivenessEngine;
use hotel_compete::config::{AppConfig, DatasetConfig};
use hotel_compete::datasets::DatasetSources;
use hotel_compete::error::AppError;
use hotel_compete::session::EngineHandle;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engines: Arc<EngineHandle>,
}

impl AppState {
    /// Current engine, or `NotLoaded` until the first successful load.
    pub(crate) fn engine(&self) -> Result<Arc<CompetitivenessEngine>, AppError> {
        self.engines.snapshot().ok_or(AppError::NotLoaded)
    }
}

/// Dataset locations shared by every CLI command. Flags override the environment.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct DatasetArgs {
    /// Internal contracted rate export (CSV)
    #[arg(long = "internal", value_name = "PATH")]
    pub(crate) internal_rates: Option<PathBuf>,
    /// External competitor offer export (CSV)
    #[arg(long = "external", value_name = "PATH")]
    pub(crate) external_offers: Option<PathBuf>,
    /// Channel configuration export (CSV)
    #[arg(long = "channel", value_name = "PATH")]
    pub(crate) channel_config: Option<PathBuf>,
}

impl DatasetArgs {
    pub(crate) fn merged_with(self, configured: &DatasetConfig) -> DatasetConfig {
        DatasetConfig {
            internal_rates: self
                .internal_rates
                .or_else(|| configured.internal_rates.clone()),
            external_offers: self
                .external_offers
                .or_else(|| configured.external_offers.clone()),
            channel_config: self
                .channel_config
                .or_else(|| configured.channel_config.clone()),
        }
    }

    pub(crate) fn resolve(self, config: &AppConfig) -> Result<DatasetSources, AppError> {
        Ok(self.merged_with(&config.datasets).require_sources()?)
    }
}

/// Loads the dataset triple for a one-shot CLI command.
pub(crate) fn load_engine(
    config: &AppConfig,
    datasets: DatasetArgs,
) -> Result<Arc<CompetitivenessEngine>, AppError> {
    let sources = datasets.resolve(config)?;
    let handle = EngineHandle::new(config.engine);
    Ok(handle.load(&sources)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_configured_paths() {
        let configured = DatasetConfig {
            internal_rates: Some(PathBuf::from("env/internal.csv")),
            external_offers: Some(PathBuf::from("env/external.csv")),
            channel_config: None,
        };
        let args = DatasetArgs {
            internal_rates: Some(PathBuf::from("cli/internal.csv")),
            external_offers: None,
            channel_config: Some(PathBuf::from("cli/channel.csv")),
        };

        let sources = args
            .merged_with(&configured)
            .require_sources()
            .expect("all paths resolved");
        assert_eq!(sources.internal_rates, PathBuf::from("cli/internal.csv"));
        assert_eq!(sources.external_offers, PathBuf::from("env/external.csv"));
        assert_eq!(sources.channel_config, PathBuf::from("cli/channel.csv"));
    }

    #[test]
    fn missing_paths_are_reported() {
        let merged = DatasetArgs::default().merged_with(&DatasetConfig::default());
        assert!(merged.require_sources().is_err());
    }
}
