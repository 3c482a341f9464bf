//! Dataset ingestion: reads the internal rate, external offer, and channel configuration
//! exports and builds a normalized [`TabularStore`].

pub mod domain;
mod normalizer;
mod parser;
mod store;

pub use domain::{
    ChannelConfig, Dataset, DerivedPricing, ExternalOffer, InternalRate, OfferObservation,
};
pub use store::TabularStore;

use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub enum DatasetLoadError {
    Io {
        dataset: Dataset,
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        dataset: Dataset,
        source: csv::Error,
    },
    MissingColumn {
        dataset: Dataset,
        column: &'static str,
    },
    InvalidValue {
        dataset: Dataset,
        line: usize,
        column: &'static str,
        value: String,
    },
}

impl std::fmt::Display for DatasetLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetLoadError::Io {
                dataset,
                path,
                source,
            } => write!(
                f,
                "failed to read {} from {}: {}",
                dataset.label(),
                path.display(),
                source
            ),
            DatasetLoadError::Csv { dataset, source } => {
                write!(f, "invalid {} CSV data: {}", dataset.label(), source)
            }
            DatasetLoadError::MissingColumn { dataset, column } => {
                write!(f, "{} export is missing column '{}'", dataset.label(), column)
            }
            DatasetLoadError::InvalidValue {
                dataset,
                line,
                column,
                value,
            } => write!(
                f,
                "{} line {}: cannot read '{}' in column '{}'",
                dataset.label(),
                line,
                value,
                column
            ),
        }
    }
}

impl std::error::Error for DatasetLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetLoadError::Io { source, .. } => Some(source),
            DatasetLoadError::Csv { source, .. } => Some(source),
            DatasetLoadError::MissingColumn { .. } | DatasetLoadError::InvalidValue { .. } => None,
        }
    }
}

/// Locations of the three exports making up one dataset triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSources {
    pub internal_rates: PathBuf,
    pub external_offers: PathBuf,
    pub channel_config: PathBuf,
}

pub struct DatasetLoader;

impl DatasetLoader {
    pub fn from_paths(sources: &DatasetSources) -> Result<TabularStore, DatasetLoadError> {
        let internal = open(Dataset::InternalRates, &sources.internal_rates)?;
        let external = open(Dataset::ExternalOffers, &sources.external_offers)?;
        let channel = open(Dataset::ChannelConfig, &sources.channel_config)?;
        Self::from_readers(internal, external, channel)
    }

    /// Parses all three tables before building the store, so a failure in any of them
    /// produces no store at all.
    pub fn from_readers<I: Read, E: Read, C: Read>(
        internal_rates: I,
        external_offers: E,
        channel_config: C,
    ) -> Result<TabularStore, DatasetLoadError> {
        let rates = parser::parse_internal_rates(internal_rates)?;
        let observations = parser::parse_external_offers(external_offers)?;
        let configs = parser::parse_channel_configs(channel_config)?;

        info!(
            internal_rates = rates.len(),
            external_offers = observations.len(),
            channel_configs = configs.len(),
            "datasets parsed"
        );

        Ok(TabularStore::new(rates, observations, configs))
    }
}

fn open(dataset: Dataset, path: &Path) -> Result<std::fs::File, DatasetLoadError> {
    std::fs::File::open(path).map_err(|source| DatasetLoadError::Io {
        dataset,
        path: path.to_path_buf(),
        source,
    })
}
