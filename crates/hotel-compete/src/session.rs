use crate::analysis::{CompetitivenessEngine, EngineConfig};
use crate::datasets::{DatasetLoadError, DatasetLoader, DatasetSources, TabularStore};
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Shared owner of the currently loaded engine.
///
/// Loads parse outside the lock and swap the engine in one write, so readers see either the
/// previous triple or the new one. A failed load leaves the previous engine installed.
#[derive(Debug, Default)]
pub struct EngineHandle {
    current: RwLock<Option<Arc<CompetitivenessEngine>>>,
    config: EngineConfig,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            current: RwLock::new(None),
            config,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn load(
        &self,
        sources: &DatasetSources,
    ) -> Result<Arc<CompetitivenessEngine>, DatasetLoadError> {
        let loaded = DatasetLoader::from_paths(sources);
        self.finish_load(loaded)
    }

    pub fn load_from_readers<I: Read, E: Read, C: Read>(
        &self,
        internal_rates: I,
        external_offers: E,
        channel_config: C,
    ) -> Result<Arc<CompetitivenessEngine>, DatasetLoadError> {
        let loaded = DatasetLoader::from_readers(internal_rates, external_offers, channel_config);
        self.finish_load(loaded)
    }

    pub fn install(&self, store: TabularStore) -> Arc<CompetitivenessEngine> {
        let engine = Arc::new(CompetitivenessEngine::new(store, self.config));
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::clone(&engine));
        engine
    }

    /// Engine for the triple loaded most recently, if any.
    pub fn snapshot(&self) -> Option<Arc<CompetitivenessEngine>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    fn finish_load(
        &self,
        loaded: Result<TabularStore, DatasetLoadError>,
    ) -> Result<Arc<CompetitivenessEngine>, DatasetLoadError> {
        match loaded {
            Ok(store) => {
                let hotels = store.hotels().len();
                let engine = self.install(store);
                info!(hotels, "datasets installed");
                Ok(engine)
            }
            Err(error) => {
                warn!(%error, "dataset load rejected; keeping previous datasets");
                Err(error)
            }
        }
    }
}
