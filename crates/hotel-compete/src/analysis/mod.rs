//! Competitiveness analysis over a loaded [`TabularStore`].
//!
//! Every query is read-only and recomputed on demand; the engine holds no state besides the
//! store and its tuning constants.

pub mod anomalies;
pub mod configuration;
pub mod cross_market;
pub mod opportunities;
pub mod patterns;
pub mod recommendations;
pub mod scoring;
pub mod simulation;
pub mod summary;
mod stats;

pub use anomalies::PriceAnomaly;
pub use configuration::{
    ConfigurationAssessment, ConfigurationChecks, ConfigurationDashboard, ConfigurationStatus,
    CriticalIssue,
};
pub use cross_market::{CrossMarketAnalysis, MarketMatch};
pub use opportunities::{MarketOpportunity, OpportunityType};
pub use patterns::{MarketPosition, MarketPriceComparison, PricePatterns};
pub use recommendations::{PricingRecommendations, Recommendation, RecommendationLevel};
pub use scoring::ScoreBreakdown;
pub use simulation::{PriceChangeSimulation, SimulationOutcome};
pub use summary::{HotelSummary, OfferMetrics};

use crate::datasets::TabularStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const PRICE_ELASTICITY: f64 = -2.0;
pub const SIMILARITY_THRESHOLD_PCT: f64 = 15.0;
pub const DEFAULT_ANOMALY_Z_THRESHOLD: f64 = 2.0;

/// Tunable constants of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub price_elasticity: f64,
    pub similarity_threshold_pct: f64,
    pub anomaly_z_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_elasticity: PRICE_ELASTICITY,
            similarity_threshold_pct: SIMILARITY_THRESHOLD_PCT,
            anomaly_z_threshold: DEFAULT_ANOMALY_Z_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Invalid arguments passed to an engine query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("anomaly threshold must be a positive finite number, got {0}")]
    InvalidThreshold(f64),
    #[error("price change must be a finite percentage of at least -100, got {0}")]
    InvalidPercentage(f64),
    #[error("observed price must be a positive finite number, got {0}")]
    InvalidObservedPrice(f64),
    #[error("simulation queries need a signed percentage such as -10%, got '{0}'")]
    MissingPercentage(String),
}

/// Read-only query surface over one loaded dataset triple.
#[derive(Debug, Clone)]
pub struct CompetitivenessEngine {
    store: TabularStore,
    config: EngineConfig,
}

impl CompetitivenessEngine {
    pub fn new(store: TabularStore, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &TabularStore {
        &self.store
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn available_hotels(&self) -> Vec<String> {
        self.store.hotels()
    }

    pub fn hotel_summary(&self, hotel: &str) -> HotelSummary {
        debug!(hotel, "hotel summary requested");
        summary::summarize(&self.store, hotel)
    }

    pub fn configuration(&self, hotel: Option<&str>) -> BTreeMap<String, ConfigurationAssessment> {
        debug!(hotel = hotel.unwrap_or("*"), "configuration validation requested");
        configuration::validate(&self.store, hotel)
    }

    pub fn configuration_recommendations(&self, hotel: &str) -> Vec<Recommendation> {
        configuration::recommendations(&self.store, hotel)
    }

    pub fn configuration_dashboard(&self) -> ConfigurationDashboard {
        configuration::dashboard(&self.store)
    }

    pub fn score(&self, hotel: &str) -> f64 {
        scoring::score(&self.store, hotel)
    }

    pub fn score_breakdown(&self, hotel: &str) -> ScoreBreakdown {
        let breakdown = scoring::breakdown(&self.store, hotel);
        debug!(hotel, total = breakdown.total, "competitiveness scored");
        breakdown
    }

    pub fn opportunities(&self, hotel: &str) -> BTreeMap<String, MarketOpportunity> {
        opportunities::analyze(&self.store, hotel)
    }

    /// Falls back to the configured z threshold when none is given.
    pub fn anomalies(
        &self,
        hotel: &str,
        threshold: Option<f64>,
    ) -> Result<Vec<PriceAnomaly>, EngineError> {
        let threshold = threshold.unwrap_or(self.config.anomaly_z_threshold);
        let anomalies = anomalies::detect(&self.store, hotel, threshold)?;
        debug!(hotel, threshold, found = anomalies.len(), "anomaly scan finished");
        Ok(anomalies)
    }

    pub fn cross_market(
        &self,
        hotel: &str,
        observed_price: f64,
    ) -> Result<CrossMarketAnalysis, EngineError> {
        let analysis = cross_market::correlate(
            &self.store,
            hotel,
            observed_price,
            self.config.similarity_threshold_pct,
        )?;
        debug!(
            hotel,
            observed_price,
            matches = analysis.matches.len(),
            "cross-market correlation finished"
        );
        Ok(analysis)
    }

    pub fn simulate(&self, hotel: &str, change_pct: f64) -> Result<SimulationOutcome, EngineError> {
        debug!(hotel, change_pct, "price change simulation requested");
        simulation::simulate(&self.store, hotel, change_pct, self.config.price_elasticity)
    }

    pub fn pricing_recommendations(&self, hotel: &str) -> PricingRecommendations {
        let summary = self.hotel_summary(hotel);
        let opportunities = self.opportunities(hotel);
        recommendations::pricing(&summary, &opportunities)
    }

    pub fn price_patterns(&self, hotel: &str) -> PricePatterns {
        patterns::price_patterns(&self.store, hotel)
    }

    pub fn market_price_comparison(&self, hotel: &str) -> Vec<MarketPriceComparison> {
        patterns::market_price_comparison(&self.store, hotel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{ChannelConfig, InternalRate, OfferObservation};
    use chrono::NaiveDate;

    fn engine(config: EngineConfig) -> CompetitivenessEngine {
        let check_in = NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date");
        let observation = |own: f64, competitor: f64| OfferObservation {
            hotel: "Hotel Sol".to_string(),
            market: "AR".to_string(),
            check_in,
            check_out: check_in + chrono::Duration::days(2),
            stay_length: 2,
            adults: 2,
            children: 0,
            own_price: Some(own),
            competitor_price: Some(competitor),
            agency: "Agency One".to_string(),
        };
        let store = TabularStore::new(
            vec![InternalRate {
                hotel: "Hotel Sol".to_string(),
                market: "BR".to_string(),
                contracted_rate: 100.0,
                currency: "USD".to_string(),
                exp_base_rate: None,
                hbg_base_rate: None,
            }],
            vec![observation(200.0, 220.0), observation(200.0, 180.0)],
            vec![ChannelConfig {
                hotel: "Hotel Sol".to_string(),
                api_enabled: true,
                html_enabled: true,
                wrapper_enabled: true,
                prepayment_active: true,
                rate_type: "PACKAGE".to_string(),
                enabled_markets: vec!["AR".to_string()],
                availability: 0.95,
            }],
        );
        CompetitivenessEngine::new(store, config)
    }

    #[test]
    fn similarity_threshold_is_overridable() {
        let strict = EngineConfig {
            similarity_threshold_pct: 5.0,
            ..EngineConfig::default()
        };

        let default_result = engine(EngineConfig::default())
            .cross_market("Hotel Sol", 110.0)
            .expect("valid price");
        let strict_result = engine(strict)
            .cross_market("Hotel Sol", 110.0)
            .expect("valid price");

        assert!(default_result.match_found);
        assert!(!strict_result.match_found);
    }

    #[test]
    fn anomalies_default_to_configured_threshold() {
        let engine = engine(EngineConfig::default());
        assert!(engine
            .anomalies("Hotel Sol", None)
            .expect("default threshold")
            .is_empty());
        assert_eq!(
            engine.anomalies("Hotel Sol", Some(0.0)),
            Err(EngineError::InvalidThreshold(0.0))
        );
    }

    #[test]
    fn priorities_order_by_urgency() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::High.label(), "high");
    }
}
