use super::configuration::{self, ConfigurationAssessment};
use super::scoring;
use super::stats::{mean, round2, sample_std_dev};
use crate::datasets::TabularStore;
use serde::Serialize;
use std::collections::BTreeSet;

/// Offer statistics, present only when the hotel has external offers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferMetrics {
    pub avg_price_gap_pct: Option<f64>,
    pub price_volatility: Option<f64>,
    pub competitive_positions: usize,
    pub total_searches: usize,
    pub agencies: usize,
}

impl OfferMetrics {
    /// Share of searches where the hotel undercuts the best competitor.
    pub fn competitive_ratio(&self) -> f64 {
        self.competitive_positions as f64 / self.total_searches.max(1) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelSummary {
    pub hotel: String,
    pub total_external_records: usize,
    pub total_internal_records: usize,
    pub markets: Vec<String>,
    pub competitiveness_score: f64,
    pub offers: Option<OfferMetrics>,
    pub availability: Option<f64>,
    pub configuration: Option<ConfigurationAssessment>,
}

pub fn summarize(store: &TabularStore, hotel: &str) -> HotelSummary {
    let mut markets = Vec::new();
    let mut seen = BTreeSet::new();
    let mut agencies = BTreeSet::new();
    let mut total_external_records = 0;
    let mut competitive_positions = 0;
    for offer in store.offers_for(hotel) {
        total_external_records += 1;
        if offer.is_competitive() {
            competitive_positions += 1;
        }
        agencies.insert(offer.observed.agency.as_str());
        if seen.insert(offer.observed.market.as_str()) {
            markets.push(offer.observed.market.clone());
        }
    }

    let offers = (total_external_records > 0).then(|| {
        let gaps = store.price_gaps(hotel);
        OfferMetrics {
            avg_price_gap_pct: mean(&gaps).map(round2),
            price_volatility: sample_std_dev(&gaps).map(round2),
            competitive_positions,
            total_searches: total_external_records,
            agencies: agencies.len(),
        }
    });

    let channel = store.config_for(hotel);

    HotelSummary {
        hotel: hotel.to_string(),
        total_external_records,
        total_internal_records: store.rates_for(hotel).count(),
        markets,
        competitiveness_score: scoring::score(store, hotel),
        offers,
        availability: channel.map(|config| config.availability),
        configuration: channel.map(configuration::assess),
    }
}
