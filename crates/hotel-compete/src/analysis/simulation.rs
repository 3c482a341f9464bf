use super::configuration;
use super::stats::{mean, round2, round_to};
use super::EngineError;
use crate::datasets::TabularStore;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChangeSimulation {
    pub hotel: String,
    pub price_change_pct: f64,
    pub current_avg_gap_pct: Option<f64>,
    pub new_avg_gap_pct: Option<f64>,
    pub current_competitive_positions: usize,
    pub new_competitive_positions: usize,
    pub total_positions: usize,
    pub competitiveness_change_pct: f64,
    pub configuration_multiplier: f64,
    pub configuration_impact_pct: f64,
    pub estimated_conversion_change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SimulationOutcome {
    NotFound { hotel: String },
    Projected(PriceChangeSimulation),
}

/// Projects the effect of moving the hotel's prices by `change_pct` percent.
pub fn simulate(
    store: &TabularStore,
    hotel: &str,
    change_pct: f64,
    elasticity: f64,
) -> Result<SimulationOutcome, EngineError> {
    if !change_pct.is_finite() || change_pct < -100.0 {
        return Err(EngineError::InvalidPercentage(change_pct));
    }

    let total_positions = store.offers_for(hotel).count();
    if total_positions == 0 {
        return Ok(SimulationOutcome::NotFound {
            hotel: hotel.to_string(),
        });
    }

    let current_avg_gap = mean(&store.price_gaps(hotel));
    let current_competitive = store
        .offers_for(hotel)
        .filter(|offer| offer.is_competitive())
        .count();

    let competitiveness_change = change_pct * elasticity;
    let total = total_positions as f64;
    let projected = (current_competitive as f64 + competitiveness_change / 100.0 * total)
        .clamp(0.0, total)
        .round();

    // Hotels without a channel configuration are simulated at full strength.
    let multiplier = configuration::configuration_score(store, hotel)
        .map_or(1.0, |score| 0.5 + score / 100.0 * 0.5);

    Ok(SimulationOutcome::Projected(PriceChangeSimulation {
        hotel: hotel.to_string(),
        price_change_pct: change_pct,
        current_avg_gap_pct: current_avg_gap.map(round2),
        new_avg_gap_pct: current_avg_gap.map(|gap| round2(gap + change_pct)),
        current_competitive_positions: current_competitive,
        new_competitive_positions: projected as usize,
        total_positions,
        competitiveness_change_pct: round2(competitiveness_change),
        configuration_multiplier: round2(multiplier),
        configuration_impact_pct: round_to((multiplier - 1.0) * 100.0, 1),
        estimated_conversion_change_pct: round2(competitiveness_change * 0.5 * multiplier),
    }))
}
