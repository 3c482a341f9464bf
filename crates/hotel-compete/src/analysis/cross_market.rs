use super::stats::round2;
use super::EngineError;
use crate::datasets::TabularStore;
use serde::Serialize;

/// Tolerance for treating a difference computed in floating point as on the boundary.
const BOUNDARY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketMatch {
    pub market: String,
    pub contracted_rate: f64,
    pub currency: String,
    pub observed_price: f64,
    pub difference_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossMarketAnalysis {
    pub hotel: String,
    pub observed_price: f64,
    pub match_found: bool,
    pub matches: Vec<MarketMatch>,
    pub rates_compared: usize,
    pub analysis: String,
}

/// Compares an observed per-night price against every contracted rate of the hotel.
/// Rates that are not positive cannot anchor a percentage and are skipped.
pub fn correlate(
    store: &TabularStore,
    hotel: &str,
    observed_price: f64,
    similarity_threshold_pct: f64,
) -> Result<CrossMarketAnalysis, EngineError> {
    if !observed_price.is_finite() || observed_price <= 0.0 {
        return Err(EngineError::InvalidObservedPrice(observed_price));
    }

    let rates: Vec<_> = store
        .rates_for(hotel)
        .filter(|rate| rate.contracted_rate.is_finite() && rate.contracted_rate > 0.0)
        .collect();

    if rates.is_empty() {
        return Ok(CrossMarketAnalysis {
            hotel: hotel.to_string(),
            observed_price,
            match_found: false,
            matches: Vec::new(),
            rates_compared: 0,
            analysis: "Hotel not found in internal rate data".to_string(),
        });
    }

    let mut matches: Vec<MarketMatch> = rates
        .iter()
        .filter_map(|rate| {
            let difference =
                ((observed_price - rate.contracted_rate) / rate.contracted_rate * 100.0).abs();
            (difference <= similarity_threshold_pct + BOUNDARY_EPSILON).then(|| MarketMatch {
                market: rate.market.clone(),
                contracted_rate: rate.contracted_rate,
                currency: rate.currency.clone(),
                observed_price,
                difference_pct: round2(difference),
            })
        })
        .collect();
    matches.sort_by(|a, b| a.difference_pct.total_cmp(&b.difference_pct));

    let analysis = if matches.is_empty() {
        "No similar markets found".to_string()
    } else {
        format!("Found {} similar market(s)", matches.len())
    };

    Ok(CrossMarketAnalysis {
        hotel: hotel.to_string(),
        observed_price,
        match_found: !matches.is_empty(),
        matches,
        rates_compared: rates.len(),
        analysis,
    })
}
