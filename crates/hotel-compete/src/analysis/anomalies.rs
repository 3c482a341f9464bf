use super::stats::{mean, round2, sample_std_dev};
use super::EngineError;
use crate::datasets::TabularStore;
use chrono::NaiveDate;
use serde::Serialize;

/// One offer whose price gap sits unusually far from the hotel's mean gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAnomaly {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub market: String,
    pub adults: u32,
    pub children: u32,
    pub stay_length: u32,
    pub agency: String,
    pub own_price: Option<f64>,
    pub competitor_price: Option<f64>,
    pub price_gap_pct: f64,
    pub z_score: f64,
}

/// Offers with `z > threshold`, sorted by descending absolute gap. Offers with an
/// undefined gap take no part.
pub fn detect(
    store: &TabularStore,
    hotel: &str,
    threshold: f64,
) -> Result<Vec<PriceAnomaly>, EngineError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(EngineError::InvalidThreshold(threshold));
    }

    let gaps = store.price_gaps(hotel);
    // Identical gaps can still leave a stdev of a few ulps after averaging.
    if gaps.windows(2).all(|pair| pair[0] == pair[1]) {
        return Ok(Vec::new());
    }
    let (Some(mean), Some(stdev)) = (mean(&gaps), sample_std_dev(&gaps)) else {
        return Ok(Vec::new());
    };
    if stdev == 0.0 {
        return Ok(Vec::new());
    }

    let mut anomalies: Vec<PriceAnomaly> = store
        .offers_for(hotel)
        .filter_map(|offer| {
            let gap = offer.price_gap_pct()?;
            let z_score = (gap - mean).abs() / stdev;
            (z_score > threshold).then(|| {
                let observed = &offer.observed;
                PriceAnomaly {
                    check_in: observed.check_in,
                    check_out: observed.check_out,
                    market: observed.market.clone(),
                    adults: observed.adults,
                    children: observed.children,
                    stay_length: observed.stay_length,
                    agency: observed.agency.clone(),
                    own_price: observed.own_price,
                    competitor_price: observed.competitor_price,
                    price_gap_pct: round2(gap),
                    z_score: round2(z_score),
                }
            })
        })
        .collect();

    anomalies.sort_by(|a, b| b.price_gap_pct.abs().total_cmp(&a.price_gap_pct.abs()));
    Ok(anomalies)
}
