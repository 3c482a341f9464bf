use super::stats::{mean, round2, sample_std_dev};
use super::Priority;
use crate::datasets::{ExternalOffer, TabularStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const RAISE_PRICES_BELOW_GAP: f64 = -5.0;
pub const LOWER_PRICES_ABOVE_GAP: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityType {
    RaisePrices,
    LowerPrices,
    Monitor,
}

impl OpportunityType {
    /// Rules apply in order; an undefined mean gap falls through to monitoring.
    pub fn classify(avg_gap: Option<f64>) -> (Self, Priority) {
        match avg_gap {
            Some(gap) if gap < RAISE_PRICES_BELOW_GAP => (Self::RaisePrices, Priority::Medium),
            Some(gap) if gap > LOWER_PRICES_ABOVE_GAP => (Self::LowerPrices, Priority::High),
            _ => (Self::Monitor, Priority::Low),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RaisePrices => "raise prices",
            Self::LowerPrices => "lower prices",
            Self::Monitor => "monitor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOpportunity {
    pub market: String,
    pub avg_price_gap_pct: Option<f64>,
    pub price_volatility: Option<f64>,
    pub search_volume: usize,
    pub agency_count: usize,
    pub opportunity_type: OpportunityType,
    pub priority: Priority,
    pub opportunity_score: f64,
}

pub fn analyze(store: &TabularStore, hotel: &str) -> BTreeMap<String, MarketOpportunity> {
    let mut by_market: BTreeMap<&str, Vec<&ExternalOffer>> = BTreeMap::new();
    for offer in store.offers_for(hotel) {
        by_market
            .entry(offer.observed.market.as_str())
            .or_default()
            .push(offer);
    }

    by_market
        .into_iter()
        .map(|(market, offers)| (market.to_string(), assess_market(market, &offers)))
        .collect()
}

fn assess_market(market: &str, offers: &[&ExternalOffer]) -> MarketOpportunity {
    let gaps: Vec<f64> = offers
        .iter()
        .filter_map(|offer| offer.price_gap_pct())
        .collect();
    let avg_gap = mean(&gaps);
    let volatility = sample_std_dev(&gaps);
    let search_volume = offers.len();
    let agency_count = offers
        .iter()
        .map(|offer| offer.observed.agency.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let (opportunity_type, priority) = OpportunityType::classify(avg_gap);

    MarketOpportunity {
        market: market.to_string(),
        avg_price_gap_pct: avg_gap.map(round2),
        price_volatility: volatility.map(round2),
        search_volume,
        agency_count,
        opportunity_type,
        priority,
        opportunity_score: opportunity_score(avg_gap, volatility, search_volume),
    }
}

fn opportunity_score(avg_gap: Option<f64>, volatility: Option<f64>, volume: usize) -> f64 {
    let gap_factor = avg_gap.map_or(0.0, |gap| (50.0 - gap).max(0.0));
    let stability_factor = volatility.map_or(0.0, |stdev| (50.0 - stdev).max(0.0));
    let volume_factor = (volume as f64 / 10.0).min(50.0);
    round2((gap_factor + stability_factor + volume_factor) / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::OfferObservation;
    use chrono::NaiveDate;

    fn observation(market: &str, agency: &str, own: f64, competitor: f64) -> OfferObservation {
        let check_in = NaiveDate::from_ymd_opt(2024, 5, 10).expect("valid date");
        OfferObservation {
            hotel: "Hotel Sol".to_string(),
            market: market.to_string(),
            check_in,
            check_out: check_in + chrono::Duration::days(2),
            stay_length: 2,
            adults: 2,
            children: 0,
            own_price: Some(own),
            competitor_price: Some(competitor),
            agency: agency.to_string(),
        }
    }

    #[test]
    fn classification_thresholds_are_exclusive() {
        assert_eq!(
            OpportunityType::classify(Some(-5.0)),
            (OpportunityType::Monitor, Priority::Low)
        );
        assert_eq!(
            OpportunityType::classify(Some(-5.01)),
            (OpportunityType::RaisePrices, Priority::Medium)
        );
        assert_eq!(
            OpportunityType::classify(Some(10.0)),
            (OpportunityType::Monitor, Priority::Low)
        );
        assert_eq!(
            OpportunityType::classify(Some(10.01)),
            (OpportunityType::LowerPrices, Priority::High)
        );
        assert_eq!(
            OpportunityType::classify(None),
            (OpportunityType::Monitor, Priority::Low)
        );
    }

    #[test]
    fn markets_are_classified_independently() {
        let store = TabularStore::new(
            Vec::new(),
            vec![
                observation("AR", "Agency One", 100.0, 80.0),
                observation("AR", "Agency Two", 100.0, 90.0),
                observation("BR", "Agency One", 100.0, 130.0),
            ],
            Vec::new(),
        );

        let opportunities = analyze(&store, "Hotel Sol");
        let ar = &opportunities["AR"];
        assert_eq!(ar.avg_price_gap_pct, Some(-15.0));
        assert_eq!(ar.opportunity_type, OpportunityType::RaisePrices);
        assert_eq!(ar.search_volume, 2);
        assert_eq!(ar.agency_count, 2);
        assert_eq!(ar.price_volatility, Some(7.07));

        let br = &opportunities["BR"];
        assert_eq!(br.opportunity_type, OpportunityType::LowerPrices);
        assert_eq!(br.priority, Priority::High);
        assert_eq!(br.price_volatility, None);
        // (max(0, 50 - 30) + 0 + 0.1) / 3
        assert_eq!(br.opportunity_score, 6.7);
    }

    #[test]
    fn unknown_hotel_yields_empty_map() {
        let store = TabularStore::new(
            Vec::new(),
            vec![observation("AR", "Agency One", 100.0, 80.0)],
            Vec::new(),
        );
        assert!(analyze(&store, "Hotel Mar").is_empty());
    }
}
