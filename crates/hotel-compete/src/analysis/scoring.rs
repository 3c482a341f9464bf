use super::configuration;
use super::stats::{clamp_component, mean, round2, sample_std_dev};
use crate::datasets::{ExternalOffer, TabularStore};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

pub const PRICE_WEIGHT: f64 = 0.30;
pub const AVAILABILITY_WEIGHT: f64 = 0.25;
pub const CONSISTENCY_WEIGHT: f64 = 0.25;
pub const CONFIGURATION_WEIGHT: f64 = 0.20;

/// Clamped components of the competitiveness score, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub price: f64,
    pub availability: f64,
    pub consistency: f64,
    pub configuration: f64,
    pub total: f64,
}

pub fn breakdown(store: &TabularStore, hotel: &str) -> ScoreBreakdown {
    let offers: Vec<&ExternalOffer> = store.offers_for(hotel).collect();
    if offers.is_empty() {
        return ScoreBreakdown::default();
    }

    let gaps = store.price_gaps(hotel);
    let price = clamp_component(mean(&gaps).map(|mean| 50.0 - mean));
    let availability = clamp_component(Some(search_coverage(&offers)));
    let consistency = clamp_component(sample_std_dev(&gaps).map(|stdev| 100.0 - stdev));
    let configuration = clamp_component(configuration::configuration_score(store, hotel));

    let total = price * PRICE_WEIGHT
        + availability * AVAILABILITY_WEIGHT
        + consistency * CONSISTENCY_WEIGHT
        + configuration * CONFIGURATION_WEIGHT;

    ScoreBreakdown {
        price,
        availability,
        consistency,
        configuration,
        total: round2(total),
    }
}

pub fn score(store: &TabularStore, hotel: &str) -> f64 {
    breakdown(store, hotel).total
}

type SearchKey<'a> = (&'a str, NaiveDate, NaiveDate, u32, u32);

/// Share of rows that are distinct searches, as a percentage.
fn search_coverage(offers: &[&ExternalOffer]) -> f64 {
    let distinct: HashSet<SearchKey<'_>> = offers
        .iter()
        .map(|offer| {
            let observed = &offer.observed;
            (
                observed.market.as_str(),
                observed.check_in,
                observed.check_out,
                observed.adults,
                observed.children,
            )
        })
        .collect();
    distinct.len() as f64 / offers.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{ChannelConfig, OfferObservation};

    fn observation(market: &str, day: u32, own: f64, competitor: f64) -> OfferObservation {
        let check_in = NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date");
        OfferObservation {
            hotel: "Hotel Sol".to_string(),
            market: market.to_string(),
            check_in,
            check_out: check_in + chrono::Duration::days(1),
            stay_length: 1,
            adults: 2,
            children: 0,
            own_price: Some(own),
            competitor_price: Some(competitor),
            agency: "Agency One".to_string(),
        }
    }

    #[test]
    fn components_follow_the_reference_example() {
        let store = TabularStore::new(
            Vec::new(),
            vec![
                observation("AR", 1, 100.0, 110.0),
                observation("AR", 2, 200.0, 180.0),
            ],
            Vec::new(),
        );

        let breakdown = breakdown(&store, "Hotel Sol");
        assert_eq!(breakdown.price, 50.0);
        assert_eq!(round2(breakdown.consistency), 85.86);
        assert_eq!(breakdown.availability, 100.0);
        assert_eq!(breakdown.configuration, 0.0);
        // 15 + 25 + 21.46 + 0
        assert_eq!(breakdown.total, 61.46);
    }

    #[test]
    fn duplicate_searches_reduce_availability() {
        let store = TabularStore::new(
            Vec::new(),
            vec![
                observation("AR", 1, 100.0, 100.0),
                observation("AR", 1, 100.0, 100.0),
            ],
            Vec::new(),
        );

        assert_eq!(breakdown(&store, "Hotel Sol").availability, 50.0);
    }

    #[test]
    fn zero_offers_score_exactly_zero() {
        let config = ChannelConfig {
            hotel: "Hotel Sol".to_string(),
            api_enabled: true,
            html_enabled: true,
            wrapper_enabled: true,
            prepayment_active: true,
            rate_type: "PACKAGE".to_string(),
            enabled_markets: vec!["AR".to_string()],
            availability: 1.0,
        };
        let store = TabularStore::new(Vec::new(), Vec::new(), vec![config]);

        assert_eq!(score(&store, "Hotel Sol"), 0.0);
        assert_eq!(breakdown(&store, "Hotel Sol"), ScoreBreakdown::default());
    }

    #[test]
    fn extreme_gaps_stay_within_bounds() {
        let store = TabularStore::new(
            Vec::new(),
            vec![
                observation("AR", 1, 10.0, 1000.0),
                observation("BR", 2, 1000.0, 10.0),
            ],
            Vec::new(),
        );

        let breakdown = breakdown(&store, "Hotel Sol");
        assert_eq!(breakdown.price, 0.0);
        assert_eq!(breakdown.consistency, 0.0);
        assert!((0.0..=100.0).contains(&breakdown.total));
    }

    #[test]
    fn single_offer_has_no_consistency_signal() {
        let store = TabularStore::new(
            Vec::new(),
            vec![observation("AR", 1, 100.0, 90.0)],
            Vec::new(),
        );

        let breakdown = breakdown(&store, "Hotel Sol");
        assert_eq!(breakdown.consistency, 0.0);
        assert_eq!(breakdown.price, 60.0);
    }
}
