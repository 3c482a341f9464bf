use super::stats::{mean, round2, sample_std_dev};
use crate::datasets::{ExternalOffer, TabularStore};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregates over one group of offers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternStats {
    pub count: usize,
    pub avg_gap_pct: Option<f64>,
    pub gap_volatility: Option<f64>,
    pub avg_own_price: Option<f64>,
    pub avg_competitor_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketPattern {
    pub market: String,
    #[serde(flatten)]
    pub stats: PatternStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyPattern {
    pub adults: u32,
    pub children: u32,
    #[serde(flatten)]
    pub stats: PatternStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPattern {
    pub month: u32,
    #[serde(flatten)]
    pub stats: PatternStats,
}

/// Prices in stay-length buckets are per night.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayLengthPattern {
    pub stay_length: u32,
    #[serde(flatten)]
    pub stats: PatternStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePatterns {
    pub by_market: Vec<MarketPattern>,
    pub by_party: Vec<PartyPattern>,
    pub by_month: Vec<MonthPattern>,
    pub by_stay_length: Vec<StayLengthPattern>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    Winning,
    Competitive,
    Losing,
    InsufficientData,
}

impl MarketPosition {
    pub fn from_gap(avg_gap: Option<f64>) -> Self {
        match avg_gap {
            None => Self::InsufficientData,
            Some(gap) if gap < 0.0 => Self::Winning,
            Some(gap) if gap < 10.0 => Self::Competitive,
            Some(_) => Self::Losing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketPriceComparison {
    pub market: String,
    pub avg_own_price: Option<f64>,
    pub avg_competitor_price: Option<f64>,
    pub avg_gap_pct: Option<f64>,
    pub position: MarketPosition,
}

pub fn price_patterns(store: &TabularStore, hotel: &str) -> PricePatterns {
    let offers: Vec<&ExternalOffer> = store.offers_for(hotel).collect();

    PricePatterns {
        by_market: group(&offers, |offer| offer.observed.market.clone())
            .into_iter()
            .map(|(market, group)| MarketPattern {
                market,
                stats: total_price_stats(&group),
            })
            .collect(),
        by_party: group(&offers, |offer| (offer.observed.adults, offer.observed.children))
            .into_iter()
            .map(|((adults, children), group)| PartyPattern {
                adults,
                children,
                stats: total_price_stats(&group),
            })
            .collect(),
        by_month: group(&offers, |offer| offer.observed.check_in.month())
            .into_iter()
            .map(|(month, group)| MonthPattern {
                month,
                stats: total_price_stats(&group),
            })
            .collect(),
        by_stay_length: group(&offers, |offer| offer.observed.stay_length)
            .into_iter()
            .map(|(stay_length, group)| StayLengthPattern {
                stay_length,
                stats: per_night_stats(&group),
            })
            .collect(),
    }
}

pub fn market_price_comparison(store: &TabularStore, hotel: &str) -> Vec<MarketPriceComparison> {
    price_patterns(store, hotel)
        .by_market
        .into_iter()
        .map(|pattern| MarketPriceComparison {
            position: MarketPosition::from_gap(pattern.stats.avg_gap_pct),
            market: pattern.market,
            avg_own_price: pattern.stats.avg_own_price,
            avg_competitor_price: pattern.stats.avg_competitor_price,
            avg_gap_pct: pattern.stats.avg_gap_pct,
        })
        .collect()
}

fn group<'a, K: Ord>(
    offers: &[&'a ExternalOffer],
    key: impl Fn(&ExternalOffer) -> K,
) -> BTreeMap<K, Vec<&'a ExternalOffer>> {
    let mut groups: BTreeMap<K, Vec<&'a ExternalOffer>> = BTreeMap::new();
    for &offer in offers {
        groups.entry(key(offer)).or_default().push(offer);
    }
    groups
}

fn total_price_stats(offers: &[&ExternalOffer]) -> PatternStats {
    stats(
        offers,
        |offer| offer.observed.own_price,
        |offer| offer.observed.competitor_price,
    )
}

fn per_night_stats(offers: &[&ExternalOffer]) -> PatternStats {
    stats(
        offers,
        |offer| offer.derived.own_price_per_night,
        |offer| offer.derived.competitor_price_per_night,
    )
}

fn stats(
    offers: &[&ExternalOffer],
    own: impl Fn(&ExternalOffer) -> Option<f64>,
    competitor: impl Fn(&ExternalOffer) -> Option<f64>,
) -> PatternStats {
    let gaps: Vec<f64> = offers.iter().filter_map(|offer| offer.price_gap_pct()).collect();
    let own: Vec<f64> = offers.iter().filter_map(|offer| own(*offer)).collect();
    let competitor: Vec<f64> = offers.iter().filter_map(|offer| competitor(*offer)).collect();

    PatternStats {
        count: offers.len(),
        avg_gap_pct: mean(&gaps).map(round2),
        gap_volatility: sample_std_dev(&gaps).map(round2),
        avg_own_price: mean(&own).map(round2),
        avg_competitor_price: mean(&competitor).map(round2),
    }
}
