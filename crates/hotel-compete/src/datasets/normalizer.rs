use super::domain::{DerivedPricing, OfferObservation};
use chrono::NaiveDate;

const DAY_FIRST_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Parses a price that may carry grouping separators, e.g. `"1,250.50"`.
pub(crate) fn parse_price(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|price| price.is_finite())
}

/// Parses a calendar date written day-first. ISO dates are accepted as well since they
/// are unambiguous.
pub(crate) fn parse_day_first_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);

    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(date);
    }

    DAY_FIRST_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

/// Parses a whole, non-negative count. Exports sometimes write counts as `2.0`.
pub(crate) fn parse_count(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if let Ok(count) = trimmed.parse::<u32>() {
        return Some(count);
    }

    let float = trimmed.parse::<f64>().ok()?;
    if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= u32::MAX as f64 {
        Some(float as u32)
    } else {
        None
    }
}

pub(crate) fn is_affirmative(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "sí" | "si" | "1" | "yes" | "y" | "true"
    )
}

/// Splits the enabled-market list, dropping blank entries.
pub(crate) fn split_markets(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|market| !market.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn per_night(price: Option<f64>, nights: u32) -> Option<f64> {
    if nights == 0 {
        return None;
    }
    price.map(|price| price / nights as f64)
}

/// `(competitor - own) / own * 100`. Negative means the hotel undercuts the competitor.
pub(crate) fn price_gap_pct(own: Option<f64>, competitor: Option<f64>) -> Option<f64> {
    match (own, competitor) {
        (Some(own), Some(competitor)) if own != 0.0 => {
            Some((competitor - own) / own * 100.0).filter(|gap| gap.is_finite())
        }
        _ => None,
    }
}

pub(crate) fn derive_pricing(observed: &OfferObservation) -> DerivedPricing {
    DerivedPricing {
        own_price_per_night: per_night(observed.own_price, observed.stay_length),
        competitor_price_per_night: per_night(observed.competitor_price, observed.stay_length),
        price_gap_pct: price_gap_pct(observed.own_price, observed.competitor_price),
    }
}
