use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three tables making up one loaded dataset triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    InternalRates,
    ExternalOffers,
    ChannelConfig,
}

impl Dataset {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InternalRates => "internal rates",
            Self::ExternalOffers => "external offers",
            Self::ChannelConfig => "channel configuration",
        }
    }
}

/// Contracted rate for one hotel in one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalRate {
    pub hotel: String,
    pub market: String,
    pub contracted_rate: f64,
    pub currency: String,
    pub exp_base_rate: Option<f64>,
    pub hbg_base_rate: Option<f64>,
}

/// Raw observation of one external search, as typed at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferObservation {
    pub hotel: String,
    pub market: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub stay_length: u32,
    pub adults: u32,
    pub children: u32,
    pub own_price: Option<f64>,
    pub competitor_price: Option<f64>,
    pub agency: String,
}

/// Fields computed by the normalizer for every offer. `None` marks an undefined value
/// that must be left out of statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedPricing {
    pub own_price_per_night: Option<f64>,
    pub competitor_price_per_night: Option<f64>,
    pub price_gap_pct: Option<f64>,
}

/// External offer with its derived pricing attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalOffer {
    pub observed: OfferObservation,
    pub derived: DerivedPricing,
}

impl ExternalOffer {
    pub fn from_observation(observed: OfferObservation) -> Self {
        let derived = super::normalizer::derive_pricing(&observed);
        Self { observed, derived }
    }

    pub fn price_gap_pct(&self) -> Option<f64> {
        self.derived.price_gap_pct
    }

    pub fn is_competitive(&self) -> bool {
        self.derived.price_gap_pct.is_some_and(|gap| gap < 0.0)
    }
}

/// Distribution channel settings for one hotel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub hotel: String,
    pub api_enabled: bool,
    pub html_enabled: bool,
    pub wrapper_enabled: bool,
    pub prepayment_active: bool,
    pub rate_type: String,
    pub enabled_markets: Vec<String>,
    pub availability: f64,
}
