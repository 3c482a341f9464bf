use super::domain::{ChannelConfig, ExternalOffer, InternalRate, OfferObservation};
use std::collections::BTreeSet;

/// In-memory tables for one loaded dataset triple. Derived offer pricing is computed here,
/// in full, every time a store is built.
#[derive(Debug, Clone, Default)]
pub struct TabularStore {
    internal_rates: Vec<InternalRate>,
    external_offers: Vec<ExternalOffer>,
    channel_configs: Vec<ChannelConfig>,
}

impl TabularStore {
    pub fn new(
        internal_rates: Vec<InternalRate>,
        observations: Vec<OfferObservation>,
        channel_configs: Vec<ChannelConfig>,
    ) -> Self {
        let external_offers = observations
            .into_iter()
            .map(ExternalOffer::from_observation)
            .collect();

        Self {
            internal_rates,
            external_offers,
            channel_configs,
        }
    }

    pub fn internal_rates(&self) -> &[InternalRate] {
        &self.internal_rates
    }

    pub fn external_offers(&self) -> &[ExternalOffer] {
        &self.external_offers
    }

    pub fn channel_configs(&self) -> &[ChannelConfig] {
        &self.channel_configs
    }

    pub fn offers_for<'a>(&'a self, hotel: &'a str) -> impl Iterator<Item = &'a ExternalOffer> {
        self.external_offers
            .iter()
            .filter(move |offer| offer.observed.hotel == hotel)
    }

    pub fn rates_for<'a>(&'a self, hotel: &'a str) -> impl Iterator<Item = &'a InternalRate> {
        self.internal_rates
            .iter()
            .filter(move |rate| rate.hotel == hotel)
    }

    /// First configuration row for the hotel; later duplicates are ignored.
    pub fn config_for(&self, hotel: &str) -> Option<&ChannelConfig> {
        self.channel_configs
            .iter()
            .find(|config| config.hotel == hotel)
    }

    /// Hotels observed in the external offers, sorted and deduplicated.
    pub fn hotels(&self) -> Vec<String> {
        self.external_offers
            .iter()
            .map(|offer| offer.observed.hotel.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Defined price gaps for the hotel, in row order.
    pub fn price_gaps(&self, hotel: &str) -> Vec<f64> {
        self.offers_for(hotel)
            .filter_map(ExternalOffer::price_gap_pct)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn observation(hotel: &str, own: Option<f64>, competitor: Option<f64>) -> OfferObservation {
        let check_in = NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date");
        OfferObservation {
            hotel: hotel.to_string(),
            market: "AR".to_string(),
            check_in,
            check_out: check_in + chrono::Duration::days(2),
            stay_length: 2,
            adults: 2,
            children: 0,
            own_price: own,
            competitor_price: competitor,
            agency: "Agency One".to_string(),
        }
    }

    #[test]
    fn derived_pricing_is_attached_to_every_offer() {
        let store = TabularStore::new(
            Vec::new(),
            vec![
                observation("Hotel Sol", Some(200.0), Some(220.0)),
                observation("Hotel Sol", Some(0.0), Some(220.0)),
            ],
            Vec::new(),
        );

        let offers = store.external_offers();
        assert_eq!(offers[0].derived.own_price_per_night, Some(100.0));
        assert_eq!(offers[0].derived.competitor_price_per_night, Some(110.0));
        assert_eq!(offers[0].price_gap_pct(), Some(10.0));
        assert_eq!(offers[1].price_gap_pct(), None);
        assert_eq!(store.price_gaps("Hotel Sol"), vec![10.0]);
    }

    #[test]
    fn hotels_are_sorted_and_unique() {
        let store = TabularStore::new(
            Vec::new(),
            vec![
                observation("Hotel Sol", Some(100.0), Some(90.0)),
                observation("Hotel Azul", Some(100.0), Some(90.0)),
                observation("Hotel Sol", Some(100.0), Some(95.0)),
            ],
            Vec::new(),
        );

        assert_eq!(store.hotels(), vec!["Hotel Azul", "Hotel Sol"]);
        assert_eq!(store.offers_for("Hotel Sol").count(), 2);
        assert_eq!(store.offers_for("Hotel Mar").count(), 0);
    }

    #[test]
    fn first_configuration_row_wins() {
        let config = |rate_type: &str| ChannelConfig {
            hotel: "Hotel Sol".to_string(),
            api_enabled: true,
            html_enabled: true,
            wrapper_enabled: true,
            prepayment_active: true,
            rate_type: rate_type.to_string(),
            enabled_markets: vec!["AR".to_string()],
            availability: 0.95,
        };
        let store = TabularStore::new(
            Vec::new(),
            Vec::new(),
            vec![config("PACKAGE"), config("STANDALONE")],
        );

        let chosen = store.config_for("Hotel Sol").expect("configuration present");
        assert_eq!(chosen.rate_type, "PACKAGE");
    }
}
