use super::{normalize_query, parse_percentage, route, Intent};
use crate::analysis::{
    CompetitivenessEngine, ConfigurationAssessment, CrossMarketAnalysis, EngineError,
    HotelSummary, MarketOpportunity, MarketPriceComparison, PricePatterns,
    PricingRecommendations, Recommendation, ScoreBreakdown, SimulationOutcome,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Offers sampled for a cross-market query.
pub const CROSS_MARKET_SAMPLE: usize = 3;

/// Words that select or name a hotel without identifying one.
const SELECTION_WORDS: &[&str] = &[
    "select", "choose", "change", "switch", "list", "show", "hotel", "hotels", "the", "seleccionar",
    "elegir", "cambiar", "ver", "hoteles", "el",
];

const HELP_COMMANDS: &[&str] = &[
    "select hotel <name> / seleccionar hotel <nombre>",
    "competitiveness score / analisis de competitividad",
    "compare prices / comparar precios",
    "market opportunities / oportunidades por mercado",
    "recommendations / recomendaciones",
    "simulate -10% / simular -10%",
    "cross market / otro mercado",
    "configuration / configuracion b2b",
];

const GENERAL_SUGGESTIONS: &[&str] = &[
    "competitiveness score",
    "compare prices",
    "configuration",
    "recommendations",
    "simulate -5%",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum QueryResponse {
    HotelSelected {
        hotel: String,
        summary: HotelSummary,
    },
    HotelList {
        hotels: Vec<String>,
    },
    NoHotelSelected {
        requested: Intent,
        hotels: Vec<String>,
    },
    Competitiveness {
        summary: HotelSummary,
        breakdown: ScoreBreakdown,
        opportunities: BTreeMap<String, MarketOpportunity>,
    },
    PriceComparison {
        hotel: String,
        markets: Vec<MarketPriceComparison>,
    },
    MarketAnalysis {
        hotel: String,
        patterns: PricePatterns,
        opportunities: BTreeMap<String, MarketOpportunity>,
    },
    Recommendations {
        hotel: String,
        pricing: PricingRecommendations,
        configuration: Vec<Recommendation>,
    },
    Simulation {
        outcome: SimulationOutcome,
    },
    CrossMarket {
        hotel: String,
        analyses: Vec<CrossMarketAnalysis>,
    },
    Configuration {
        hotel: String,
        assessment: Option<ConfigurationAssessment>,
        recommendations: Vec<Recommendation>,
    },
    Help {
        commands: Vec<&'static str>,
    },
    General {
        hotel: Option<String>,
        suggestions: Vec<&'static str>,
    },
}

/// Routes `input` and runs the matching query against `engine` for `selected_hotel`.
/// Only argument errors surface as `Err`; a missing hotel is an ordinary response.
pub fn dispatch(
    engine: &CompetitivenessEngine,
    selected_hotel: Option<&str>,
    input: &str,
) -> Result<QueryResponse, EngineError> {
    let intent = route(input);
    debug!(?intent, hotel = selected_hotel.unwrap_or("-"), "query routed");

    match intent {
        Intent::HotelSelection => Ok(select_hotel(engine, input)),
        Intent::Help => Ok(QueryResponse::Help {
            commands: HELP_COMMANDS.to_vec(),
        }),
        Intent::General => Ok(QueryResponse::General {
            hotel: selected_hotel.map(str::to_string),
            suggestions: GENERAL_SUGGESTIONS.to_vec(),
        }),
        intent => match selected_hotel {
            Some(hotel) => hotel_query(engine, hotel, intent, input),
            None => Ok(QueryResponse::NoHotelSelected {
                requested: intent,
                hotels: engine.available_hotels(),
            }),
        },
    }
}

fn hotel_query(
    engine: &CompetitivenessEngine,
    hotel: &str,
    intent: Intent,
    input: &str,
) -> Result<QueryResponse, EngineError> {
    let response = match intent {
        Intent::Competitiveness => QueryResponse::Competitiveness {
            summary: engine.hotel_summary(hotel),
            breakdown: engine.score_breakdown(hotel),
            opportunities: engine.opportunities(hotel),
        },
        Intent::PriceComparison => QueryResponse::PriceComparison {
            hotel: hotel.to_string(),
            markets: engine.market_price_comparison(hotel),
        },
        Intent::MarketAnalysis => QueryResponse::MarketAnalysis {
            hotel: hotel.to_string(),
            patterns: engine.price_patterns(hotel),
            opportunities: engine.opportunities(hotel),
        },
        Intent::Recommendations => QueryResponse::Recommendations {
            hotel: hotel.to_string(),
            pricing: engine.pricing_recommendations(hotel),
            configuration: engine.configuration_recommendations(hotel),
        },
        Intent::Simulation => {
            let change = parse_percentage(input)
                .ok_or_else(|| EngineError::MissingPercentage(input.to_string()))?;
            QueryResponse::Simulation {
                outcome: engine.simulate(hotel, change)?,
            }
        }
        Intent::CrossMarket => QueryResponse::CrossMarket {
            hotel: hotel.to_string(),
            analyses: sample_cross_market(engine, hotel)?,
        },
        Intent::Configuration => QueryResponse::Configuration {
            hotel: hotel.to_string(),
            assessment: engine.configuration(Some(hotel)).remove(hotel),
            recommendations: engine.configuration_recommendations(hotel),
        },
        Intent::HotelSelection | Intent::Help | Intent::General => {
            return dispatch(engine, Some(hotel), input)
        }
    };
    Ok(response)
}

/// Correlates the per-night competitor price of the first few offers that have one.
fn sample_cross_market(
    engine: &CompetitivenessEngine,
    hotel: &str,
) -> Result<Vec<CrossMarketAnalysis>, EngineError> {
    engine
        .store()
        .offers_for(hotel)
        .filter_map(|offer| offer.derived.competitor_price_per_night)
        .filter(|price| price.is_finite() && *price > 0.0)
        .take(CROSS_MARKET_SAMPLE)
        .map(|price| engine.cross_market(hotel, price))
        .collect()
}

/// Picks the hotel whose full name appears in the input, then the first hotel sharing a
/// distinctive word with it. No candidate lists the available hotels.
fn select_hotel(engine: &CompetitivenessEngine, input: &str) -> QueryResponse {
    let hotels = engine.available_hotels();
    let query = format!(" {} ", normalize_query(input));

    let by_full_name = hotels
        .iter()
        .find(|hotel| query.contains(&format!(" {} ", normalize_query(hotel))));

    let by_word = || {
        let words: Vec<&str> = query
            .split_whitespace()
            .filter(|word| word.len() > 2 && !SELECTION_WORDS.contains(word))
            .collect();
        hotels.iter().find(|hotel| {
            normalize_query(hotel)
                .split_whitespace()
                .any(|part| words.contains(&part))
        })
    };

    match by_full_name.or_else(by_word) {
        Some(hotel) => QueryResponse::HotelSelected {
            hotel: hotel.clone(),
            summary: engine.hotel_summary(hotel),
        },
        None => QueryResponse::HotelList { hotels },
    }
}

/// Conversational state: the loaded engine plus the hotel currently under analysis.
#[derive(Debug, Clone)]
pub struct Session {
    engine: Arc<CompetitivenessEngine>,
    selected_hotel: Option<String>,
}

impl Session {
    pub fn new(engine: Arc<CompetitivenessEngine>) -> Self {
        Self {
            engine,
            selected_hotel: None,
        }
    }

    pub fn with_hotel(engine: Arc<CompetitivenessEngine>, hotel: impl Into<String>) -> Self {
        Self {
            engine,
            selected_hotel: Some(hotel.into()),
        }
    }

    pub fn selected_hotel(&self) -> Option<&str> {
        self.selected_hotel.as_deref()
    }

    pub fn ask(&mut self, input: &str) -> Result<QueryResponse, EngineError> {
        let response = dispatch(&self.engine, self.selected_hotel.as_deref(), input)?;
        if let QueryResponse::HotelSelected { hotel, .. } = &response {
            self.selected_hotel = Some(hotel.clone());
        }
        Ok(response)
    }
}
