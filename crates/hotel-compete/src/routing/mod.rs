//! Free-text query routing: a fixed phrase table maps user input to an [`Intent`], and
//! [`dispatch`] turns the intent into an engine result.

mod dispatch;

pub use dispatch::{dispatch, QueryResponse, Session, CROSS_MARKET_SAMPLE};

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    HotelSelection,
    Competitiveness,
    PriceComparison,
    MarketAnalysis,
    Recommendations,
    Simulation,
    CrossMarket,
    Configuration,
    Help,
    General,
}

/// Phrases per intent, checked in table order. The first intent with a matching phrase wins.
/// Cross-market, simulation and configuration phrases sit ahead of the generic price and
/// market vocabulary they tend to contain.
const INTENT_PHRASES: &[(Intent, &[&str])] = &[
    (
        Intent::HotelSelection,
        &[
            "select hotel",
            "choose hotel",
            "change hotel",
            "switch hotel",
            "list hotels",
            "show hotels",
            "seleccionar",
            "elegir",
            "cambiar hotel",
            "ver hoteles",
        ],
    ),
    (
        Intent::CrossMarket,
        &[
            "cross market",
            "cross-market",
            "other market",
            "similar rate",
            "otro mercado",
            "tarifa similar",
            "comparar mercados",
        ],
    ),
    (
        Intent::Simulation,
        &[
            "simulate",
            "simulation",
            "what if",
            "impact",
            "conversion",
            "simular",
            "simulacion",
            "impacto",
        ],
    ),
    (
        Intent::Configuration,
        &[
            "configuration",
            "config",
            "setup",
            "extranet",
            "b2b",
            "api",
            "html",
            "wrapper",
            "prepayment",
            "rate type",
            "configuracion",
            "prepago",
        ],
    ),
    (
        Intent::Competitiveness,
        &[
            "competitiveness",
            "competitive",
            "score",
            "position",
            "competitividad",
            "competitivo",
            "analisis",
            "posicion",
        ],
    ),
    (
        Intent::PriceComparison,
        &[
            "price",
            "prices",
            "rate",
            "compare",
            "cheaper",
            "more expensive",
            "precio",
            "precios",
            "tarifa",
            "comparar",
            "diferencia",
            "mas barato",
            "mas caro",
        ],
    ),
    (
        Intent::MarketAnalysis,
        &[
            "market",
            "markets",
            "pos",
            "country",
            "opportunity",
            "opportunities",
            "pattern",
            "patterns",
            "mercado",
            "mercados",
            "pais",
            "oportunidad",
            "patron",
        ],
    ),
    (
        Intent::Recommendations,
        &[
            "recommend",
            "recommendation",
            "recommendations",
            "suggest",
            "what should i do",
            "improve",
            "strategy",
            "recomendacion",
            "recomendaciones",
            "sugerir",
            "que hacer",
            "mejorar",
            "estrategia",
        ],
    ),
    (
        Intent::Help,
        &[
            "help",
            "commands",
            "what can you do",
            "ayuda",
            "comandos",
            "que puedes hacer",
            "funciones",
        ],
    ),
];

static NORMALIZED_PHRASES: OnceLock<Vec<(Intent, Vec<String>)>> = OnceLock::new();

fn phrase_table() -> &'static [(Intent, Vec<String>)] {
    NORMALIZED_PHRASES.get_or_init(|| {
        INTENT_PHRASES
            .iter()
            .map(|(intent, phrases)| {
                let padded = phrases
                    .iter()
                    .map(|phrase| format!(" {} ", normalize_query(phrase)))
                    .collect();
                (*intent, padded)
            })
            .collect()
    })
}

/// Lowercases, folds Spanish accents, turns punctuation into spaces and collapses whitespace.
/// Signs, digits, `%` and `.` survive so percentages stay intact.
pub fn normalize_query(value: &str) -> String {
    let folded: String = value
        .replace(['\u{feff}', '\u{200b}'], "")
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| match ch {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            ch if ch.is_alphanumeric() || matches!(ch, '%' | '-' | '+' | '.') => ch,
            _ => ' ',
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Phrases match on word boundaries, so `api` does not fire inside `rapid`.
pub fn route(input: &str) -> Intent {
    let padded = format!(" {} ", normalize_query(input));
    phrase_table()
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| padded.contains(phrase.as_str())))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::General)
}

/// First token of the form `[+-]<number>%`, e.g. `-10%`, `+5%` or `7.5%`.
pub fn parse_percentage(input: &str) -> Option<f64> {
    input.split_whitespace().find_map(|token| {
        let number = token.trim_end_matches(['.', ',', ';', '!', '?']).strip_suffix('%')?;
        let unsigned = number.strip_prefix(['+', '-']).unwrap_or(number);
        if unsigned.is_empty() || !unsigned.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
            return None;
        }
        number.parse::<f64>().ok().filter(|value| value.is_finite())
    })
}
