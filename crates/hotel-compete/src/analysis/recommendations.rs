use super::opportunities::MarketOpportunity;
use super::summary::HotelSummary;
use super::Priority;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HIGH_PRIORITY_SCORE: f64 = 30.0;
const MEDIUM_PRIORITY_SCORE: f64 = 60.0;
const PRICE_CUT_GAP: f64 = 15.0;
const PRICE_INCREASE_GAP: f64 = -10.0;
const MIN_COMPETITIVE_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    Critical,
    Important,
    Advisory,
    Info,
}

impl RecommendationLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Advisory => "advisory",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub level: RecommendationLevel,
    pub message: String,
}

impl Recommendation {
    pub fn new(level: RecommendationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level.label(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingRecommendations {
    pub priority: Priority,
    pub recommendations: Vec<Recommendation>,
}

pub fn pricing(
    summary: &HotelSummary,
    opportunities: &BTreeMap<String, MarketOpportunity>,
) -> PricingRecommendations {
    let score = summary.competitiveness_score;
    let (priority, headline) = if score < HIGH_PRIORITY_SCORE {
        (
            Priority::High,
            Recommendation::new(
                RecommendationLevel::Critical,
                "Review the overall pricing strategy",
            ),
        )
    } else if score < MEDIUM_PRIORITY_SCORE {
        (
            Priority::Medium,
            Recommendation::new(
                RecommendationLevel::Important,
                "Optimize prices in specific markets",
            ),
        )
    } else {
        (
            Priority::Low,
            Recommendation::new(
                RecommendationLevel::Info,
                "Keep monitoring and apply minor adjustments",
            ),
        )
    };
    let mut recommendations = vec![headline];

    let critical_markets: Vec<&str> = opportunities
        .values()
        .filter(|opportunity| opportunity.priority == Priority::High)
        .map(|opportunity| opportunity.market.as_str())
        .collect();
    if !critical_markets.is_empty() {
        recommendations.push(Recommendation::new(
            RecommendationLevel::Important,
            format!("Critical markets: {}", critical_markets.join(", ")),
        ));
    }

    if let Some(offers) = &summary.offers {
        match offers.avg_price_gap_pct {
            Some(gap) if gap > PRICE_CUT_GAP => recommendations.push(Recommendation::new(
                RecommendationLevel::Advisory,
                "Consider cutting prices by 5-10%",
            )),
            Some(gap) if gap < PRICE_INCREASE_GAP => recommendations.push(Recommendation::new(
                RecommendationLevel::Advisory,
                "Room to raise prices by 3-7%",
            )),
            _ => {}
        }

        if offers.competitive_ratio() < MIN_COMPETITIVE_RATIO {
            recommendations.push(Recommendation::new(
                RecommendationLevel::Advisory,
                "Improve competitiveness: fewer than 30% of searches are winning positions",
            ));
        }
    }

    PricingRecommendations {
        priority,
        recommendations,
    }
}
