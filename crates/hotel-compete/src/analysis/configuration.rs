use super::recommendations::{Recommendation, RecommendationLevel};
use super::stats::round_to;
use super::Priority;
use crate::datasets::{ChannelConfig, TabularStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MINIMUM_AVAILABILITY: f64 = 0.90;
pub const OPTIMAL_CONFIG_SCORE: f64 = 85.0;
pub const GOOD_CONFIG_SCORE: f64 = 70.0;
const RECOMMENDED_MARKET_COUNT: usize = 3;
const STANDALONE_RATE_TYPE: &str = "STANDALONE";

/// Outcome of the seven channel checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationChecks {
    pub api_configured: bool,
    pub html_configured: bool,
    pub wrapper_configured: bool,
    pub prepayment_configured: bool,
    pub rate_type_valid: bool,
    pub has_markets: bool,
    pub good_availability: bool,
}

impl ConfigurationChecks {
    pub const TOTAL: usize = 7;

    pub fn evaluate(config: &ChannelConfig) -> Self {
        Self {
            api_configured: config.api_enabled,
            html_configured: config.html_enabled,
            wrapper_configured: config.wrapper_enabled,
            prepayment_configured: config.prepayment_active,
            rate_type_valid: config.rate_type != STANDALONE_RATE_TYPE,
            has_markets: config
                .enabled_markets
                .iter()
                .any(|market| !market.trim().is_empty()),
            good_availability: config.availability >= MINIMUM_AVAILABILITY,
        }
    }

    pub fn passing(&self) -> usize {
        [
            self.api_configured,
            self.html_configured,
            self.wrapper_configured,
            self.prepayment_configured,
            self.rate_type_valid,
            self.has_markets,
            self.good_availability,
        ]
        .into_iter()
        .filter(|passed| *passed)
        .count()
    }

    /// Failing checks that block distribution outright. Availability and market coverage
    /// only produce advisories.
    pub fn critical_issues(&self) -> Vec<CriticalIssue> {
        let mut issues = Vec::new();
        if !self.api_configured {
            issues.push(CriticalIssue::ApiNotConfigured);
        }
        if !self.html_configured {
            issues.push(CriticalIssue::HtmlNotConfigured);
        }
        if !self.wrapper_configured {
            issues.push(CriticalIssue::WrapperNotEnabled);
        }
        if !self.prepayment_configured {
            issues.push(CriticalIssue::PrepaymentInactive);
        }
        if !self.rate_type_valid {
            issues.push(CriticalIssue::StandaloneRateType);
        }
        issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalIssue {
    ApiNotConfigured,
    HtmlNotConfigured,
    WrapperNotEnabled,
    PrepaymentInactive,
    StandaloneRateType,
}

impl CriticalIssue {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApiNotConfigured => "API not configured",
            Self::HtmlNotConfigured => "HTML not configured",
            Self::WrapperNotEnabled => "Wrapper not enabled",
            Self::PrepaymentInactive => "Prepayment not active",
            Self::StandaloneRateType => "STANDALONE rate type not recommended",
        }
    }

    const fn action(self) -> (RecommendationLevel, &'static str) {
        match self {
            Self::ApiNotConfigured => (
                RecommendationLevel::Critical,
                "Enable the API flag in the channel extranet",
            ),
            Self::HtmlNotConfigured => (
                RecommendationLevel::Critical,
                "Enable the HTML flag in the channel extranet",
            ),
            Self::WrapperNotEnabled => (
                RecommendationLevel::Critical,
                "Turn on wrapper availability in the channel extranet",
            ),
            Self::PrepaymentInactive => (
                RecommendationLevel::Critical,
                "Activate prepayment in the channel extranet",
            ),
            Self::StandaloneRateType => (
                RecommendationLevel::Important,
                "Switch the rate type from STANDALONE to PACKAGE or OPAQUE",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationStatus {
    Optimal,
    Good,
    Critical,
}

impl ConfigurationStatus {
    /// Tier boundaries are closed below: 85.0 is optimal, 70.0 is good.
    pub fn from_score(score: f64) -> Self {
        if score >= OPTIMAL_CONFIG_SCORE {
            Self::Optimal
        } else if score >= GOOD_CONFIG_SCORE {
            Self::Good
        } else {
            Self::Critical
        }
    }

    pub const fn priority(self) -> Priority {
        match self {
            Self::Optimal => Priority::Low,
            Self::Good => Priority::Medium,
            Self::Critical => Priority::High,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Good => "good",
            Self::Critical => "critical",
        }
    }
}

/// Validator verdict for one hotel's channel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationAssessment {
    pub config_score: f64,
    pub status: ConfigurationStatus,
    pub priority: Priority,
    pub checks: ConfigurationChecks,
    pub critical_issues: Vec<CriticalIssue>,
    pub enabled_markets: Vec<String>,
    pub rate_type: String,
    pub availability: f64,
}

impl ConfigurationAssessment {
    pub fn critical_issue_labels(&self) -> Vec<&'static str> {
        self.critical_issues.iter().map(|issue| issue.label()).collect()
    }
}

pub fn assess(config: &ChannelConfig) -> ConfigurationAssessment {
    let checks = ConfigurationChecks::evaluate(config);
    let raw_score = checks.passing() as f64 / ConfigurationChecks::TOTAL as f64 * 100.0;
    let config_score = round_to(raw_score, 1);
    let status = ConfigurationStatus::from_score(config_score);

    ConfigurationAssessment {
        config_score,
        status,
        priority: status.priority(),
        checks,
        critical_issues: checks.critical_issues(),
        enabled_markets: config.enabled_markets.clone(),
        rate_type: config.rate_type.clone(),
        availability: config.availability,
    }
}

/// Evaluates one hotel, or every configured hotel when `hotel` is `None`. An unknown
/// hotel yields an empty map.
pub fn validate(
    store: &TabularStore,
    hotel: Option<&str>,
) -> BTreeMap<String, ConfigurationAssessment> {
    store
        .channel_configs()
        .iter()
        .filter(|config| hotel.map_or(true, |wanted| config.hotel == wanted))
        .fold(BTreeMap::new(), |mut results, config| {
            results
                .entry(config.hotel.clone())
                .or_insert_with(|| assess(config));
            results
        })
}

pub fn configuration_score(store: &TabularStore, hotel: &str) -> Option<f64> {
    store
        .config_for(hotel)
        .map(|config| assess(config).config_score)
}

pub fn recommendations(store: &TabularStore, hotel: &str) -> Vec<Recommendation> {
    let Some(config) = store.config_for(hotel) else {
        return vec![Recommendation::new(
            RecommendationLevel::Info,
            "Hotel not found in channel configuration data",
        )];
    };
    let assessment = assess(config);
    let mut recommendations: Vec<Recommendation> = assessment
        .critical_issues
        .iter()
        .map(|issue| {
            let (level, message) = issue.action();
            Recommendation::new(level, message)
        })
        .collect();

    if assessment.availability < MINIMUM_AVAILABILITY {
        recommendations.push(Recommendation::new(
            RecommendationLevel::Advisory,
            format!(
                "Raise availability from {:.1}% to above {:.0}%",
                assessment.availability * 100.0,
                MINIMUM_AVAILABILITY * 100.0
            ),
        ));
    }

    if assessment.enabled_markets.len() < RECOMMENDED_MARKET_COUNT {
        recommendations.push(Recommendation::new(
            RecommendationLevel::Advisory,
            "Consider enabling more points of sale",
        ));
    }

    match assessment.status {
        ConfigurationStatus::Critical => recommendations.push(Recommendation::new(
            RecommendationLevel::Critical,
            "Channel configuration is deficient, review it with the technical team",
        )),
        ConfigurationStatus::Good => recommendations.push(Recommendation::new(
            RecommendationLevel::Advisory,
            "Channel configuration can still be optimized",
        )),
        ConfigurationStatus::Optimal => {}
    }

    if recommendations.is_empty() {
        recommendations.push(Recommendation::new(
            RecommendationLevel::Info,
            "Channel configuration is optimal",
        ));
    }

    recommendations
}

/// Portfolio-wide view over every configured hotel.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationDashboard {
    pub total_hotels: usize,
    pub well_configured: usize,
    pub needs_attention: usize,
    pub critical: usize,
    pub avg_config_score: f64,
    pub hotels: BTreeMap<String, ConfigurationAssessment>,
}

pub fn dashboard(store: &TabularStore) -> ConfigurationDashboard {
    let hotels = validate(store, None);
    let count = |status: ConfigurationStatus| {
        hotels
            .values()
            .filter(|assessment| assessment.status == status)
            .count()
    };
    let avg_config_score = if hotels.is_empty() {
        0.0
    } else {
        let total: f64 = hotels
            .values()
            .map(|assessment| assessment.config_score)
            .sum();
        round_to(total / hotels.len() as f64, 1)
    };

    ConfigurationDashboard {
        total_hotels: hotels.len(),
        well_configured: count(ConfigurationStatus::Optimal),
        needs_attention: count(ConfigurationStatus::Good),
        critical: count(ConfigurationStatus::Critical),
        avg_config_score,
        hotels,
    }
}
