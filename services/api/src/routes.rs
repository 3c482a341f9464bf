use crate::infra::AppState;
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use hotel_compete::analysis::{
    ConfigurationAssessment, ConfigurationDashboard, CrossMarketAnalysis, HotelSummary,
    MarketOpportunity, MarketPriceComparison, PriceAnomaly, PricePatterns,
    PricingRecommendations, Recommendation, ScoreBreakdown, SimulationOutcome,
};
use hotel_compete::datasets::DatasetSources;
use hotel_compete::error::AppError;
use hotel_compete::routing::{dispatch, QueryResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::info;

/// Either three file paths on the server or the three CSV bodies inline.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LoadRequest {
    Paths {
        internal_rates: PathBuf,
        external_offers: PathBuf,
        channel_config: PathBuf,
    },
    Inline {
        internal_csv: String,
        external_csv: String,
        channel_csv: String,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct LoadResponse {
    pub(crate) hotels: Vec<String>,
    pub(crate) internal_rates: usize,
    pub(crate) external_offers: usize,
    pub(crate) channel_configs: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct HotelConfigurationResponse {
    pub(crate) hotel: String,
    pub(crate) assessment: Option<ConfigurationAssessment>,
    pub(crate) recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) hotel: String,
    pub(crate) score: f64,
    pub(crate) breakdown: ScoreBreakdown,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecommendationsResponse {
    pub(crate) hotel: String,
    pub(crate) pricing: PricingRecommendations,
    pub(crate) configuration: Vec<Recommendation>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PatternsResponse {
    pub(crate) hotel: String,
    pub(crate) patterns: PricePatterns,
    pub(crate) market_comparison: Vec<MarketPriceComparison>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnomalyQuery {
    pub(crate) threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CrossMarketQuery {
    pub(crate) price: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SimulationQuery {
    pub(crate) change: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AskRequest {
    #[serde(default)]
    pub(crate) hotel: Option<String>,
    pub(crate) query: String,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/datasets/load", post(load_endpoint))
        .route("/api/v1/hotels", get(hotels_endpoint))
        .route("/api/v1/configuration", get(configuration_dashboard_endpoint))
        .route("/api/v1/ask", post(ask_endpoint))
        .route("/api/v1/hotels/:hotel/summary", get(summary_endpoint))
        .route(
            "/api/v1/hotels/:hotel/configuration",
            get(hotel_configuration_endpoint),
        )
        .route("/api/v1/hotels/:hotel/score", get(score_endpoint))
        .route(
            "/api/v1/hotels/:hotel/opportunities",
            get(opportunities_endpoint),
        )
        .route("/api/v1/hotels/:hotel/anomalies", get(anomalies_endpoint))
        .route(
            "/api/v1/hotels/:hotel/cross-market",
            get(cross_market_endpoint),
        )
        .route("/api/v1/hotels/:hotel/simulation", get(simulation_endpoint))
        .route(
            "/api/v1/hotels/:hotel/recommendations",
            get(recommendations_endpoint),
        )
        .route("/api/v1/hotels/:hotel/patterns", get(patterns_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let label = if ready { "ready" } else { "initializing" };
    let payload = json!({
        "status": label,
        "datasets_loaded": state.engines.is_loaded(),
    });

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn load_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<LoadRequest>,
) -> Result<Json<LoadResponse>, AppError> {
    // File reads and CSV parsing block; keep them off the async workers.
    let engines = state.engines.clone();
    let engine = tokio::task::spawn_blocking(move || match request {
        LoadRequest::Paths {
            internal_rates,
            external_offers,
            channel_config,
        } => engines.load(&DatasetSources {
            internal_rates,
            external_offers,
            channel_config,
        }),
        LoadRequest::Inline {
            internal_csv,
            external_csv,
            channel_csv,
        } => engines.load_from_readers(
            Cursor::new(internal_csv.into_bytes()),
            Cursor::new(external_csv.into_bytes()),
            Cursor::new(channel_csv.into_bytes()),
        ),
    })
    .await
    .map_err(|error| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, error)))??;

    let store = engine.store();
    info!(hotels = store.hotels().len(), "datasets loaded over http");
    Ok(Json(LoadResponse {
        hotels: store.hotels(),
        internal_rates: store.internal_rates().len(),
        external_offers: store.external_offers().len(),
        channel_configs: store.channel_configs().len(),
    }))
}

pub(crate) async fn hotels_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = state.engine()?;
    Ok(Json(json!({ "hotels": engine.available_hotels() })))
}

pub(crate) async fn configuration_dashboard_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<ConfigurationDashboard>, AppError> {
    Ok(Json(state.engine()?.configuration_dashboard()))
}

pub(crate) async fn ask_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let engine = state.engine()?;
    let response = dispatch(&engine, request.hotel.as_deref(), &request.query)?;
    Ok(Json(response))
}

pub(crate) async fn summary_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
) -> Result<Json<HotelSummary>, AppError> {
    Ok(Json(state.engine()?.hotel_summary(&hotel)))
}

pub(crate) async fn hotel_configuration_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
) -> Result<Json<HotelConfigurationResponse>, AppError> {
    let engine = state.engine()?;
    let assessment = engine.configuration(Some(&hotel)).remove(&hotel);
    let recommendations = engine.configuration_recommendations(&hotel);
    Ok(Json(HotelConfigurationResponse {
        hotel,
        assessment,
        recommendations,
    }))
}

pub(crate) async fn score_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
) -> Result<Json<ScoreResponse>, AppError> {
    let breakdown = state.engine()?.score_breakdown(&hotel);
    Ok(Json(ScoreResponse {
        hotel,
        score: breakdown.total,
        breakdown,
    }))
}

pub(crate) async fn opportunities_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
) -> Result<Json<BTreeMap<String, MarketOpportunity>>, AppError> {
    Ok(Json(state.engine()?.opportunities(&hotel)))
}

pub(crate) async fn anomalies_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
    Query(query): Query<AnomalyQuery>,
) -> Result<Json<Vec<PriceAnomaly>>, AppError> {
    Ok(Json(state.engine()?.anomalies(&hotel, query.threshold)?))
}

pub(crate) async fn cross_market_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
    Query(query): Query<CrossMarketQuery>,
) -> Result<Json<CrossMarketAnalysis>, AppError> {
    Ok(Json(state.engine()?.cross_market(&hotel, query.price)?))
}

pub(crate) async fn simulation_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
    Query(query): Query<SimulationQuery>,
) -> Result<Json<SimulationOutcome>, AppError> {
    Ok(Json(state.engine()?.simulate(&hotel, query.change)?))
}

pub(crate) async fn recommendations_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let engine = state.engine()?;
    Ok(Json(RecommendationsResponse {
        pricing: engine.pricing_recommendations(&hotel),
        configuration: engine.configuration_recommendations(&hotel),
        hotel,
    }))
}

pub(crate) async fn patterns_endpoint(
    Extension(state): Extension<AppState>,
    Path(hotel): Path<String>,
) -> Result<Json<PatternsResponse>, AppError> {
    let engine = state.engine()?;
    Ok(Json(PatternsResponse {
        patterns: engine.price_patterns(&hotel),
        market_comparison: engine.market_price_comparison(&hotel),
        hotel,
    }))
}
