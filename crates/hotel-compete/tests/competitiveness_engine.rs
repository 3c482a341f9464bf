use hotel_compete::analysis::{
    CompetitivenessEngine, ConfigurationStatus, EngineConfig, EngineError, MarketPosition,
    OpportunityType, Priority, SimulationOutcome,
};
use hotel_compete::datasets::DatasetLoader;
use hotel_compete::routing::{QueryResponse, Session};
use std::io::Cursor;
use std::sync::Arc;

const INTERNAL: &str = include_str!("fixtures/internal_rates.csv");
const EXTERNAL: &str = include_str!("fixtures/external_offers.csv");
const CHANNEL: &str = include_str!("fixtures/channel_config.csv");

fn engine() -> CompetitivenessEngine {
    let store = DatasetLoader::from_readers(
        Cursor::new(INTERNAL),
        Cursor::new(EXTERNAL),
        Cursor::new(CHANNEL),
    )
    .expect("fixtures load");
    CompetitivenessEngine::new(store, EngineConfig::default())
}

#[test]
fn fully_configured_hotel_scores_every_component() {
    let engine = engine();
    let breakdown = engine.score_breakdown("Hotel Sol");

    assert_eq!(breakdown.price, 50.0);
    assert_eq!(breakdown.availability, 100.0);
    assert!((breakdown.consistency - 85.857_864).abs() < 1e-4);
    assert_eq!(breakdown.configuration, 100.0);
    // 15 + 25 + 21.46 + 20
    assert_eq!(engine.score("Hotel Sol"), 81.46);
}

#[test]
fn undefined_gaps_are_excluded_rather_than_zeroed() {
    let engine = engine();
    let breakdown = engine.score_breakdown("Hotel Luna");

    assert_eq!(breakdown.price, 0.0);
    assert_eq!(breakdown.consistency, 0.0);
    assert_eq!(breakdown.availability, 100.0);
    assert_eq!(breakdown.configuration, 0.0);
    assert_eq!(breakdown.total, 25.0);

    let summary = engine.hotel_summary("Hotel Luna");
    assert_eq!(summary.total_external_records, 1);
    assert_eq!(summary.total_internal_records, 1);
    assert_eq!(summary.markets, vec!["AR".to_string()]);
    assert!(summary.configuration.is_none());
    let offers = summary.offers.expect("offer metrics present");
    assert_eq!(offers.avg_price_gap_pct, None);
    assert_eq!(offers.competitive_positions, 0);
}

#[test]
fn unknown_hotels_score_zero_and_are_not_simulated() {
    let engine = engine();
    assert_eq!(engine.score("Hotel Mar"), 0.0);
    assert!(engine.opportunities("Hotel Mar").is_empty());

    match engine.simulate("Hotel Mar", -10.0).expect("valid change") {
        SimulationOutcome::NotFound { hotel } => assert_eq!(hotel, "Hotel Mar"),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn markets_are_classified_by_their_own_gaps() {
    let opportunities = engine().opportunities("Hotel Sol");
    assert_eq!(opportunities.len(), 2);

    let ar = &opportunities["AR"];
    assert_eq!(ar.avg_price_gap_pct, Some(10.0));
    assert_eq!(ar.opportunity_type, OpportunityType::Monitor);
    assert_eq!(ar.priority, Priority::Low);

    let br = &opportunities["BR"];
    assert_eq!(br.opportunity_type, OpportunityType::RaisePrices);
    assert_eq!(br.priority, Priority::Medium);
    assert_eq!(br.agency_count, 1);
}

#[test]
fn two_row_hotels_only_flag_anomalies_below_the_spread() {
    let engine = engine();
    assert!(engine
        .anomalies("Hotel Sol", None)
        .expect("default threshold")
        .is_empty());

    let loose = engine
        .anomalies("Hotel Sol", Some(0.5))
        .expect("valid threshold");
    assert_eq!(loose.len(), 2);
    assert!(loose.iter().all(|anomaly| anomaly.price_gap_pct.abs() == 10.0));

    assert!(engine
        .anomalies("Hotel Luna", Some(0.5))
        .expect("valid threshold")
        .is_empty());
    assert_eq!(
        engine.anomalies("Hotel Sol", Some(-1.0)),
        Err(EngineError::InvalidThreshold(-1.0))
    );
}

#[test]
fn cross_market_matches_rates_within_fifteen_percent() {
    let analysis = engine()
        .cross_market("Hotel Sol", 100.0)
        .expect("valid price");

    assert!(analysis.match_found);
    assert_eq!(analysis.rates_compared, 2);
    assert_eq!(analysis.matches.len(), 1);
    assert_eq!(analysis.matches[0].market, "BR");
    assert_eq!(analysis.matches[0].difference_pct, 4.76);
}

#[test]
fn price_cut_projects_more_winning_positions() {
    let outcome = engine().simulate("Hotel Sol", -25.0).expect("valid change");
    let SimulationOutcome::Projected(simulation) = outcome else {
        panic!("Hotel Sol has offers");
    };

    assert_eq!(simulation.current_avg_gap_pct, Some(0.0));
    assert_eq!(simulation.new_avg_gap_pct, Some(-25.0));
    assert_eq!(simulation.current_competitive_positions, 1);
    assert_eq!(simulation.new_competitive_positions, 2);
    assert_eq!(simulation.total_positions, 2);
    assert_eq!(simulation.competitiveness_change_pct, 50.0);
    assert_eq!(simulation.configuration_multiplier, 1.0);
    assert_eq!(simulation.estimated_conversion_change_pct, 25.0);
}

#[test]
fn dashboard_covers_hotels_without_offers() {
    let dashboard = engine().configuration_dashboard();

    assert_eq!(dashboard.total_hotels, 2);
    assert_eq!(dashboard.well_configured, 1);
    assert_eq!(dashboard.critical, 1);
    assert_eq!(dashboard.avg_config_score, 50.0);

    let mar = &dashboard.hotels["Hotel Mar"];
    assert_eq!(mar.config_score, 0.0);
    assert_eq!(mar.status, ConfigurationStatus::Critical);
    assert_eq!(mar.critical_issues.len(), 5);
}

#[test]
fn market_comparison_reports_position_per_market() {
    let comparison = engine().market_price_comparison("Hotel Sol");
    let position = |market: &str| {
        comparison
            .iter()
            .find(|row| row.market == market)
            .map(|row| row.position)
    };

    assert_eq!(position("AR"), Some(MarketPosition::Losing));
    assert_eq!(position("BR"), Some(MarketPosition::Winning));
}

#[test]
fn pricing_advice_for_a_healthy_hotel_is_low_priority() {
    let pricing = engine().pricing_recommendations("Hotel Sol");
    assert_eq!(pricing.priority, Priority::Low);
    assert!(!pricing.recommendations.is_empty());
}

#[test]
fn session_keeps_the_selected_hotel_between_questions() {
    let mut session = Session::new(Arc::new(engine()));

    let response = session.ask("elegir Hotel Sol").expect("selection succeeds");
    assert!(matches!(response, QueryResponse::HotelSelected { .. }));
    assert_eq!(session.selected_hotel(), Some("Hotel Sol"));

    let response = session.ask("simulate -25%").expect("simulation succeeds");
    match response {
        QueryResponse::Simulation { outcome } => {
            assert!(matches!(outcome, SimulationOutcome::Projected(_)));
        }
        other => panic!("expected a simulation, got {other:?}"),
    }
}
