use hotel_compete::analysis::{
    CompetitivenessEngine, CrossMarketAnalysis, PriceChangeSimulation, SimulationOutcome,
};
use std::fmt::Write as _;

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:+.2}%"))
}

/// Scorecard, market posture, anomalies and recommendations for one hotel.
pub(crate) fn render_hotel_report(
    engine: &CompetitivenessEngine,
    hotel: &str,
    anomalies: usize,
) -> String {
    let summary = engine.hotel_summary(hotel);
    let breakdown = engine.score_breakdown(hotel);
    let mut out = String::new();

    let _ = writeln!(out, "Competitiveness report: {}", summary.hotel);
    let _ = writeln!(
        out,
        "Records: {} external offers, {} contracted rates, markets [{}]",
        summary.total_external_records,
        summary.total_internal_records,
        summary.markets.join(", ")
    );
    let _ = writeln!(
        out,
        "Score {:.2}/100 (price {:.1}, availability {:.1}, consistency {:.1}, configuration {:.1})",
        breakdown.total,
        breakdown.price,
        breakdown.availability,
        breakdown.consistency,
        breakdown.configuration
    );

    if let Some(offers) = &summary.offers {
        let _ = writeln!(
            out,
            "Average gap {} | volatility {} | winning {}/{} searches | {} agencies",
            pct(offers.avg_price_gap_pct),
            offers
                .price_volatility
                .map_or_else(|| "n/a".to_string(), |value| format!("{value:.2}")),
            offers.competitive_positions,
            offers.total_searches,
            offers.agencies
        );
    }

    match &summary.configuration {
        Some(configuration) => {
            let _ = writeln!(
                out,
                "\nChannel configuration: {:.1} ({}, {} priority)",
                configuration.config_score,
                configuration.status.label(),
                configuration.priority.label()
            );
            for issue in configuration.critical_issue_labels() {
                let _ = writeln!(out, "- {issue}");
            }
        }
        None => {
            let _ = writeln!(out, "\nChannel configuration: not found");
        }
    }

    let opportunities = engine.opportunities(hotel);
    if opportunities.is_empty() {
        let _ = writeln!(out, "\nMarket opportunities: none");
    } else {
        let _ = writeln!(out, "\nMarket opportunities");
        for opportunity in opportunities.values() {
            let _ = writeln!(
                out,
                "- {}: {} ({} priority), gap {}, {} searches, score {:.2}",
                opportunity.market,
                opportunity.opportunity_type.label(),
                opportunity.priority.label(),
                pct(opportunity.avg_price_gap_pct),
                opportunity.search_volume,
                opportunity.opportunity_score
            );
        }
    }

    if anomalies > 0 {
        match engine.anomalies(hotel, None) {
            Ok(found) if found.is_empty() => {
                let _ = writeln!(out, "\nPrice anomalies: none");
            }
            Ok(found) => {
                let _ = writeln!(out, "\nPrice anomalies");
                for anomaly in found.iter().take(anomalies) {
                    let _ = writeln!(
                        out,
                        "- {} {} via {}: gap {:+.2}% (z {:.2})",
                        anomaly.check_in,
                        anomaly.market,
                        anomaly.agency,
                        anomaly.price_gap_pct,
                        anomaly.z_score
                    );
                }
            }
            Err(error) => {
                let _ = writeln!(out, "\nPrice anomalies unavailable: {error}");
            }
        }
    }

    let pricing = engine.pricing_recommendations(hotel);
    let _ = writeln!(out, "\nRecommendations ({} priority)", pricing.priority.label());
    for recommendation in pricing
        .recommendations
        .iter()
        .chain(engine.configuration_recommendations(hotel).iter())
    {
        let _ = writeln!(out, "- {recommendation}");
    }

    out
}

pub(crate) fn render_simulation(outcome: &SimulationOutcome) -> String {
    let simulation: &PriceChangeSimulation = match outcome {
        SimulationOutcome::NotFound { hotel } => {
            return format!("Simulation: hotel '{hotel}' has no external offers\n")
        }
        SimulationOutcome::Projected(simulation) => simulation,
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Simulation for {}: price change {:+.1}%",
        simulation.hotel, simulation.price_change_pct
    );
    let _ = writeln!(
        out,
        "- gap vs competitors: {} -> {}",
        pct(simulation.current_avg_gap_pct),
        pct(simulation.new_avg_gap_pct)
    );
    let _ = writeln!(
        out,
        "- winning positions: {}/{} -> {}/{}",
        simulation.current_competitive_positions,
        simulation.total_positions,
        simulation.new_competitive_positions,
        simulation.total_positions
    );
    let _ = writeln!(
        out,
        "- estimated conversion change: {:+.2}%",
        simulation.estimated_conversion_change_pct
    );
    if simulation.configuration_impact_pct != 0.0 {
        let _ = writeln!(
            out,
            "- channel configuration factor: {:+.1}%",
            simulation.configuration_impact_pct
        );
    }
    out
}

pub(crate) fn render_cross_market(analysis: &CrossMarketAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Cross-market check for {} at {:.2} per night: {} ({} contracted rates compared)",
        analysis.hotel, analysis.observed_price, analysis.analysis, analysis.rates_compared
    );
    for matched in &analysis.matches {
        let _ = writeln!(
            out,
            "- {}: contracted {:.2} {} ({:.2}% away)",
            matched.market, matched.contracted_rate, matched.currency, matched.difference_pct
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_compete::analysis::EngineConfig;
    use hotel_compete::session::EngineHandle;
    use std::io::Cursor;

    const INTERNAL: &str = "Nombre_Hotel,PoS,PamBaseRate ($),contractcurrencybase_pam\nHotel Sol,AR,100,USD\n";
    const EXTERNAL: &str = "Nombre_Hotel,PoS,check_in,check_out,los,adults,children,price_despegar (USD),buyers_best_price_competitor_total (USD),agency_name\nHotel Sol,AR,05/03/2024,07/03/2024,2,2,0,200,220,Agency One\nHotel Sol,BR,06/03/2024,08/03/2024,2,2,0,200,180,Agency Two\n";
    const CHANNEL: &str = "Hotel,Api_Tildado,HTML_Tildado,availableWrapper,PrepagoActivo,Rate_type,Pos_Tildado,Disponibilidad\nHotel Sol,No,Sí,1,Sí,STANDALONE,AR,0.95\n";

    fn engine() -> std::sync::Arc<CompetitivenessEngine> {
        EngineHandle::new(EngineConfig::default())
            .load_from_readers(Cursor::new(INTERNAL), Cursor::new(EXTERNAL), Cursor::new(CHANNEL))
            .expect("fixtures load")
    }

    #[test]
    fn hotel_report_lists_issues_and_markets() {
        let report = render_hotel_report(&engine(), "Hotel Sol", 5);
        assert!(report.contains("Competitiveness report: Hotel Sol"));
        assert!(report.contains("- API not configured"));
        assert!(report.contains("- STANDALONE rate type not recommended"));
        assert!(report.contains("- AR: monitor (low priority)"));
        assert!(report.contains("- BR: raise prices (medium priority)"));
        assert!(report.contains("Price anomalies: none"));
    }

    #[test]
    fn simulation_report_handles_unknown_hotels() {
        let outcome = engine().simulate("Hotel Mar", -5.0).expect("valid change");
        assert!(render_simulation(&outcome).contains("no external offers"));

        let outcome = engine().simulate("Hotel Sol", -10.0).expect("valid change");
        let rendered = render_simulation(&outcome);
        assert!(rendered.contains("price change -10.0%"));
        assert!(rendered.contains("winning positions: 1/2 -> 1/2"));
    }

    #[test]
    fn cross_market_report_lists_matches() {
        let analysis = engine().cross_market("Hotel Sol", 105.0).expect("valid price");
        let rendered = render_cross_market(&analysis);
        assert!(rendered.contains("- AR: contracted 100.00 USD (5.00% away)"));
    }
}
