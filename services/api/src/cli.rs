use crate::infra::{load_engine, DatasetArgs};
use crate::report::{render_cross_market, render_hotel_report, render_simulation};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hotel_compete::config::AppConfig;
use hotel_compete::error::AppError;
use hotel_compete::routing::Session;
use std::io::Write;

#[derive(Parser, Debug)]
#[command(
    name = "Hotel Competitiveness Engine",
    about = "Score hotel price competitiveness against market competitors",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the hotels present in the external offer data
    Hotels(DatasetArgs),
    /// Print the competitiveness report for one hotel
    Report(ReportArgs),
    /// Project the effect of a price change
    Simulate(SimulateArgs),
    /// Compare an observed per-night price against every contracted market rate
    CrossMarket(CrossMarketArgs),
    /// Answer a free-text question about a hotel
    Ask(AskArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long)]
    hotel: String,
    /// Number of price anomalies to list (0 skips the scan)
    #[arg(long, default_value_t = 5)]
    anomalies: usize,
    #[command(flatten)]
    datasets: DatasetArgs,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long)]
    hotel: String,
    /// Price change in percent, e.g. -10 or 5
    #[arg(long, allow_hyphen_values = true)]
    change: f64,
    #[command(flatten)]
    datasets: DatasetArgs,
}

#[derive(Args, Debug)]
struct CrossMarketArgs {
    #[arg(long)]
    hotel: String,
    /// Observed per-night price
    #[arg(long)]
    price: f64,
    #[command(flatten)]
    datasets: DatasetArgs,
}

#[derive(Args, Debug)]
struct AskArgs {
    /// Hotel to select before asking
    #[arg(long)]
    hotel: Option<String>,
    /// Question, e.g. "simulate -10%" or "configuración b2b"
    #[arg(allow_hyphen_values = true)]
    query: String,
    #[command(flatten)]
    datasets: DatasetArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Hotels(datasets) => {
            let config = AppConfig::load()?;
            let engine = load_engine(&config, datasets)?;
            for hotel in engine.available_hotels() {
                println!("{hotel}");
            }
            Ok(())
        }
        Command::Report(args) => {
            let config = AppConfig::load()?;
            let engine = load_engine(&config, args.datasets)?;
            print!("{}", render_hotel_report(&engine, &args.hotel, args.anomalies));
            Ok(())
        }
        Command::Simulate(args) => {
            let config = AppConfig::load()?;
            let engine = load_engine(&config, args.datasets)?;
            let outcome = engine.simulate(&args.hotel, args.change)?;
            print!("{}", render_simulation(&outcome));
            Ok(())
        }
        Command::CrossMarket(args) => {
            let config = AppConfig::load()?;
            let engine = load_engine(&config, args.datasets)?;
            let analysis = engine.cross_market(&args.hotel, args.price)?;
            print!("{}", render_cross_market(&analysis));
            Ok(())
        }
        Command::Ask(args) => {
            let config = AppConfig::load()?;
            let engine = load_engine(&config, args.datasets)?;
            let mut session = match args.hotel {
                Some(hotel) => Session::with_hotel(engine, hotel),
                None => Session::new(engine),
            };
            let response = session.ask(&args.query)?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, &response).map_err(std::io::Error::from)?;
            writeln!(out)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definitions_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_accepts_negative_changes() {
        let cli = Cli::try_parse_from([
            "hotel-compete",
            "simulate",
            "--hotel",
            "Hotel Sol",
            "--change",
            "-10",
            "--internal",
            "internal.csv",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Simulate(args)) => {
                assert_eq!(args.change, -10.0);
                assert_eq!(args.hotel, "Hotel Sol");
                assert!(args.datasets.internal_rates.is_some());
                assert!(args.datasets.external_offers.is_none());
            }
            other => panic!("expected simulate command, got {other:?}"),
        }
    }

    #[test]
    fn ask_takes_the_question_positionally() {
        let cli = Cli::try_parse_from([
            "hotel-compete",
            "ask",
            "--hotel",
            "Hotel Sol",
            "simular -5%",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Ask(args)) => {
                assert_eq!(args.query, "simular -5%");
                assert_eq!(args.hotel.as_deref(), Some("Hotel Sol"));
            }
            other => panic!("expected ask command, got {other:?}"),
        }
    }
}
