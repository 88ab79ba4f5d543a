use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use startup_valuation_core::report::{CompsReport, DcfReport, ProjectionReportRow};
use startup_valuation_core::valuation::comps::{self, CompsInput};
use startup_valuation_core::valuation::dcf;
use startup_valuation_core::valuation::peers::{collect_comparables, PeerTicker, DEFAULT_PEERS};

use super::startup::{load_startup, StartupArgs};
use crate::input;
use crate::input::peers_csv::CsvPeerSource;

/// Arguments for the stage risk-adjusted DCF
#[derive(Args)]
pub struct DcfArgs {
    /// Path to JSON/YAML startup profile (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub startup: StartupArgs,
}

/// Arguments for the projection table
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON/YAML startup profile (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub startup: StartupArgs,
}

/// Arguments for comparable company analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompsArgs {
    /// Path to JSON/YAML comps input with the peer set already collected
    #[arg(long)]
    pub input: Option<String>,

    /// CSV of raw peer fundamentals
    /// (ticker,market_cap,total_revenue,enterprise_value,revenue_growth)
    #[arg(long)]
    pub peers_csv: Option<String>,

    /// Target company revenue in $M
    #[arg(long)]
    pub target_revenue: Option<Decimal>,

    /// Target company revenue growth
    #[arg(long)]
    pub target_growth: Option<Decimal>,

    /// Comma-separated peer tickers (defaults to the healthcare technology set)
    #[arg(long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Use raw median multiples without the growth premium
    #[arg(long)]
    pub no_growth_premium: bool,
}

pub fn run_dcf(args: DcfArgs, summary: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_startup(args.input.as_deref(), &args.startup)?;
    let result = dcf::calculate_dcf(&inputs)?;

    if summary {
        Ok(serde_json::to_value(result.map(|out| DcfReport::from(&out)))?)
    } else {
        Ok(serde_json::to_value(result)?)
    }
}

pub fn run_project(args: ProjectArgs, summary: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_startup(args.input.as_deref(), &args.startup)?;
    let rows = dcf::project_financials(&inputs)?;

    let results = if summary {
        let report: Vec<ProjectionReportRow> = rows.iter().map(ProjectionReportRow::from).collect();
        serde_json::to_value(report)?
    } else {
        serde_json::to_value(rows)?
    };

    Ok(serde_json::json!({
        "name": inputs.name,
        "results": results,
    }))
}

pub fn run_comps(args: CompsArgs, summary: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let comps_input: CompsInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        build_comps_input(&args)?
    };

    let result = comps::calculate_comps(&comps_input)?;

    if summary {
        Ok(serde_json::to_value(result.map(|out| CompsReport::from(&out)))?)
    } else {
        Ok(serde_json::to_value(result)?)
    }
}

fn build_comps_input(args: &CompsArgs) -> Result<CompsInput, Box<dyn std::error::Error>> {
    let csv_path = args
        .peers_csv
        .as_deref()
        .ok_or("--peers-csv <file.csv> or --input <file.json> is required for comps analysis")?;
    let source = CsvPeerSource::from_path(csv_path)?;

    let peers = select_peers(&args.tickers);
    let comparables = collect_comparables(&source, &peers);

    Ok(CompsInput {
        target_revenue: args
            .target_revenue
            .ok_or("--target-revenue is required (or provide --input)")?,
        target_growth: args
            .target_growth
            .ok_or("--target-growth is required (or provide --input)")?,
        comparables,
        apply_growth_premium: !args.no_growth_premium,
    })
}

/// Requested tickers, named from the default set where known.
fn select_peers(tickers: &[String]) -> Vec<PeerTicker<'_>> {
    if tickers.is_empty() {
        return DEFAULT_PEERS.to_vec();
    }

    tickers
        .iter()
        .map(|t| {
            let name = DEFAULT_PEERS
                .iter()
                .find(|p| p.ticker.eq_ignore_ascii_case(t))
                .map(|p| p.name)
                .unwrap_or(t.as_str());
            PeerTicker { ticker: t.as_str(), name }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_peer_selection() {
        let peers = select_peers(&[]);
        assert_eq!(peers.len(), 6);
        assert_eq!(peers[0].ticker, "TDOC");
    }

    #[test]
    fn test_custom_tickers_keep_known_names() {
        let tickers = vec!["veev".to_string(), "ZZZZ".to_string()];
        let peers = select_peers(&tickers);
        assert_eq!(peers[0].name, "Veeva Systems");
        assert_eq!(peers[1].name, "ZZZZ");
    }
}
