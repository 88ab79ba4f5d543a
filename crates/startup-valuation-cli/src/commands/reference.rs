use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use startup_valuation_core::report::format_pct;
use startup_valuation_core::valuation::inputs::{ClinicalStage, RevenueModel};
use startup_valuation_core::valuation::peers::DEFAULT_PEERS;

/// Arguments for listing stage risk factors
#[derive(Args)]
pub struct StagesArgs {
    /// Also list the supported revenue models
    #[arg(long)]
    pub revenue_models: bool,
}

pub fn run_stages(args: StagesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let stages: Vec<Value> = ClinicalStage::ALL
        .iter()
        .map(|stage| {
            json!({
                "stage": stage,
                "label": stage.to_string(),
                "risk_factor": stage.risk_factor(),
                "terminal_value_haircut": format_pct(Decimal::ONE - stage.risk_factor(), 0),
            })
        })
        .collect();

    if !args.revenue_models {
        return Ok(json!({ "results": stages }));
    }

    let models: Vec<Value> = RevenueModel::ALL
        .iter()
        .map(|model| json!({ "model": model, "label": model.to_string() }))
        .collect();
    Ok(json!({ "results": stages, "revenue_models": models }))
}

pub fn run_peers() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(json!({ "results": DEFAULT_PEERS }))
}
