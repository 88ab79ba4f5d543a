use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use startup_valuation_core::report::SensitivityReport;
use startup_valuation_core::scenarios::sensitivity::{self, SensitivityInput, SweepRange};

use super::startup::{load_startup, StartupArgs};
use crate::input;

/// Arguments for the WACC x terminal growth grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML sweep input ({ base, wacc_range, growth_range, steps })
    #[arg(long)]
    pub input: Option<String>,

    /// Path to JSON/YAML startup profile used as the base case
    #[arg(long)]
    pub base_inputs: Option<String>,

    /// WACC sweep as min:max
    #[arg(long, default_value = "0.10:0.20")]
    pub wacc_range: String,

    /// Terminal growth sweep as min:max
    #[arg(long, default_value = "0.02:0.05")]
    pub growth_range: String,

    /// Points per axis
    #[arg(long, default_value = "5")]
    pub steps: usize,

    #[command(flatten)]
    pub startup: StartupArgs,
}

fn parse_range(spec: &str) -> Result<SweepRange, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("Sweep range must be min:max, got '{spec}'").into());
    }
    let min: Decimal = parts[0].trim().parse()?;
    let max: Decimal = parts[1].trim().parse()?;
    Ok(SweepRange::new(min, max))
}

pub fn run_sensitivity(
    args: SensitivityArgs,
    summary: bool,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sweep: SensitivityInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else {
        SensitivityInput {
            base: load_startup(args.base_inputs.as_deref(), &args.startup)?,
            wacc_range: parse_range(&args.wacc_range)?,
            growth_range: parse_range(&args.growth_range)?,
            steps: args.steps,
        }
    };

    let result = sensitivity::wacc_growth_sensitivity(&sweep)?;

    if !summary {
        return Ok(serde_json::to_value(result)?);
    }

    let report = SensitivityReport::from(&result.result);
    Ok(serde_json::json!({
        "results": report.records(),
        "methodology": result.methodology,
        "warnings": result.warnings,
        "metadata": result.metadata,
    }))
}
