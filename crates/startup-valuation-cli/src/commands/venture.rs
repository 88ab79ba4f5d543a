use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use startup_valuation_core::report::VcReport;
use startup_valuation_core::venture::vc_method::{self, VcMethodInput};

use crate::input;

/// Arguments for the VC method
#[derive(Args)]
pub struct VcArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current revenue in $M
    #[arg(long)]
    pub current_revenue: Option<Decimal>,

    /// Revenue expected in the exit year, $M
    #[arg(long, default_value = "100")]
    pub exit_revenue: Decimal,

    /// Years until exit
    #[arg(long, default_value = "5")]
    pub years_to_exit: u32,

    /// EV/Revenue multiple at exit
    #[arg(long, default_value = "8")]
    pub exit_multiple: Decimal,

    /// Required gross return multiple (5 for 5x)
    #[arg(long, default_value = "5")]
    pub target_return: Decimal,
}

pub fn run_vc(args: VcArgs, summary: bool) -> Result<Value, Box<dyn std::error::Error>> {
    let vc_input: VcMethodInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        VcMethodInput {
            current_revenue: args
                .current_revenue
                .ok_or("--current-revenue is required (or provide --input)")?,
            projected_exit_revenue: args.exit_revenue,
            years_to_exit: args.years_to_exit,
            exit_multiple: args.exit_multiple,
            target_return_multiple: args.target_return,
        }
    };

    let result = vc_method::calculate_vc_method(&vc_input)?;

    if summary {
        Ok(serde_json::to_value(result.map(|out| VcReport::from(&out)))?)
    } else {
        Ok(serde_json::to_value(result)?)
    }
}
