use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use startup_valuation_core::valuation::inputs::{ClinicalStage, RevenueModel, StartupInputs};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StageArg {
    PreClinical,
    Pilot,
    Validated,
    FdaCleared,
    Reimbursed,
}

impl From<StageArg> for ClinicalStage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::PreClinical => ClinicalStage::PreClinical,
            StageArg::Pilot => ClinicalStage::Pilot,
            StageArg::Validated => ClinicalStage::Validated,
            StageArg::FdaCleared => ClinicalStage::FdaCleared,
            StageArg::Reimbursed => ClinicalStage::Reimbursed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RevenueModelArg {
    B2bSaas,
    B2cSubscription,
    PayerContract,
    ProviderLicense,
    Hybrid,
}

impl From<RevenueModelArg> for RevenueModel {
    fn from(arg: RevenueModelArg) -> Self {
        match arg {
            RevenueModelArg::B2bSaas => RevenueModel::B2BSaaS,
            RevenueModelArg::B2cSubscription => RevenueModel::B2CSubscription,
            RevenueModelArg::PayerContract => RevenueModel::PayerContract,
            RevenueModelArg::ProviderLicense => RevenueModel::ProviderLicense,
            RevenueModelArg::Hybrid => RevenueModel::Hybrid,
        }
    }
}

/// Startup profile flags shared by `dcf`, `project` and `sensitivity`.
#[derive(Args, Debug)]
#[command(allow_hyphen_values = true)]
pub struct StartupArgs {
    /// Company name
    #[arg(long, default_value = "Startup")]
    pub name: String,

    /// Current revenue in $M
    #[arg(long)]
    pub current_revenue: Option<Decimal>,

    /// Comma-separated yearly growth rates (e.g. 0.80,0.60,0.45,0.35,0.25)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub growth_rates: Vec<Decimal>,

    /// Terminal (perpetuity) growth rate
    #[arg(long)]
    pub terminal_growth: Option<Decimal>,

    /// Gross margin
    #[arg(long)]
    pub gross_margin: Option<Decimal>,

    /// Operating margin reached in the final projection year
    #[arg(long)]
    pub operating_margin_target: Option<Decimal>,

    /// Discount rate (WACC)
    #[arg(long)]
    pub wacc: Option<Decimal>,

    /// Revenue model
    #[arg(long, value_enum, default_value = "b2b-saas")]
    pub revenue_model: RevenueModelArg,

    /// Clinical / regulatory stage
    #[arg(long, value_enum, default_value = "validated")]
    pub stage: StageArg,

    /// Projection years (defaults to the number of growth rates)
    #[arg(long)]
    pub years: Option<u32>,
}

impl StartupArgs {
    pub fn to_inputs(&self) -> Result<StartupInputs, Box<dyn std::error::Error>> {
        if self.growth_rates.is_empty() {
            return Err("--growth-rates is required (or provide --input)".into());
        }

        Ok(StartupInputs {
            name: self.name.clone(),
            current_revenue: self
                .current_revenue
                .ok_or("--current-revenue is required (or provide --input)")?,
            revenue_growth_rates: self.growth_rates.clone(),
            terminal_growth_rate: self
                .terminal_growth
                .ok_or("--terminal-growth is required (or provide --input)")?,
            gross_margin: self
                .gross_margin
                .ok_or("--gross-margin is required (or provide --input)")?,
            operating_margin_target: self
                .operating_margin_target
                .ok_or("--operating-margin-target is required (or provide --input)")?,
            wacc: self.wacc.ok_or("--wacc is required (or provide --input)")?,
            revenue_model: self.revenue_model.into(),
            clinical_stage: self.stage.into(),
            years_to_project: self.years.unwrap_or(self.growth_rates.len() as u32),
        })
    }
}

/// `--input` file, then piped stdin, then individual flags.
pub fn load_startup(
    path: Option<&str>,
    flags: &StartupArgs,
) -> Result<StartupInputs, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_document(path)
    } else if let Some(inputs) = input::stdin::read_stdin()? {
        Ok(inputs)
    } else {
        flags.to_inputs()
    }
}
