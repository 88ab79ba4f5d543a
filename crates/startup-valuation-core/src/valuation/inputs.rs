use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValuationError;
use crate::types::{Money, Rate};
use crate::ValuationResult;

/// Default explicit forecast horizon in years.
pub const DEFAULT_YEARS_TO_PROJECT: u32 = 5;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// How the startup monetises. Carried as descriptive metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevenueModel {
    B2BSaaS,
    B2CSubscription,
    PayerContract,
    ProviderLicense,
    Hybrid,
}

impl RevenueModel {
    pub const ALL: [RevenueModel; 5] = [
        RevenueModel::B2BSaaS,
        RevenueModel::B2CSubscription,
        RevenueModel::PayerContract,
        RevenueModel::ProviderLicense,
        RevenueModel::Hybrid,
    ];
}

impl fmt::Display for RevenueModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevenueModel::B2BSaaS => write!(f, "B2B SaaS"),
            RevenueModel::B2CSubscription => write!(f, "B2C Subscription"),
            RevenueModel::PayerContract => write!(f, "Payer Contract"),
            RevenueModel::ProviderLicense => write!(f, "Provider License"),
            RevenueModel::Hybrid => write!(f, "Hybrid"),
        }
    }
}

/// Regulatory / clinical maturity, ordered from least to most mature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClinicalStage {
    PreClinical,
    Pilot,
    Validated,
    FdaCleared,
    Reimbursed,
}

impl ClinicalStage {
    pub const ALL: [ClinicalStage; 5] = [
        ClinicalStage::PreClinical,
        ClinicalStage::Pilot,
        ClinicalStage::Validated,
        ClinicalStage::FdaCleared,
        ClinicalStage::Reimbursed,
    ];

    /// Haircut applied multiplicatively to terminal value only.
    pub fn risk_factor(self) -> Rate {
        match self {
            ClinicalStage::PreClinical => dec!(0.40),
            ClinicalStage::Pilot => dec!(0.55),
            ClinicalStage::Validated => dec!(0.70),
            ClinicalStage::FdaCleared => dec!(0.85),
            ClinicalStage::Reimbursed => dec!(1.00),
        }
    }
}

impl fmt::Display for ClinicalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClinicalStage::PreClinical => write!(f, "Pre-Clinical/Concept"),
            ClinicalStage::Pilot => write!(f, "Pilot Studies"),
            ClinicalStage::Validated => write!(f, "Clinically Validated"),
            ClinicalStage::FdaCleared => write!(f, "FDA Cleared/CE Marked"),
            ClinicalStage::Reimbursed => write!(f, "Reimbursement Secured"),
        }
    }
}

// ---------------------------------------------------------------------------
// Input model
// ---------------------------------------------------------------------------

fn default_years_to_project() -> u32 {
    DEFAULT_YEARS_TO_PROJECT
}

/// Financial profile and healthcare classification of the startup being valued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupInputs {
    /// Display name
    pub name: String,
    /// Base-period revenue ($M)
    pub current_revenue: Money,
    /// Year-over-year growth for each projection year; length must equal `years_to_project`
    pub revenue_growth_rates: Vec<Rate>,
    /// Perpetuity growth beyond the explicit horizon
    pub terminal_growth_rate: Rate,
    /// Gross margin; seeds the operating margin ramp at 30% of its value
    pub gross_margin: Rate,
    /// Operating margin reached in the final projection year
    pub operating_margin_target: Rate,
    /// Discount rate
    pub wacc: Rate,
    pub revenue_model: RevenueModel,
    pub clinical_stage: ClinicalStage,
    #[serde(default = "default_years_to_project")]
    pub years_to_project: u32,
}

impl StartupInputs {
    /// Full validation, including the Gordon growth spread.
    pub fn validate(&self) -> ValuationResult<()> {
        self.validate_structure()?;

        if self.terminal_growth_rate >= self.wacc {
            return Err(ValuationError::FinancialImpossibility(format!(
                "Terminal growth rate ({}) must be less than WACC ({}) for the Gordon growth model",
                self.terminal_growth_rate, self.wacc
            )));
        }

        Ok(())
    }

    /// Everything except the WACC / terminal growth relationship.
    pub fn validate_structure(&self) -> ValuationResult<()> {
        if self.current_revenue <= Decimal::ZERO {
            return Err(ValuationError::invalid(
                "current_revenue",
                "Current revenue must be positive",
            ));
        }
        if self.years_to_project == 0 {
            return Err(ValuationError::invalid(
                "years_to_project",
                "At least one projection year is required",
            ));
        }
        if self.revenue_growth_rates.len() != self.years_to_project as usize {
            return Err(ValuationError::invalid(
                "revenue_growth_rates",
                format!(
                    "Expected {} growth rates (one per projection year), got {}",
                    self.years_to_project,
                    self.revenue_growth_rates.len()
                ),
            ));
        }
        if let Some((idx, g)) = self
            .revenue_growth_rates
            .iter()
            .enumerate()
            .find(|(_, g)| **g <= dec!(-1))
        {
            return Err(ValuationError::invalid(
                "revenue_growth_rates",
                format!("Growth rate for year {} ({g}) must be greater than -100%", idx + 1),
            ));
        }
        if self.gross_margin <= Decimal::ZERO || self.gross_margin > Decimal::ONE {
            return Err(ValuationError::invalid(
                "gross_margin",
                "Gross margin must be in (0, 1]",
            ));
        }
        if self.operating_margin_target > Decimal::ONE {
            return Err(ValuationError::invalid(
                "operating_margin_target",
                "Operating margin target cannot exceed 100%",
            ));
        }
        if self.wacc <= Decimal::ZERO {
            return Err(ValuationError::invalid("wacc", "WACC must be positive"));
        }

        Ok(())
    }

    /// Copy of these inputs with the discount rate and terminal growth replaced.
    pub fn with_discount_rates(&self, wacc: Rate, terminal_growth_rate: Rate) -> Self {
        StartupInputs {
            wacc,
            terminal_growth_rate,
            ..self.clone()
        }
    }

    pub fn risk_factor(&self) -> Rate {
        self.clinical_stage.risk_factor()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_inputs() -> StartupInputs {
        StartupInputs {
            name: "HealthTech Example Co".into(),
            current_revenue: dec!(15.0),
            revenue_growth_rates: vec![dec!(0.80), dec!(0.60), dec!(0.45), dec!(0.35), dec!(0.25)],
            terminal_growth_rate: dec!(0.03),
            gross_margin: dec!(0.70),
            operating_margin_target: dec!(0.20),
            wacc: dec!(0.15),
            revenue_model: RevenueModel::B2BSaaS,
            clinical_stage: ClinicalStage::Validated,
            years_to_project: 5,
        }
    }

    #[test]
    fn test_risk_factors_increase_with_maturity() {
        let factors: Vec<Rate> = ClinicalStage::ALL.iter().map(|s| s.risk_factor()).collect();
        for pair in factors.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(ClinicalStage::PreClinical.risk_factor(), dec!(0.4));
        assert_eq!(ClinicalStage::Reimbursed.risk_factor(), Decimal::ONE);
    }

    #[test]
    fn test_stage_ordering() {
        assert!(ClinicalStage::Pilot < ClinicalStage::FdaCleared);
        assert_eq!(ClinicalStage::FdaCleared.to_string(), "FDA Cleared/CE Marked");
    }

    #[test]
    fn test_valid_inputs() {
        assert!(sample_inputs().validate().is_ok());
    }

    #[test]
    fn test_wacc_equal_to_growth_rejected() {
        let mut inputs = sample_inputs();
        inputs.terminal_growth_rate = dec!(0.15);
        let err = inputs.validate().unwrap_err();
        assert!(matches!(err, ValuationError::FinancialImpossibility(_)));
        // Structure alone is still fine
        assert!(inputs.validate_structure().is_ok());
    }

    #[test]
    fn test_growth_length_mismatch_rejected() {
        let mut inputs = sample_inputs();
        inputs.revenue_growth_rates.pop();
        match inputs.validate().unwrap_err() {
            ValuationError::InvalidInput { field, .. } => {
                assert_eq!(field, "revenue_growth_rates")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_positive_revenue_rejected() {
        let mut inputs = sample_inputs();
        inputs.current_revenue = Decimal::ZERO;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_zero_years_rejected() {
        let mut inputs = sample_inputs();
        inputs.years_to_project = 0;
        inputs.revenue_growth_rates.clear();
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_growth_below_minus_100_rejected() {
        let mut inputs = sample_inputs();
        inputs.revenue_growth_rates[2] = dec!(-1);
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_gross_margin_bounds() {
        let mut inputs = sample_inputs();
        inputs.gross_margin = Decimal::ZERO;
        assert!(inputs.validate().is_err());
        inputs.gross_margin = Decimal::ONE;
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn test_with_discount_rates_keeps_everything_else() {
        let base = sample_inputs();
        let derived = base.with_discount_rates(dec!(0.12), dec!(0.04));
        assert_eq!(derived.wacc, dec!(0.12));
        assert_eq!(derived.terminal_growth_rate, dec!(0.04));
        assert_eq!(derived.current_revenue, base.current_revenue);
        assert_eq!(derived.revenue_growth_rates, base.revenue_growth_rates);
        assert_eq!(derived.clinical_stage, base.clinical_stage);
    }

    #[test]
    fn test_years_default_on_deserialize() {
        let json = serde_json::json!({
            "name": "X",
            "current_revenue": "10",
            "revenue_growth_rates": ["0.5", "0.4", "0.3", "0.2", "0.1"],
            "terminal_growth_rate": "0.03",
            "gross_margin": "0.6",
            "operating_margin_target": "0.25",
            "wacc": "0.14",
            "revenue_model": "PayerContract",
            "clinical_stage": "Pilot"
        });
        let inputs: StartupInputs = serde_json::from_value(json).unwrap();
        assert_eq!(inputs.years_to_project, DEFAULT_YEARS_TO_PROJECT);
        assert!(inputs.validate().is_ok());
    }
}
