use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ValuationError;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::ValuationResult;

/// Input for the VC method: value today is the exit value divided by the
/// investor's required return multiple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcMethodInput {
    /// Revenue today ($M)
    pub current_revenue: Money,
    /// Revenue expected in the exit year ($M)
    pub projected_exit_revenue: Money,
    /// Years until exit
    pub years_to_exit: u32,
    /// EV/Revenue multiple expected at exit
    pub exit_multiple: Multiple,
    /// Required gross return, e.g. 10 for 10x
    pub target_return_multiple: Multiple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcMethodOutput {
    pub projected_exit_revenue: Money,
    pub exit_multiple: Multiple,
    /// Exit revenue x exit multiple
    pub exit_value: Money,
    pub target_return_multiple: Multiple,
    /// Exit value / target return multiple
    pub pre_money_valuation: Money,
    /// Annualised return implied by the target multiple
    pub implied_irr: Rate,
    /// Revenue CAGR needed to hit the exit revenue
    pub required_revenue_cagr: Rate,
}

/// Backward valuation from a target exit scenario.
pub fn calculate_vc_method(input: &VcMethodInput) -> ValuationResult<ComputationOutput<VcMethodOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_vc_input(input)?;

    let exit_value = input
        .projected_exit_revenue
        .checked_mul(input.exit_multiple)
        .ok_or_else(|| ValuationError::overflow("exit value"))?;
    let pre_money_valuation = exit_value
        .checked_div(input.target_return_multiple)
        .ok_or_else(|| ValuationError::overflow("pre-money valuation"))?;
    let revenue_ratio = input
        .projected_exit_revenue
        .checked_div(input.current_revenue)
        .ok_or_else(|| ValuationError::overflow("exit / current revenue ratio"))?;

    let years = Decimal::from(input.years_to_exit);
    let implied_irr = annualise(input.target_return_multiple, years, "implied IRR")?;
    let required_revenue_cagr = annualise(revenue_ratio, years, "required revenue CAGR")?;

    if input.target_return_multiple < Decimal::ONE {
        warnings.push(format!(
            "Target return of {}x is below 1x; the investor expects to lose money",
            input.target_return_multiple
        ));
    }
    if input.projected_exit_revenue < input.current_revenue {
        warnings.push("Projected exit revenue is below current revenue".into());
    }

    debug!(%exit_value, %pre_money_valuation, %implied_irr, "vc method valuation complete");

    let output = VcMethodOutput {
        projected_exit_revenue: input.projected_exit_revenue,
        exit_multiple: input.exit_multiple,
        exit_value,
        target_return_multiple: input.target_return_multiple,
        pre_money_valuation,
        implied_irr,
        required_revenue_cagr,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "VC Method (backward from exit value)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// `ratio^(1/years) - 1`
fn annualise(ratio: Decimal, years: Decimal, context: &str) -> ValuationResult<Rate> {
    if ratio == Decimal::ONE {
        return Ok(Decimal::ZERO);
    }
    ratio
        .checked_powd(Decimal::ONE / years)
        .map(|root| root - Decimal::ONE)
        .ok_or_else(|| ValuationError::overflow(context))
}

fn validate_vc_input(input: &VcMethodInput) -> ValuationResult<()> {
    if input.years_to_exit == 0 {
        return Err(ValuationError::invalid(
            "years_to_exit",
            "Years to exit must be at least 1",
        ));
    }
    if input.current_revenue <= Decimal::ZERO {
        return Err(ValuationError::invalid(
            "current_revenue",
            "Current revenue must be positive",
        ));
    }
    if input.target_return_multiple <= Decimal::ZERO {
        return Err(ValuationError::invalid(
            "target_return_multiple",
            "Target return multiple must be positive",
        ));
    }
    if input.projected_exit_revenue <= Decimal::ZERO {
        return Err(ValuationError::invalid(
            "projected_exit_revenue",
            "Projected exit revenue must be positive",
        ));
    }
    if input.exit_multiple < Decimal::ZERO {
        return Err(ValuationError::invalid(
            "exit_multiple",
            "Exit multiple cannot be negative",
        ));
    }
    Ok(())
}
