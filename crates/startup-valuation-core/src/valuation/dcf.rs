use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ValuationError;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::ValuationResult;

use super::inputs::StartupInputs;

/// Operating margin in year one, as a fraction of gross margin.
const MARGIN_RAMP_SEED: Rate = dec!(0.3);

/// Share of EV above which the terminal value dominates the valuation.
const TV_SHARE_WARNING: Rate = dec!(0.75);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Projection for a single year of the DCF model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub year: u32,
    pub revenue: Money,
    pub operating_margin: Rate,
    /// Revenue x operating margin; the margin ramp stands in for capex and working capital
    pub free_cash_flow: Money,
    pub discount_factor: Rate,
    pub pv_fcf: Money,
}

/// Output of the DCF valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfOutput {
    /// Year-by-year projections
    pub projections: Vec<ProjectionRow>,
    /// Sum of present values of explicit-period FCF
    pub pv_of_fcf: Money,
    /// Gordon growth terminal value before the clinical stage haircut
    pub terminal_value_unadjusted: Money,
    /// Terminal value after the clinical stage haircut
    pub terminal_value: Money,
    /// Present value of the risk-adjusted terminal value
    pub pv_of_terminal: Money,
    /// Enterprise value = PV(FCF) + PV(TV)
    pub enterprise_value: Money,
    /// Enterprise value / current revenue
    pub implied_ev_revenue: Multiple,
    /// Clinical stage risk factor applied to terminal value
    pub risk_factor: Rate,
    /// PV of terminal value as a share of enterprise value
    pub terminal_value_pct: Rate,
    pub wacc_used: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project revenue, operating margin and discounted free cash flow for each
/// explicit forecast year. The base year is not included.
pub fn project_financials(inputs: &StartupInputs) -> ValuationResult<Vec<ProjectionRow>> {
    inputs.validate()?;
    build_projections(inputs)
}

/// Gordon growth terminal value on the final year's FCF, before risk adjustment.
pub fn gordon_terminal_value(inputs: &StartupInputs) -> ValuationResult<Money> {
    let projections = project_financials(inputs)?;
    terminal_value_from(&projections, inputs)
}

/// Terminal value with the clinical stage risk factor applied.
pub fn calculate_terminal_value(inputs: &StartupInputs) -> ValuationResult<Money> {
    Ok(gordon_terminal_value(inputs)? * inputs.risk_factor())
}

/// Run the risk-adjusted DCF valuation.
pub fn calculate_dcf(inputs: &StartupInputs) -> ValuationResult<ComputationOutput<DcfOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    inputs.validate()?;

    let projections = build_projections(inputs)?;
    let pv_of_fcf = projections
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.pv_fcf))
        .ok_or_else(|| ValuationError::overflow("sum of discounted cash flows"))?;

    // --- Terminal value ---
    let risk_factor = inputs.risk_factor();
    let terminal_value_unadjusted = terminal_value_from(&projections, inputs)?;
    let terminal_value = terminal_value_unadjusted * risk_factor;

    // --- Discount TV to present ---
    let horizon = (Decimal::ONE + inputs.wacc)
        .checked_powi(i64::from(inputs.years_to_project))
        .ok_or_else(|| ValuationError::overflow("terminal value discount factor"))?;
    let pv_of_terminal = terminal_value / horizon;

    let enterprise_value = pv_of_fcf
        .checked_add(pv_of_terminal)
        .ok_or_else(|| ValuationError::overflow("enterprise value"))?;
    let implied_ev_revenue = enterprise_value
        .checked_div(inputs.current_revenue)
        .ok_or_else(|| ValuationError::overflow("implied EV/revenue multiple"))?;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        pv_of_terminal / enterprise_value
    };
    if terminal_value_pct > TV_SHARE_WARNING {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value; consider extending the explicit forecast period",
            terminal_value_pct * dec!(100)
        ));
    }
    if enterprise_value < Decimal::ZERO {
        warnings.push("Enterprise value is negative; check the operating margin ramp".into());
    }

    debug!(
        name = %inputs.name,
        stage = %inputs.clinical_stage,
        %enterprise_value,
        %pv_of_terminal,
        "dcf valuation complete"
    );

    let output = DcfOutput {
        projections,
        pv_of_fcf,
        terminal_value_unadjusted,
        terminal_value,
        pv_of_terminal,
        enterprise_value,
        implied_ev_revenue,
        risk_factor,
        terminal_value_pct,
        wacc_used: inputs.wacc,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Risk-adjusted FCF DCF (Gordon growth, clinical stage haircut)",
        inputs,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Assumes `inputs` has already been validated. Long horizons or extreme
/// growth can exceed `Decimal` range; that is reported as `Overflow`.
fn build_projections(inputs: &StartupInputs) -> ValuationResult<Vec<ProjectionRow>> {
    let n_years = inputs.years_to_project as usize;
    let margins = margin_ramp(
        inputs.gross_margin * MARGIN_RAMP_SEED,
        inputs.operating_margin_target,
        n_years,
    );
    let one_plus_wacc = Decimal::ONE + inputs.wacc;

    let mut projections = Vec::with_capacity(n_years);
    let mut prev_revenue = inputs.current_revenue;

    for (idx, (growth, margin)) in inputs
        .revenue_growth_rates
        .iter()
        .zip(margins)
        .enumerate()
    {
        let year = idx as u32 + 1;
        let revenue = prev_revenue
            .checked_mul(Decimal::ONE + growth)
            .ok_or_else(|| ValuationError::overflow(format!("revenue in year {year}")))?;
        let free_cash_flow = revenue
            .checked_mul(margin)
            .ok_or_else(|| ValuationError::overflow(format!("free cash flow in year {year}")))?;
        let compounding = one_plus_wacc
            .checked_powi(i64::from(year))
            .ok_or_else(|| ValuationError::overflow(format!("discount factor in year {year}")))?;
        let discount_factor = Decimal::ONE / compounding;
        let pv_fcf = free_cash_flow * discount_factor;

        projections.push(ProjectionRow {
            year,
            revenue,
            operating_margin: margin,
            free_cash_flow,
            discount_factor,
            pv_fcf,
        });

        prev_revenue = revenue;
    }

    Ok(projections)
}

/// `n` evenly spaced values from `start` to `end` inclusive. A single point
/// yields `[start]`.
pub(crate) fn margin_ramp(start: Rate, end: Rate, n: usize) -> Vec<Rate> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / Decimal::from(n as u64 - 1);
            let mut ramp: Vec<Rate> = (0..n as u64)
                .map(|i| start + step * Decimal::from(i))
                .collect();
            ramp[n - 1] = end;
            ramp
        }
    }
}

fn terminal_value_from(projections: &[ProjectionRow], inputs: &StartupInputs) -> ValuationResult<Money> {
    let last = projections.last().ok_or_else(|| {
        ValuationError::InsufficientData("No projection years generated".into())
    })?;

    let spread = inputs.wacc - inputs.terminal_growth_rate;
    if spread <= Decimal::ZERO {
        return Err(ValuationError::FinancialImpossibility(
            "WACC must exceed terminal growth rate".into(),
        ));
    }

    last.free_cash_flow
        .checked_mul(Decimal::ONE + inputs.terminal_growth_rate)
        .and_then(|v| v.checked_div(spread))
        .ok_or_else(|| ValuationError::overflow("terminal value"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
