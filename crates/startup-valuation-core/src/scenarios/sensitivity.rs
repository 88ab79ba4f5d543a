use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::ValuationError;
use crate::types::*;
use crate::valuation::dcf::calculate_dcf;
use crate::valuation::inputs::StartupInputs;
use crate::ValuationResult;

/// Inclusive sweep bounds for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl SweepRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        SweepRange { min, max }
    }
}

fn default_wacc_range() -> SweepRange {
    SweepRange::new(dec!(0.10), dec!(0.20))
}

fn default_growth_range() -> SweepRange {
    SweepRange::new(dec!(0.02), dec!(0.05))
}

fn default_steps() -> usize {
    5
}

/// Input for the WACC x terminal growth sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    /// Base case; every cell reuses it with WACC and terminal growth replaced
    pub base: StartupInputs,
    #[serde(default = "default_wacc_range")]
    pub wacc_range: SweepRange,
    #[serde(default = "default_growth_range")]
    pub growth_range: SweepRange,
    /// Points per axis
    #[serde(default = "default_steps")]
    pub steps: usize,
}

impl SensitivityInput {
    /// WACC 10% to 20% against growth 2% to 5%, five points each.
    pub fn with_defaults(base: StartupInputs) -> Self {
        SensitivityInput {
            base,
            wacc_range: default_wacc_range(),
            growth_range: default_growth_range(),
            steps: default_steps(),
        }
    }
}

/// Output of the sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub wacc_values: Vec<Rate>,
    pub growth_values: Vec<Rate>,
    /// matrix[i][j] = enterprise value (1 dp) at wacc_values[i], growth_values[j];
    /// `None` where WACC does not exceed terminal growth
    pub matrix: Vec<Vec<Option<Money>>>,
    /// Cell nearest the base case's own WACC and terminal growth (row, col)
    pub base_case_position: (usize, usize),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_case_value: Option<Money>,
}

impl SensitivityOutput {
    pub fn cell(&self, row: usize, col: usize) -> Option<Money> {
        self.matrix.get(row).and_then(|r| r.get(col)).copied().flatten()
    }
}

/// `steps` evenly spaced values across the range, endpoints included.
pub fn linspace(range: SweepRange, steps: usize) -> Vec<Decimal> {
    match steps {
        0 => Vec::new(),
        1 => vec![range.min],
        _ => {
            let step = (range.max - range.min) / Decimal::from(steps as u64 - 1);
            let mut values: Vec<Decimal> = (0..steps as u64)
                .map(|i| range.min + step * Decimal::from(i))
                .collect();
            values[steps - 1] = range.max;
            values
        }
    }
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn validate_range(field: &str, range: SweepRange) -> ValuationResult<()> {
    if range.min > range.max {
        return Err(ValuationError::invalid(field, "Min must be <= max"));
    }
    Ok(())
}

/// Re-run the DCF over every (WACC, terminal growth) pair.
///
/// Cells where WACC does not exceed terminal growth are left empty and
/// reported in the warnings; any other input problem fails the whole sweep.
pub fn wacc_growth_sensitivity(
    input: &SensitivityInput,
) -> ValuationResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.steps == 0 {
        return Err(ValuationError::invalid("steps", "At least one step is required"));
    }
    validate_range("wacc_range", input.wacc_range)?;
    validate_range("growth_range", input.growth_range)?;
    input.base.validate_structure()?;
    if input.wacc_range.min <= Decimal::ZERO {
        return Err(ValuationError::invalid("wacc_range", "WACC values must be positive"));
    }

    let wacc_values = linspace(input.wacc_range, input.steps);
    let growth_values = linspace(input.growth_range, input.steps);

    let grid = evaluate_grid(&input.base, &wacc_values, &growth_values)?;

    let mut matrix: Vec<Vec<Option<Money>>> = Vec::with_capacity(grid.len());
    for (i, row) in grid.into_iter().enumerate() {
        let mut values = Vec::with_capacity(row.len());
        for (j, cell) in row.into_iter().enumerate() {
            match cell {
                Ok(ev) => values.push(Some(ev)),
                Err(reason) => {
                    warnings.push(format!(
                        "Skipped WACC {} / growth {}: {}",
                        wacc_values[i], growth_values[j], reason
                    ));
                    values.push(None);
                }
            }
        }
        matrix.push(values);
    }

    let base_row = closest_index(&wacc_values, input.base.wacc);
    let base_col = closest_index(&growth_values, input.base.terminal_growth_rate);
    let base_case_value = matrix[base_row][base_col];

    debug!(
        steps = input.steps,
        skipped = warnings.len(),
        "sensitivity sweep complete"
    );

    let output = SensitivityOutput {
        wacc_values,
        growth_values,
        matrix,
        base_case_position: (base_row, base_col),
        base_case_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity (WACC x Terminal Growth, DCF Enterprise Value)",
        &serde_json::json!({
            "variable_1": "wacc",
            "variable_2": "terminal_growth_rate",
            "output_metric": "enterprise_value",
            "wacc_range": input.wacc_range,
            "growth_range": input.growth_range,
            "steps": input.steps,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Outer error fails the sweep; inner error leaves the cell empty.
type Cell = Result<Money, ValuationError>;

fn evaluate_cell(base: &StartupInputs, wacc: Rate, growth: Rate) -> ValuationResult<Cell> {
    match calculate_dcf(&base.with_discount_rates(wacc, growth)) {
        Ok(out) => Ok(Ok(out.result.enterprise_value.round_dp(1))),
        Err(e @ (ValuationError::FinancialImpossibility(_) | ValuationError::Overflow { .. })) => {
            warn!(%wacc, %growth, reason = %e, "sensitivity cell skipped");
            Ok(Err(e))
        }
        Err(e) => Err(e),
    }
}

fn evaluate_row(base: &StartupInputs, wacc: Rate, growth_values: &[Rate]) -> ValuationResult<Vec<Cell>> {
    growth_values
        .iter()
        .map(|g| evaluate_cell(base, wacc, *g))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_grid(
    base: &StartupInputs,
    wacc_values: &[Rate],
    growth_values: &[Rate],
) -> ValuationResult<Vec<Vec<Cell>>> {
    wacc_values
        .iter()
        .map(|w| evaluate_row(base, *w, growth_values))
        .collect()
}

#[cfg(feature = "parallel")]
fn evaluate_grid(
    base: &StartupInputs,
    wacc_values: &[Rate],
    growth_values: &[Rate],
) -> ValuationResult<Vec<Vec<Cell>>> {
    wacc_values
        .par_iter()
        .map(|w| evaluate_row(base, *w, growth_values))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::inputs::{ClinicalStage, RevenueModel};
    use rust_decimal_macros::dec;

    fn sample_base() -> StartupInputs {
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
    fn test_linspace() {
        let vals = linspace(SweepRange::new(dec!(0.02), dec!(0.05)), 5);
        assert_eq!(
            vals,
            vec![dec!(0.02), dec!(0.0275), dec!(0.035), dec!(0.0425), dec!(0.05)]
        );
        assert_eq!(linspace(SweepRange::new(dec!(1), dec!(2)), 1), vec![dec!(1)]);
    }

    #[test]
    fn test_default_grid() {
        let result = wacc_growth_sensitivity(&SensitivityInput::with_defaults(sample_base())).unwrap();
        let out = &result.result;

        assert_eq!(out.wacc_values.len(), 5);
        assert_eq!(out.growth_values.len(), 5);
        assert!(result.warnings.is_empty());

        assert_eq!(out.cell(0, 0), Some(dec!(164.2)));
        assert_eq!(out.cell(0, 4), Some(dec!(240.0)));
        assert_eq!(out.cell(2, 1), Some(dec!(102.2)));
        assert_eq!(out.cell(4, 4), Some(dec!(76.8)));
    }

    #[test]
    fn test_values_fall_as_wacc_rises() {
        let result = wacc_growth_sensitivity(&SensitivityInput::with_defaults(sample_base())).unwrap();
        let out = &result.result;
        for col in 0..out.growth_values.len() {
            for row in 0..out.wacc_values.len() - 1 {
                assert!(out.cell(row, col) > out.cell(row + 1, col));
            }
        }
    }

    #[test]
    fn test_base_case_position() {
        let result = wacc_growth_sensitivity(&SensitivityInput::with_defaults(sample_base())).unwrap();
        let out = &result.result;
        // WACC 15% is index 2; growth 3% is closest to 2.75% (index 1)
        assert_eq!(out.base_case_position, (2, 1));
        assert_eq!(out.base_case_value, Some(dec!(102.2)));
    }

    #[test]
    fn test_invalid_cells_are_empty() {
        let input = SensitivityInput {
            base: sample_base(),
            wacc_range: SweepRange::new(dec!(0.04), dec!(0.08)),
            growth_range: SweepRange::new(dec!(0.02), dec!(0.06)),
            steps: 3,
        };
        let result = wacc_growth_sensitivity(&input).unwrap();
        let out = &result.result;

        // WACC 4% vs growth 4% and 6% are impossible
        assert!(out.cell(0, 0).is_some());
        assert!(out.cell(0, 1).is_none());
        assert!(out.cell(0, 2).is_none());
        // WACC 6% vs growth 6%
        assert!(out.cell(1, 2).is_none());
        assert!(out.cell(2, 2).is_some());
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_structural_error_fails_sweep() {
        let mut base = sample_base();
        base.revenue_growth_rates.pop();
        assert!(wacc_growth_sensitivity(&SensitivityInput::with_defaults(base)).is_err());
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut input = SensitivityInput::with_defaults(sample_base());
        input.wacc_range = SweepRange::new(dec!(0.2), dec!(0.1));
        assert!(wacc_growth_sensitivity(&input).is_err());

        let mut input = SensitivityInput::with_defaults(sample_base());
        input.steps = 0;
        assert!(wacc_growth_sensitivity(&input).is_err());
    }

    #[test]
    fn test_base_with_invalid_spread_still_sweeps() {
        let mut base = sample_base();
        base.terminal_growth_rate = dec!(0.30);
        let result = wacc_growth_sensitivity(&SensitivityInput::with_defaults(base)).unwrap();
        assert!(result.result.matrix.iter().flatten().all(Option::is_some));
    }
    #[test]
    fn test_overflowing_cells_are_empty() {
        // 200 flat years: 1.1^200 fits in a Decimal, 1.6^200 does not
        let mut base = sample_base();
        base.years_to_project = 200;
        base.revenue_growth_rates = vec![Decimal::ZERO; 200];
        let input = SensitivityInput {
            base,
            wacc_range: SweepRange::new(dec!(0.10), dec!(0.60)),
            growth_range: SweepRange::new(dec!(0.02), dec!(0.03)),
            steps: 2,
        };
        let result = wacc_growth_sensitivity(&input).unwrap();
        let out = &result.result;

        assert!(out.cell(0, 0).is_some());
        assert!(out.cell(0, 1).is_some());
        assert!(out.cell(1, 0).is_none());
        assert!(out.cell(1, 1).is_none());
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("overflow"));
    }
}
