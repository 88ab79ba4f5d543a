use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::ValuationError;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::ValuationResult;

/// Growth premium: each point of growth differential moves the multiple by two points.
const GROWTH_SENSITIVITY: Decimal = dec!(2);
const MIN_ADJUSTMENT: Decimal = dec!(0.5);
const MAX_ADJUSTMENT: Decimal = dec!(2.0);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One peer company's observed financials, in millions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparableRecord {
    pub ticker: String,
    pub name: String,
    pub market_cap: Money,
    pub revenue: Money,
    pub enterprise_value: Money,
    /// EV / revenue; undefined when revenue is not positive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_revenue: Option<Multiple>,
    /// Trailing revenue growth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<Rate>,
}

fn default_apply_growth_premium() -> bool {
    true
}

/// Input for the growth-adjusted comparables valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompsInput {
    /// Target company revenue ($M)
    pub target_revenue: Money,
    /// Target company revenue growth
    pub target_growth: Rate,
    /// Peer set, typically produced by a data fetch
    #[serde(default)]
    pub comparables: Vec<ComparableRecord>,
    #[serde(default = "default_apply_growth_premium")]
    pub apply_growth_premium: bool,
}

/// Valuation derived from a usable peer set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompsValuation {
    pub median_multiple: Multiple,
    pub p25_multiple: Multiple,
    pub p75_multiple: Multiple,
    pub mean_multiple: Multiple,
    pub low_multiple: Multiple,
    pub high_multiple: Multiple,
    /// Number of peers with a defined EV/Revenue
    pub peer_count: usize,
    /// Mean trailing growth of peers with growth data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_peer_growth: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_differential: Option<Rate>,
    pub growth_adjustment: Decimal,
    pub implied_ev_low: Money,
    pub implied_ev_mid: Money,
    pub implied_ev_high: Money,
}

/// Either a valuation, or the reason none could be produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompsOutcome {
    Valued(CompsValuation),
    NoData { reason: String },
}

impl CompsOutcome {
    pub fn valuation(&self) -> Option<&CompsValuation> {
        match self {
            CompsOutcome::Valued(v) => Some(v),
            CompsOutcome::NoData { .. } => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, CompsOutcome::NoData { .. })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value the target off peer EV/Revenue quartiles, optionally scaled by a
/// growth premium or discount.
///
/// An empty peer set, or one with no defined multiples, is reported as
/// [`CompsOutcome::NoData`] rather than an error.
pub fn calculate_comps(input: &CompsInput) -> ValuationResult<ComputationOutput<CompsOutcome>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.target_revenue <= Decimal::ZERO {
        return Err(ValuationError::invalid(
            "target_revenue",
            "Target revenue must be positive",
        ));
    }

    let mut multiples: Vec<Multiple> = input
        .comparables
        .iter()
        .filter_map(|c| c.ev_revenue)
        .collect();

    let outcome = if multiples.is_empty() {
        CompsOutcome::NoData {
            reason: "Could not fetch comparable company data".into(),
        }
    } else {
        multiples.sort();
        if multiples.len() < 3 {
            warnings.push(format!(
                "Only {} comparables with EV/Revenue; consider adding more for statistical significance",
                multiples.len()
            ));
        }
        for c in input.comparables.iter().filter(|c| c.ev_revenue.is_none()) {
            warnings.push(format!("{}: EV/Revenue undefined, excluded", c.ticker));
        }
        CompsOutcome::Valued(value_with_multiples(input, &multiples, &mut warnings)?)
    };

    debug!(
        peers = input.comparables.len(),
        no_data = outcome.is_no_data(),
        "comparables valuation complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Trading Comparables (EV/Revenue, growth-adjusted)",
        input,
        warnings,
        elapsed,
        outcome,
    ))
}

/// Linear-interpolation quantile of an ascending slice. `None` when the
/// slice is empty or `q` lies outside [0, 1].
pub fn quantile(sorted: &[Decimal], q: Decimal) -> Option<Decimal> {
    if sorted.is_empty() || q < Decimal::ZERO || q > Decimal::ONE {
        return None;
    }
    let position = Decimal::from(sorted.len() as u64 - 1) * q;
    let lower = position.floor();
    let frac = position - lower;
    let lo = lower.to_usize()?;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[hi]
        .checked_sub(sorted[lo])
        .and_then(|gap| gap.checked_mul(frac))
        .and_then(|step| sorted[lo].checked_add(step))
}

/// `1 + 2 x (target - peer average)`, clamped to [0.5, 2.0].
pub fn growth_adjustment(target_growth: Rate, average_peer_growth: Rate) -> Decimal {
    let raw = target_growth
        .checked_sub(average_peer_growth)
        .and_then(|diff| diff.checked_mul(GROWTH_SENSITIVITY))
        .and_then(|premium| premium.checked_add(Decimal::ONE));
    match raw {
        Some(raw) => raw.clamp(MIN_ADJUSTMENT, MAX_ADJUSTMENT),
        None if target_growth > average_peer_growth => MAX_ADJUSTMENT,
        None => MIN_ADJUSTMENT,
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn value_with_multiples(
    input: &CompsInput,
    sorted: &[Multiple],
    warnings: &mut Vec<String>,
) -> ValuationResult<CompsValuation> {
    // `sorted` is non-empty here; `None` can only mean the peer spread overflowed.
    let quartile = |q: Decimal| {
        quantile(sorted, q).ok_or_else(|| ValuationError::overflow("peer multiple quartiles"))
    };
    let median = quartile(dec!(0.5))?;
    let p25 = quartile(dec!(0.25))?;
    let p75 = quartile(dec!(0.75))?;
    let mean = checked_sum(sorted.iter().copied())
        .ok_or_else(|| ValuationError::overflow("mean peer multiple"))?
        / Decimal::from(sorted.len() as u64);

    let growths: Vec<Rate> = input
        .comparables
        .iter()
        .filter_map(|c| c.revenue_growth)
        .collect();
    let average_peer_growth = if growths.is_empty() {
        None
    } else {
        let total = checked_sum(growths.iter().copied())
            .ok_or_else(|| ValuationError::overflow("average peer growth"))?;
        Some(total / Decimal::from(growths.len() as u64))
    };

    let (adjustment, growth_differential) = match (input.apply_growth_premium, average_peer_growth) {
        (false, _) => (Decimal::ONE, None),
        (true, Some(avg)) => (
            growth_adjustment(input.target_growth, avg),
            input.target_growth.checked_sub(avg),
        ),
        (true, None) => {
            warnings.push("No peer growth data; growth adjustment not applied".into());
            (Decimal::ONE, None)
        }
    };

    let implied_ev = |multiple: Multiple| {
        input
            .target_revenue
            .checked_mul(multiple)
            .and_then(|v| v.checked_mul(adjustment))
            .ok_or_else(|| ValuationError::overflow("implied enterprise value"))
    };

    Ok(CompsValuation {
        median_multiple: median,
        p25_multiple: p25,
        p75_multiple: p75,
        mean_multiple: mean,
        low_multiple: sorted[0],
        high_multiple: sorted[sorted.len() - 1],
        peer_count: sorted.len(),
        average_peer_growth,
        growth_differential,
        growth_adjustment: adjustment,
        implied_ev_low: implied_ev(p25)?,
        implied_ev_mid: implied_ev(median)?,
        implied_ev_high: implied_ev(p75)?,
    })
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
