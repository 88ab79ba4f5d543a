//! Rounded, labelled records for display.
//!
//! Engine outputs keep full precision; these records apply the display
//! precisions a dashboard renders (dollar figures in $M, multiples, and
//! percentage strings) and use the labels it keys on.

#[cfg(feature = "scenarios")]
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[cfg(feature = "valuation")]
use crate::valuation::{comps::CompsOutcome, dcf::DcfOutput};

#[cfg(feature = "venture")]
use crate::venture::vc_method::VcMethodOutput;

#[cfg(feature = "scenarios")]
use crate::scenarios::sensitivity::SensitivityOutput;

/// `0.153` -> `"15.3%"`
pub fn format_pct(rate: Decimal, dp: u32) -> String {
    let pct = (rate * dec!(100)).round_dp(dp);
    format!("{:.*}%", dp as usize, pct)
}

/// `5` -> `"5.0x"`, `2.50` -> `"2.5x"`
pub fn format_multiple(multiple: Decimal) -> String {
    let m = multiple.normalize();
    if m.scale() == 0 {
        format!("{m}.0x")
    } else {
        format!("{m}x")
    }
}

// ---------------------------------------------------------------------------
// DCF
// ---------------------------------------------------------------------------

#[cfg(feature = "valuation")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfReport {
    #[serde(rename = "PV of Projected FCF ($M)")]
    pub pv_of_fcf: Decimal,
    #[serde(rename = "Terminal Value ($M)")]
    pub terminal_value: Decimal,
    #[serde(rename = "PV of Terminal Value ($M)")]
    pub pv_of_terminal: Decimal,
    #[serde(rename = "Enterprise Value ($M)")]
    pub enterprise_value: Decimal,
    #[serde(rename = "Implied EV/Revenue Multiple")]
    pub implied_ev_revenue: Decimal,
    #[serde(rename = "Risk Adjustment Applied")]
    pub risk_adjustment: Decimal,
}

#[cfg(feature = "valuation")]
impl From<&DcfOutput> for DcfReport {
    fn from(out: &DcfOutput) -> Self {
        DcfReport {
            pv_of_fcf: out.pv_of_fcf.round_dp(2),
            terminal_value: out.terminal_value.round_dp(2),
            pv_of_terminal: out.pv_of_terminal.round_dp(2),
            enterprise_value: out.enterprise_value.round_dp(2),
            implied_ev_revenue: out.implied_ev_revenue.round_dp(1),
            risk_adjustment: out.risk_factor,
        }
    }
}

/// One projected year with display precision.
#[cfg(feature = "valuation")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionReportRow {
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "Revenue ($M)")]
    pub revenue: Decimal,
    #[serde(rename = "Operating Margin")]
    pub operating_margin: String,
    #[serde(rename = "FCF ($M)")]
    pub free_cash_flow: Decimal,
    #[serde(rename = "Discount Factor")]
    pub discount_factor: Decimal,
    #[serde(rename = "PV of FCF ($M)")]
    pub pv_fcf: Decimal,
}

#[cfg(feature = "valuation")]
impl From<&crate::valuation::dcf::ProjectionRow> for ProjectionReportRow {
    fn from(row: &crate::valuation::dcf::ProjectionRow) -> Self {
        ProjectionReportRow {
            year: row.year,
            revenue: row.revenue.round_dp(2),
            operating_margin: format_pct(row.operating_margin, 1),
            free_cash_flow: row.free_cash_flow.round_dp(2),
            discount_factor: row.discount_factor.round_dp(4),
            pv_fcf: row.pv_fcf.round_dp(2),
        }
    }
}

// ---------------------------------------------------------------------------
// Comparables
// ---------------------------------------------------------------------------

/// Every field is `None` when the peer set produced no multiples, with the
/// reason in `error`.
#[cfg(feature = "valuation")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompsReport {
    #[serde(rename = "Median EV/Revenue Multiple")]
    pub median_multiple: Option<Decimal>,
    #[serde(rename = "25th Percentile Multiple")]
    pub p25_multiple: Option<Decimal>,
    #[serde(rename = "75th Percentile Multiple")]
    pub p75_multiple: Option<Decimal>,
    #[serde(rename = "Growth Adjustment Factor")]
    pub growth_adjustment: Option<Decimal>,
    #[serde(rename = "Implied EV - Low ($M)")]
    pub implied_ev_low: Option<Decimal>,
    #[serde(rename = "Implied EV - Mid ($M)")]
    pub implied_ev_mid: Option<Decimal>,
    #[serde(rename = "Implied EV - High ($M)")]
    pub implied_ev_high: Option<Decimal>,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(feature = "valuation")]
impl From<&CompsOutcome> for CompsReport {
    fn from(outcome: &CompsOutcome) -> Self {
        match outcome {
            CompsOutcome::Valued(v) => CompsReport {
                median_multiple: Some(v.median_multiple.round_dp(2)),
                p25_multiple: Some(v.p25_multiple.round_dp(2)),
                p75_multiple: Some(v.p75_multiple.round_dp(2)),
                growth_adjustment: Some(v.growth_adjustment.round_dp(2)),
                implied_ev_low: Some(v.implied_ev_low.round_dp(1)),
                implied_ev_mid: Some(v.implied_ev_mid.round_dp(1)),
                implied_ev_high: Some(v.implied_ev_high.round_dp(1)),
                error: None,
            },
            CompsOutcome::NoData { reason } => CompsReport {
                median_multiple: None,
                p25_multiple: None,
                p75_multiple: None,
                growth_adjustment: None,
                implied_ev_low: None,
                implied_ev_mid: None,
                implied_ev_high: None,
                error: Some(reason.clone()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// VC method
// ---------------------------------------------------------------------------

#[cfg(feature = "venture")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcReport {
    #[serde(rename = "Projected Exit Revenue ($M)")]
    pub projected_exit_revenue: Decimal,
    #[serde(rename = "Exit EV/Revenue Multiple")]
    pub exit_multiple: Decimal,
    #[serde(rename = "Exit Value ($M)")]
    pub exit_value: Decimal,
    #[serde(rename = "Target Return Multiple")]
    pub target_return_multiple: String,
    #[serde(rename = "Pre-Money Valuation ($M)")]
    pub pre_money_valuation: Decimal,
    #[serde(rename = "Implied IRR")]
    pub implied_irr: String,
    #[serde(rename = "Required Revenue CAGR")]
    pub required_revenue_cagr: String,
}

#[cfg(feature = "venture")]
impl From<&VcMethodOutput> for VcReport {
    fn from(out: &VcMethodOutput) -> Self {
        VcReport {
            projected_exit_revenue: out.projected_exit_revenue.round_dp(1),
            exit_multiple: out.exit_multiple,
            exit_value: out.exit_value.round_dp(1),
            target_return_multiple: format_multiple(out.target_return_multiple),
            pre_money_valuation: out.pre_money_valuation.round_dp(1),
            implied_irr: format_pct(out.implied_irr, 1),
            required_revenue_cagr: format_pct(out.required_revenue_cagr, 1),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

/// Row labels ("15.0%"), column labels ("g=3.0%") and the EV grid.
#[cfg(feature = "scenarios")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub matrix: Vec<Vec<Option<Decimal>>>,
}

#[cfg(feature = "scenarios")]
impl SensitivityReport {
    /// One map per WACC row: `{"WACC": "10.0%", "g=2.0%": 164.2, ...}`.
    pub fn records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.row_labels
            .iter()
            .zip(&self.matrix)
            .map(|(label, row)| {
                let mut record = serde_json::Map::new();
                record.insert("WACC".into(), serde_json::Value::String(label.clone()));
                for (col, cell) in self.column_labels.iter().zip(row) {
                    let value = cell
                        .and_then(|v| v.to_f64())
                        .and_then(serde_json::Number::from_f64)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null);
                    record.insert(col.clone(), value);
                }
                record
            })
            .collect()
    }
}

#[cfg(feature = "scenarios")]
impl From<&SensitivityOutput> for SensitivityReport {
    fn from(out: &SensitivityOutput) -> Self {
        SensitivityReport {
            row_labels: out.wacc_values.iter().map(|w| format_pct(*w, 1)).collect(),
            column_labels: out
                .growth_values
                .iter()
                .map(|g| format!("g={}", format_pct(*g, 1)))
                .collect(),
            matrix: out.matrix.clone(),
        }
    }
}
