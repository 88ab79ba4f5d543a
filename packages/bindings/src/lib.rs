use napi::Result as NapiResult;
use napi_derive::napi;

use startup_valuation_core::report::{CompsReport, DcfReport, SensitivityReport, VcReport};
use startup_valuation_core::scenarios::sensitivity::{self, SensitivityInput};
use startup_valuation_core::valuation::comps::{self, CompsInput};
use startup_valuation_core::valuation::dcf;
use startup_valuation_core::valuation::inputs::{ClinicalStage, StartupInputs};
use startup_valuation_core::venture::vc_method::{self, VcMethodInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: serde::de::DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render(value: &impl serde::Serialize) -> NapiResult<String> {
    serde_json::to_string(value).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Risk-adjusted DCF. With `summary`, returns the labelled dashboard record
/// in place of the full result.
#[napi]
pub fn dcf_valuation(input_json: String, summary: Option<bool>) -> NapiResult<String> {
    let input: StartupInputs = parse(&input_json)?;
    let output = dcf::calculate_dcf(&input).map_err(to_napi_error)?;
    if summary.unwrap_or(false) {
        render(&output.map(|out| DcfReport::from(&out)))
    } else {
        render(&output)
    }
}

#[napi]
pub fn project_financials(input_json: String) -> NapiResult<String> {
    let input: StartupInputs = parse(&input_json)?;
    let rows = dcf::project_financials(&input).map_err(to_napi_error)?;
    render(&rows)
}

#[napi]
pub fn comps_valuation(input_json: String, summary: Option<bool>) -> NapiResult<String> {
    let input: CompsInput = parse(&input_json)?;
    let output = comps::calculate_comps(&input).map_err(to_napi_error)?;
    if summary.unwrap_or(false) {
        render(&output.map(|out| CompsReport::from(&out)))
    } else {
        render(&output)
    }
}

// ---------------------------------------------------------------------------
// Venture
// ---------------------------------------------------------------------------

#[napi]
pub fn vc_valuation(input_json: String, summary: Option<bool>) -> NapiResult<String> {
    let input: VcMethodInput = parse(&input_json)?;
    let output = vc_method::calculate_vc_method(&input).map_err(to_napi_error)?;
    if summary.unwrap_or(false) {
        render(&output.map(|out| VcReport::from(&out)))
    } else {
        render(&output)
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Accepts either a full sweep input or a bare startup profile, which is
/// swept over the default ranges.
#[napi]
pub fn wacc_growth_sensitivity(input_json: String, summary: Option<bool>) -> NapiResult<String> {
    let value: serde_json::Value = parse(&input_json)?;
    let input: SensitivityInput = if value.get("base").is_some() {
        serde_json::from_value(value).map_err(to_napi_error)?
    } else {
        let base: StartupInputs = serde_json::from_value(value).map_err(to_napi_error)?;
        SensitivityInput::with_defaults(base)
    };

    let output = sensitivity::wacc_growth_sensitivity(&input).map_err(to_napi_error)?;
    if summary.unwrap_or(false) {
        render(&SensitivityReport::from(&output.result).records())
    } else {
        render(&output)
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[napi]
pub fn stage_risk_factors() -> NapiResult<String> {
    let stages: Vec<serde_json::Value> = ClinicalStage::ALL
        .iter()
        .map(|stage| {
            serde_json::json!({
                "stage": stage,
                "label": stage.to_string(),
                "risk_factor": stage.risk_factor(),
            })
        })
        .collect();
    render(&stages)
}
