use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use startup_valuation_core::report::{CompsReport, DcfReport, SensitivityReport, VcReport};
use startup_valuation_core::scenarios::sensitivity::{self, SensitivityInput};
use startup_valuation_core::valuation::comps::{self, ComparableRecord, CompsInput};
use startup_valuation_core::valuation::dcf;
use startup_valuation_core::valuation::inputs::{ClinicalStage, RevenueModel, StartupInputs};
use startup_valuation_core::valuation::peers::{
    collect_comparables, ComparableSource, FetchedFinancials, DEFAULT_PEERS,
};
use startup_valuation_core::venture::vc_method::{self, VcMethodInput};
use startup_valuation_core::{ValuationError, ValuationResult};

fn remote_monitoring_startup() -> StartupInputs {
    // Digital health startup focused on remote patient monitoring, $15M ARR
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

// ===========================================================================
// DCF
// ===========================================================================

#[test]
fn test_dcf_end_to_end_report() {
    let result = dcf::calculate_dcf(&remote_monitoring_startup()).unwrap();
    let report = DcfReport::from(&result.result);

    assert_eq!(
        report,
        DcfReport {
            pv_of_fcf: dec!(40.45),
            terminal_value: dec!(127.02),
            pv_of_terminal: dec!(63.15),
            enterprise_value: dec!(103.61),
            implied_ev_revenue: dec!(6.9),
            risk_adjustment: dec!(0.70),
        }
    );
}

#[test]
fn test_dcf_report_labels() {
    let result = dcf::calculate_dcf(&remote_monitoring_startup()).unwrap();
    let json = serde_json::to_value(DcfReport::from(&result.result)).unwrap();
    assert_eq!(json["Enterprise Value ($M)"], "103.61");
    assert_eq!(json["Implied EV/Revenue Multiple"], "6.9");
    assert!(json.get("Risk Adjustment Applied").is_some());
}

#[test]
fn test_revenue_compounds_sequentially() {
    let inputs = remote_monitoring_startup();
    let rows = dcf::project_financials(&inputs).unwrap();

    let mut prev = inputs.current_revenue;
    for (row, g) in rows.iter().zip(&inputs.revenue_growth_rates) {
        assert_eq!(row.revenue, prev * (Decimal::ONE + g));
        prev = row.revenue;
    }
}

#[test]
fn test_stage_haircut_only_touches_terminal_value() {
    let mut inputs = remote_monitoring_startup();
    inputs.clinical_stage = ClinicalStage::PreClinical;
    let pre = dcf::calculate_dcf(&inputs).unwrap().result;

    inputs.clinical_stage = ClinicalStage::Reimbursed;
    let reimbursed = dcf::calculate_dcf(&inputs).unwrap().result;

    assert_eq!(pre.pv_of_fcf, reimbursed.pv_of_fcf);
    assert_eq!(pre.terminal_value, reimbursed.terminal_value * dec!(0.4));
    assert!(pre.enterprise_value < reimbursed.enterprise_value);
}

#[test]
fn test_ev_decreases_with_wacc() {
    let base = remote_monitoring_startup();
    let evs: Vec<Decimal> = [dec!(0.08), dec!(0.10), dec!(0.12), dec!(0.15), dec!(0.20), dec!(0.25)]
        .iter()
        .map(|w| {
            dcf::calculate_dcf(&base.with_discount_rates(*w, base.terminal_growth_rate))
                .unwrap()
                .result
                .enterprise_value
        })
        .collect();
    for pair in evs.windows(2) {
        assert!(pair[0] > pair[1], "EV should fall as WACC rises: {evs:?}");
    }
}

#[test]
fn test_gordon_singularity_is_invalid_input() {
    let inputs = remote_monitoring_startup().with_discount_rates(dec!(0.05), dec!(0.05));
    match dcf::calculate_terminal_value(&inputs) {
        Err(ValuationError::FinancialImpossibility(msg)) => assert!(msg.contains("WACC")),
        other => panic!("expected financial impossibility, got {other:?}"),
    }
}

// ===========================================================================
// Comparables
// ===========================================================================

struct FixtureSource;

impl ComparableSource for FixtureSource {
    fn fetch(&self, ticker: &str) -> ValuationResult<FetchedFinancials> {
        let (revenue, ev, growth) = match ticker {
            "TDOC" => (dec!(2600000000), dec!(5200000000), dec!(-0.02)),
            "DOCS" => (dec!(500000000), dec!(4000000000), dec!(0.20)),
            "VEEV" => (dec!(2500000000), dec!(15000000000), dec!(0.12)),
            "HIMS" => (dec!(1000000000), dec!(4000000000), dec!(0.50)),
            _ => {
                return Err(ValuationError::InsufficientData(format!(
                    "{ticker}: quote unavailable"
                )))
            }
        };
        Ok(FetchedFinancials {
            market_cap: ev,
            total_revenue: revenue,
            enterprise_value: ev,
            revenue_growth: Some(growth),
        })
    }
}

#[test]
fn test_comps_from_collected_peers() {
    let comparables = collect_comparables(&FixtureSource, &DEFAULT_PEERS);
    assert_eq!(comparables.len(), 4);

    // Multiples: TDOC 2x, DOCS 8x, VEEV 6x, HIMS 4x
    let input = CompsInput {
        target_revenue: dec!(15),
        target_growth: dec!(0.80),
        comparables,
        apply_growth_premium: true,
    };
    let result = comps::calculate_comps(&input).unwrap();
    let report = CompsReport::from(&result.result);

    // Average peer growth 0.2; 1 + 2 * 0.6 = 2.2 -> capped at 2.0
    assert_eq!(report.median_multiple, Some(dec!(5.00)));
    assert_eq!(report.p25_multiple, Some(dec!(3.50)));
    assert_eq!(report.p75_multiple, Some(dec!(6.50)));
    assert_eq!(report.growth_adjustment, Some(dec!(2.00)));
    assert_eq!(report.implied_ev_low, Some(dec!(105.0)));
    assert_eq!(report.implied_ev_mid, Some(dec!(150.0)));
    assert_eq!(report.implied_ev_high, Some(dec!(195.0)));
    assert!(report.error.is_none());
}

#[test]
fn test_comps_extreme_growth_clamped() {
    let comparables: Vec<ComparableRecord> = [dec!(2.0), dec!(4.0), dec!(6.0), dec!(8.0)]
        .iter()
        .enumerate()
        .map(|(i, m)| ComparableRecord {
            ticker: format!("P{i}"),
            name: format!("Peer {i}"),
            market_cap: dec!(100) * m,
            revenue: dec!(100),
            enterprise_value: dec!(100) * m,
            ev_revenue: Some(*m),
            revenue_growth: Some(Decimal::ZERO),
        })
        .collect();
    let input = CompsInput {
        target_revenue: dec!(10),
        target_growth: dec!(5.0),
        comparables,
        apply_growth_premium: true,
    };
    let v = comps::calculate_comps(&input).unwrap().result;
    let v = v.valuation().unwrap();
    assert_eq!(v.growth_adjustment, dec!(2.0));
    assert_eq!(v.implied_ev_mid, dec!(100.0));
}

#[test]
fn test_comps_no_data_report() {
    let comparables = collect_comparables(&FixtureSource, &[]);
    let input = CompsInput {
        target_revenue: dec!(15),
        target_growth: dec!(0.8),
        comparables,
        apply_growth_premium: true,
    };
    let result = comps::calculate_comps(&input).unwrap();
    assert!(result.result.is_no_data());
    let report = CompsReport::from(&result.result);
    assert!(report.error.is_some());
    assert_eq!(report.implied_ev_low, None);
}

#[test]
fn test_comps_input_from_json_defaults_premium_on() {
    let json = serde_json::json!({
        "target_revenue": "15",
        "target_growth": "0.3",
        "comparables": [
            {"ticker": "AAA", "name": "A", "market_cap": "10", "revenue": "5",
             "enterprise_value": "20", "ev_revenue": "4", "revenue_growth": "0.1"}
        ]
    });
    let input: CompsInput = serde_json::from_value(json).unwrap();
    assert!(input.apply_growth_premium);
    let result = comps::calculate_comps(&input).unwrap();
    // 1 + 2 * 0.2 = 1.4
    assert_eq!(result.result.valuation().unwrap().growth_adjustment, dec!(1.4));
    assert_eq!(result.warnings.len(), 1);
}

// ===========================================================================
// VC method
// ===========================================================================

#[test]
fn test_vc_method_report() {
    let input = VcMethodInput {
        current_revenue: dec!(15),
        projected_exit_revenue: dec!(100),
        years_to_exit: 5,
        exit_multiple: dec!(8),
        target_return_multiple: dec!(5),
    };
    let result = vc_method::calculate_vc_method(&input).unwrap();
    let report = VcReport::from(&result.result);

    assert_eq!(report.exit_value, dec!(800.0));
    assert_eq!(report.pre_money_valuation, dec!(160.0));
    assert_eq!(report.target_return_multiple, "5.0x");
    assert_eq!(report.implied_irr, "38.0%");
    assert_eq!(report.required_revenue_cagr, "46.1%");
}

// ===========================================================================
// Sensitivity
// ===========================================================================

#[test]
fn test_sensitivity_report_labels() {
    let input = SensitivityInput::with_defaults(remote_monitoring_startup());
    let result = sensitivity::wacc_growth_sensitivity(&input).unwrap();
    let report = SensitivityReport::from(&result.result);

    assert_eq!(
        report.row_labels,
        vec!["10.0%", "12.5%", "15.0%", "17.5%", "20.0%"]
    );
    assert_eq!(
        report.column_labels,
        vec!["g=2.0%", "g=2.8%", "g=3.5%", "g=4.2%", "g=5.0%"]
    );

    let records = report.records();
    assert_eq!(records.len(), 5);
    assert_eq!(records[2]["WACC"], "15.0%");
    assert_eq!(records[2]["g=2.0%"], serde_json::json!(98.2));
}

#[test]
fn test_sensitivity_centre_matches_direct_dcf() {
    let base = remote_monitoring_startup();
    let input = SensitivityInput::with_defaults(base.clone());
    let grid = sensitivity::wacc_growth_sensitivity(&input).unwrap().result;

    let direct = dcf::calculate_dcf(&base.with_discount_rates(dec!(0.15), dec!(0.035)))
        .unwrap()
        .result
        .enterprise_value;
    assert_eq!(grid.cell(2, 2), Some(direct.round_dp(1)));
}
