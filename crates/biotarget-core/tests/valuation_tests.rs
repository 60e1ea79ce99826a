use biotarget_core::assumptions::AssumptionTables;
use biotarget_core::types::{ClinicalPhase, CurveArchetype, TherapeuticArea};
use biotarget_core::valuation::drug_dcf::{
    scenario_analysis, sensitivity_analysis, value_drug, DrugDcfInput,
};
use biotarget_core::valuation::pipeline::{value_pipeline, DrugCandidate, PipelineValuationInput};
use biotarget_core::valuation::revenue::{project_revenue, RevenueProjectionInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Revenue curve properties
// ===========================================================================

#[test]
fn test_revenue_curve_properties_hold_for_every_archetype() {
    let tables = AssumptionTables::default();
    let archetypes = [
        CurveArchetype::Standard,
        CurveArchetype::Blockbuster,
        CurveArchetype::Orphan,
        CurveArchetype::FastFollower,
        CurveArchetype::GeneTherapy,
    ];
    let peak = dec!(1_500_000_000);

    for archetype in archetypes {
        let input = RevenueProjectionInput {
            peak_sales: peak,
            archetype,
            years_to_launch: 3,
            patent_life_years: 13,
            horizon_years: 25,
            ramp_years_override: None,
        };
        let revenue = project_revenue(&input, &tables).unwrap();

        // Length equals the horizon, every value is non-negative
        assert_eq!(revenue.len(), 25, "{archetype:?}");
        assert!(
            revenue.iter().all(|v| *v >= Decimal::ZERO),
            "{archetype:?} produced a negative revenue year"
        );

        // The plateau reaches peak within 1%
        let params = tables.archetype_params(archetype);
        let plateau_year = (3 + params.ramp_years) as usize;
        assert!(
            (revenue[plateau_year] - peak).abs() <= peak * dec!(0.01),
            "{archetype:?} plateau {} deviates from peak {}",
            revenue[plateau_year],
            peak
        );

        // Nothing before launch
        assert_eq!(revenue[0], Decimal::ZERO);
        assert_eq!(revenue[2], Decimal::ZERO);
    }
}

// ===========================================================================
// DrugDCF reference case (Phase 3, $2.5B peak)
// ===========================================================================

fn phase3_reference() -> DrugDcfInput {
    DrugDcfInput {
        drug_name: "BT-501".into(),
        indication: Some("nsclc".into()),
        phase: ClinicalPhase::Phase3,
        therapeutic_area: None,
        archetype: CurveArchetype::Standard,
        peak_sales_estimate: dec!(2_500_000_000),
        years_to_launch: 2,
        patent_life_years: 12,
        horizon_years: None,
        costs: None,
        discount_rate: None,
        pos_override: None,
        development_costs: None,
        ramp_years_override: None,
    }
}

#[test]
fn test_phase3_reference_valuation() {
    let tables = AssumptionTables::default();
    let v = value_drug(&phase3_reference(), &tables).unwrap().result;

    assert!(v.npv_risk_adjusted > Decimal::ZERO);
    assert!(v.npv_risk_adjusted < v.npv_unadjusted);
    // Phase 3 typical PoS
    assert_eq!(v.probability_of_success, dec!(0.60));
    // Stage-derived discount rate for a late-stage asset
    assert_eq!(v.discount_rate, dec!(0.12));
    // Standard archetype: launch in 2, ramp of 5
    assert_eq!(v.years_to_peak, 7);
}

#[test]
fn test_monotonicity_properties() {
    let tables = AssumptionTables::default();
    let base = value_drug(&phase3_reference(), &tables).unwrap().result;

    // Higher peak sales raises risk-adjusted NPV
    let mut upsized = phase3_reference();
    upsized.peak_sales_estimate = dec!(3_500_000_000);
    let up = value_drug(&upsized, &tables).unwrap().result;
    assert!(up.npv_risk_adjusted > base.npv_risk_adjusted);

    // Higher discount rate lowers it
    let mut expensive = phase3_reference();
    expensive.discount_rate = Some(dec!(0.18));
    let exp = value_drug(&expensive, &tables).unwrap().result;
    assert!(exp.npv_risk_adjusted < base.npv_risk_adjusted);

    // Higher PoS (below the cap) raises it
    let mut likelier = phase3_reference();
    likelier.pos_override = Some(dec!(0.75));
    let lik = value_drug(&likelier, &tables).unwrap().result;
    assert!(lik.npv_risk_adjusted > base.npv_risk_adjusted);
}

#[test]
fn test_scenarios_bracket_the_base_case() {
    let tables = AssumptionTables::default();
    let out = scenario_analysis(&phase3_reference(), &tables, None)
        .unwrap()
        .result;
    assert!(out.bear.npv_risk_adjusted < out.base.npv_risk_adjusted);
    assert!(out.base.npv_risk_adjusted < out.bull.npv_risk_adjusted);
    assert!(out.probability_weighted_value > out.bear.npv_risk_adjusted);
    assert!(out.probability_weighted_value < out.bull.npv_risk_adjusted);
}

#[test]
fn test_sensitivity_sweeps_cover_standard_grids() {
    let tables = AssumptionTables::default();
    let out = sensitivity_analysis(&phase3_reference(), &tables)
        .unwrap()
        .result;

    let discount = out
        .tables
        .iter()
        .find(|t| t.parameter == "discount_rate")
        .unwrap();
    assert_eq!(discount.points.first().unwrap().value, dec!(0.08));
    assert_eq!(discount.points.last().unwrap().value, dec!(0.18));

    let peak = out.tables.iter().find(|t| t.parameter == "peak_sales").unwrap();
    assert_eq!(
        peak.points.first().unwrap().value,
        dec!(2_500_000_000) * dec!(0.5)
    );
    assert_eq!(
        peak.points.last().unwrap().value,
        dec!(2_500_000_000) * dec!(1.5)
    );

    let ttp = out.tables.iter().find(|t| t.parameter == "time_to_peak").unwrap();
    let times: Vec<Decimal> = ttp.points.iter().map(|p| p.value).collect();
    assert_eq!(times, vec![dec!(3), dec!(4), dec!(5), dec!(6), dec!(7)]);
}

// ===========================================================================
// Pipeline valuation
// ===========================================================================

fn two_asset_pipeline() -> PipelineValuationInput {
    PipelineValuationInput {
        company_name: "Orphix Therapeutics".into(),
        candidates: vec![
            DrugCandidate {
                name: "ORX-201".into(),
                indication: Some("nsclc".into()),
                phase: ClinicalPhase::Phase3,
                therapeutic_area: Some(TherapeuticArea::Oncology),
                archetype: CurveArchetype::Standard,
                peak_sales_estimate: dec!(2_500_000_000),
                years_to_launch: 2,
                patent_life_years: 12,
                pos_override: None,
            },
            DrugCandidate {
                name: "ORX-305".into(),
                indication: Some("sickle cell disease".into()),
                phase: ClinicalPhase::Phase2,
                therapeutic_area: Some(TherapeuticArea::RareDisease),
                archetype: CurveArchetype::Orphan,
                peak_sales_estimate: dec!(1_000_000_000),
                years_to_launch: 4,
                patent_life_years: 14,
                pos_override: None,
            },
        ],
        apply_diversification: true,
        correlation_factor: dec!(0.5),
        market_cap: Some(dec!(2_400_000_000)),
        control_premium: None,
        diversification_uplift_cap: None,
        horizon_years: None,
        costs: None,
    }
}

#[test]
fn test_sum_of_parts_invariant_with_adjustment_disabled() {
    let tables = AssumptionTables::default();
    let mut input = two_asset_pipeline();
    input.apply_diversification = false;
    let out = value_pipeline(&input, &tables).unwrap().result;

    let individual_sum: Decimal = input
        .candidates
        .iter()
        .map(|c| {
            let dcf = DrugDcfInput {
                drug_name: c.name.clone(),
                indication: c.indication.clone(),
                phase: c.phase,
                therapeutic_area: c.therapeutic_area,
                archetype: c.archetype,
                peak_sales_estimate: c.peak_sales_estimate,
                years_to_launch: c.years_to_launch,
                patent_life_years: c.patent_life_years,
                horizon_years: None,
                costs: None,
                discount_rate: None,
                pos_override: None,
                development_costs: None,
                ramp_years_override: None,
            };
            value_drug(&dcf, &tables).unwrap().result.npv_risk_adjusted
        })
        .sum();

    assert!(
        (out.total_pipeline_value - individual_sum).abs() < dec!(0.000001),
        "Sum-of-parts {} deviates from individual sum {}",
        out.total_pipeline_value,
        individual_sum
    );
    assert_eq!(out.risk_adjusted_value, out.total_pipeline_value);
}

#[test]
fn test_diversification_uplift_within_ten_percent() {
    let tables = AssumptionTables::default();
    let mut input = two_asset_pipeline();
    input.correlation_factor = dec!(0.9);
    let out = value_pipeline(&input, &tables).unwrap().result;

    assert!(out.risk_adjusted_value >= out.total_pipeline_value);
    assert!(out.risk_adjusted_value <= out.total_pipeline_value * dec!(1.10));
    // High correlation keeps the uplift small
    assert!(out.diversification_benefit < dec!(0.10));
}

#[test]
fn test_market_cap_comparison_and_control_premium() {
    let tables = AssumptionTables::default();
    let out = value_pipeline(&two_asset_pipeline(), &tables).unwrap().result;
    let cmp = out.market_cap_comparison.as_ref().unwrap();

    assert_eq!(
        cmp.premium_discount,
        out.risk_adjusted_value / dec!(2_400_000_000) - Decimal::ONE
    );
    assert_eq!(
        cmp.implied_acquisition_value,
        out.risk_adjusted_value * dec!(1.40)
    );
}
