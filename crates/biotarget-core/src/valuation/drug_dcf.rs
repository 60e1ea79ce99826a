use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::{AssumptionTables, CostAssumptions};
use crate::error::BiotargetError;
use crate::types::{
    with_metadata, ClinicalPhase, ComputationOutput, CurveArchetype, Money, Multiple, Probability,
    Rate, TherapeuticArea,
};
use crate::BiotargetResult;

use super::revenue::{project_revenue, RevenueProjectionInput};

/// Default explicit projection horizon.
const DEFAULT_HORIZON_YEARS: u32 = 20;

/// Annual growth applied to the phase-indexed development burn.
const DEV_BURN_GROWTH: Decimal = dec!(1.05);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Input parameters for a single-asset risk-adjusted DCF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugDcfInput {
    pub drug_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    pub phase: ClinicalPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapeutic_area: Option<TherapeuticArea>,
    pub archetype: CurveArchetype,
    pub peak_sales_estimate: Money,
    pub years_to_launch: u32,
    /// Patent life remaining, measured from launch
    pub patent_life_years: u32,
    /// Explicit projection horizon (default: 20 years)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon_years: Option<u32>,
    /// Operating cost structure (default: assumption tables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<CostAssumptions>,
    /// WACC override (default: stage-derived from the phase)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    /// Probability-of-success override (default: phase table x area multiplier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_override: Option<Probability>,
    /// Explicit pre-launch development cost schedule, one entry per
    /// pre-launch year (default: phase-indexed burn growing 5%/year)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development_costs: Option<Vec<Money>>,
    /// Overrides the archetype ramp length (sensitivity sweeps)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_years_override: Option<u32>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Valuation of a single drug candidate. Purely a function of its inputs;
/// recomputed, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugValuation {
    pub drug_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    pub phase: ClinicalPhase,
    pub annual_revenue: Vec<Money>,
    pub annual_free_cash_flow: Vec<Money>,
    pub peak_sales: Money,
    pub years_to_peak: u32,
    pub npv_unadjusted: Money,
    pub npv_risk_adjusted: Money,
    pub probability_of_success: Probability,
    pub discount_rate: Rate,
    /// npv_risk_adjusted / peak_sales
    pub peak_multiple: Multiple,
}

/// A single point in a one-factor sensitivity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub value: Decimal,
    pub npv_risk_adjusted: Money,
}

/// One-factor sweep of a single input parameter, all others held at base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityTable {
    pub parameter: String,
    pub base_value: Decimal,
    pub points: Vec<SensitivityPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub base_npv_risk_adjusted: Money,
    pub tables: Vec<SensitivityTable>,
}

/// Probability weights for the three scenario cases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioWeights {
    pub bear: Probability,
    pub base: Probability,
    pub bull: Probability,
}

impl Default for ScenarioWeights {
    fn default() -> Self {
        Self {
            bear: dec!(0.25),
            base: dec!(0.50),
            bull: dec!(0.25),
        }
    }
}

impl ScenarioWeights {
    pub fn validate(&self) -> BiotargetResult<()> {
        for (name, w) in [("bear", self.bear), ("base", self.base), ("bull", self.bull)] {
            if w < Decimal::ZERO || w > Decimal::ONE {
                return Err(BiotargetError::InvalidInput {
                    field: format!("scenario_weights.{name}"),
                    reason: "Weight must be between 0 and 1".into(),
                });
            }
        }
        let sum = self.bear + self.base + self.bull;
        if (sum - Decimal::ONE).abs() > dec!(0.001) {
            return Err(BiotargetError::InvalidInput {
                field: "scenario_weights".into(),
                reason: format!("Weights must sum to 1.0 (got {sum})"),
            });
        }
        Ok(())
    }
}

/// One scenario case with the assumptions it ran under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCase {
    pub name: String,
    pub peak_sales: Money,
    pub probability_of_success: Probability,
    pub discount_rate: Rate,
    pub years_to_launch: u32,
    pub npv_unadjusted: Money,
    pub npv_risk_adjusted: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub bear: ScenarioCase,
    pub base: ScenarioCase,
    pub bull: ScenarioCase,
    /// Expected value across the three cases under the supplied weights
    pub probability_weighted_value: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a risk-adjusted single-asset DCF.
pub fn value_drug(
    input: &DrugDcfInput,
    tables: &AssumptionTables,
) -> BiotargetResult<ComputationOutput<DrugValuation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let valuation = run_valuation(input, tables, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Risk-Adjusted Drug DCF (rNPV)",
        input,
        warnings,
        elapsed,
        valuation,
    ))
}

/// One-factor-at-a-time sensitivity across peak sales, discount rate,
/// probability of success and time-to-peak. Each sweep holds every other
/// input at base; this is a tornado analysis, not a joint sweep.
pub fn sensitivity_analysis(
    input: &DrugDcfInput,
    tables: &AssumptionTables,
) -> BiotargetResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let base = run_valuation(input, tables, &mut warnings)?;

    let multipliers = [dec!(0.5), dec!(0.75), dec!(1.0), dec!(1.25), dec!(1.5)];
    let discount_grid = [
        dec!(0.08),
        dec!(0.10),
        dec!(0.12),
        dec!(0.14),
        dec!(0.16),
        dec!(0.18),
    ];
    let time_to_peak_grid: [u32; 5] = [3, 4, 5, 6, 7];

    // -- Peak sales sweep ----------------------------------------------------
    let mut peak_points = Vec::with_capacity(multipliers.len());
    for m in multipliers {
        let mut sweep = input.clone();
        sweep.peak_sales_estimate = input.peak_sales_estimate * m;
        let v = run_valuation(&sweep, tables, &mut warnings)?;
        peak_points.push(SensitivityPoint {
            value: sweep.peak_sales_estimate,
            npv_risk_adjusted: v.npv_risk_adjusted,
        });
    }

    // -- Discount rate sweep (absolute grid) ---------------------------------
    let mut discount_points = Vec::with_capacity(discount_grid.len());
    for r in discount_grid {
        let mut sweep = input.clone();
        sweep.discount_rate = Some(r);
        let v = run_valuation(&sweep, tables, &mut warnings)?;
        discount_points.push(SensitivityPoint {
            value: r,
            npv_risk_adjusted: v.npv_risk_adjusted,
        });
    }

    // -- PoS sweep (multiplier grid, capped at 1.0) --------------------------
    let mut pos_points = Vec::with_capacity(multipliers.len());
    for m in multipliers {
        let mut sweep = input.clone();
        let pos = cap_probability(base.probability_of_success * m);
        sweep.pos_override = Some(pos);
        let v = run_valuation(&sweep, tables, &mut warnings)?;
        pos_points.push(SensitivityPoint {
            value: pos,
            npv_risk_adjusted: v.npv_risk_adjusted,
        });
    }

    // -- Time-to-peak sweep --------------------------------------------------
    // Time-to-peak = years_to_launch + ramp; the sweep holds launch timing
    // fixed and stretches or compresses the ramp to hit the grid value.
    let mut ttp_points = Vec::with_capacity(time_to_peak_grid.len());
    for target in time_to_peak_grid {
        let mut sweep = input.clone();
        let ramp = target.saturating_sub(input.years_to_launch).max(1);
        sweep.ramp_years_override = Some(ramp);
        let v = run_valuation(&sweep, tables, &mut warnings)?;
        ttp_points.push(SensitivityPoint {
            value: Decimal::from(input.years_to_launch + ramp),
            npv_risk_adjusted: v.npv_risk_adjusted,
        });
    }

    let output = SensitivityOutput {
        base_npv_risk_adjusted: base.npv_risk_adjusted,
        tables: vec![
            SensitivityTable {
                parameter: "peak_sales".into(),
                base_value: input.peak_sales_estimate,
                points: peak_points,
            },
            SensitivityTable {
                parameter: "discount_rate".into(),
                base_value: base.discount_rate,
                points: discount_points,
            },
            SensitivityTable {
                parameter: "probability_of_success".into(),
                base_value: base.probability_of_success,
                points: pos_points,
            },
            SensitivityTable {
                parameter: "time_to_peak".into(),
                base_value: Decimal::from(base.years_to_peak),
                points: ttp_points,
            },
        ],
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-Factor Sensitivity Analysis (Tornado)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Bear / base / bull scenario analysis with a probability-weighted
/// expected value. Bear and bull apply fixed haircuts and uplifts to peak
/// sales, PoS, discount rate and launch timing.
pub fn scenario_analysis(
    input: &DrugDcfInput,
    tables: &AssumptionTables,
    weights: Option<ScenarioWeights>,
) -> BiotargetResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let weights = weights.unwrap_or_default();
    weights.validate()?;

    let base_val = run_valuation(input, tables, &mut warnings)?;
    let base_pos = base_val.probability_of_success;
    let base_rate = base_val.discount_rate;

    // Bear: softer launch, cheaper price, later market entry
    let mut bear_input = input.clone();
    bear_input.peak_sales_estimate = input.peak_sales_estimate * dec!(0.6);
    bear_input.pos_override = Some(cap_probability(base_pos * dec!(0.7)));
    bear_input.discount_rate = Some(base_rate + dec!(0.03));
    bear_input.years_to_launch = input.years_to_launch + 1;
    let bear_val = run_valuation(&bear_input, tables, &mut warnings)?;

    // Bull: upside launch, de-risked, accelerated entry
    let mut bull_input = input.clone();
    bull_input.peak_sales_estimate = input.peak_sales_estimate * dec!(1.4);
    bull_input.pos_override = Some(cap_probability(base_pos * dec!(1.3)));
    bull_input.discount_rate = Some((base_rate - dec!(0.03)).max(dec!(0.08)));
    bull_input.years_to_launch = input.years_to_launch.saturating_sub(1);
    let bull_val = run_valuation(&bull_input, tables, &mut warnings)?;

    let probability_weighted_value = weights.bear * bear_val.npv_risk_adjusted
        + weights.base * base_val.npv_risk_adjusted
        + weights.bull * bull_val.npv_risk_adjusted;

    let output = ScenarioOutput {
        bear: scenario_case("bear", &bear_input, &bear_val),
        base: scenario_case("base", input, &base_val),
        bull: scenario_case("bull", &bull_input, &bull_val),
        probability_weighted_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bear/Base/Bull Scenario Analysis",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Core calculation
// ---------------------------------------------------------------------------

/// Compute a valuation without the output envelope. Exposed for callers
/// that value many assets in one pass (pipeline valuation).
pub fn run_valuation(
    input: &DrugDcfInput,
    tables: &AssumptionTables,
    warnings: &mut Vec<String>,
) -> BiotargetResult<DrugValuation> {
    validate_input(input)?;

    let horizon = input.horizon_years.unwrap_or(DEFAULT_HORIZON_YEARS);
    let costs = input.costs.unwrap_or(tables.costs);
    let discount_rate = input
        .discount_rate
        .unwrap_or_else(|| tables.discount_rate_for_phase(input.phase));
    let pos = match input.pos_override {
        Some(p) => p,
        None => tables.probability_of_success(input.phase, input.therapeutic_area),
    };

    if horizon <= input.years_to_launch {
        warnings.push(format!(
            "Projection horizon ({horizon}y) ends before launch ({}y); valuation is development cost only",
            input.years_to_launch
        ));
    }

    // --- Revenue curve ---
    let revenue = project_revenue(
        &RevenueProjectionInput {
            peak_sales: input.peak_sales_estimate,
            archetype: input.archetype,
            years_to_launch: input.years_to_launch,
            patent_life_years: input.patent_life_years,
            horizon_years: horizon,
            ramp_years_override: input.ramp_years_override,
        },
        tables,
    )?;

    // --- Pre-launch development costs ---
    let dev_costs = development_schedule(input, tables)?;

    // --- Annual free cash flows ---
    let mut cash_flows = Vec::with_capacity(horizon as usize);
    for (year, rev) in revenue.iter().enumerate() {
        let cf = if (year as u32) < input.years_to_launch {
            -dev_costs[year]
        } else {
            free_cash_flow(*rev, &costs)
        };
        cash_flows.push(cf);
    }

    // --- Discount at WACC ---
    let mut npv = Decimal::ZERO;
    for (year, cf) in cash_flows.iter().enumerate() {
        let factor = (Decimal::ONE + discount_rate).powu(year as u64 + 1);
        npv += *cf / factor;
    }

    // Simple multiplicative de-risking; no path dependency modeled
    let npv_risk_adjusted = npv * pos;

    let mut ramp = tables.archetype_params(input.archetype).ramp_years;
    if let Some(r) = input.ramp_years_override {
        ramp = r.max(1);
    }

    let peak_multiple = if input.peak_sales_estimate > Decimal::ZERO {
        npv_risk_adjusted / input.peak_sales_estimate
    } else {
        Decimal::ZERO
    };

    Ok(DrugValuation {
        drug_name: input.drug_name.clone(),
        indication: input.indication.clone(),
        phase: input.phase,
        annual_revenue: revenue,
        annual_free_cash_flow: cash_flows,
        peak_sales: input.peak_sales_estimate,
        years_to_peak: input.years_to_launch + ramp,
        npv_unadjusted: npv,
        npv_risk_adjusted,
        probability_of_success: pos,
        discount_rate,
        peak_multiple,
    })
}

/// EBIT -> taxed -> FCF for one post-launch year.
fn free_cash_flow(revenue: Money, costs: &CostAssumptions) -> Money {
    let operating_margin = Decimal::ONE
        - costs.cogs_pct
        - costs.rd_pct
        - costs.sga_pct
        - costs.da_pct;
    let ebit = revenue * operating_margin;
    // No loss carryback benefit modeled
    let tax = if ebit > Decimal::ZERO {
        ebit * costs.tax_rate
    } else {
        Decimal::ZERO
    };
    let da = revenue * costs.da_pct;
    let capex = revenue * costs.capex_pct;
    (ebit - tax) + da - capex
}

fn development_schedule(
    input: &DrugDcfInput,
    tables: &AssumptionTables,
) -> BiotargetResult<Vec<Money>> {
    let n = input.years_to_launch as usize;
    if let Some(ref schedule) = input.development_costs {
        if schedule.len() != n {
            return Err(BiotargetError::InvalidInput {
                field: "development_costs".into(),
                reason: format!(
                    "Schedule has {} entries but there are {} pre-launch years",
                    schedule.len(),
                    n
                ),
            });
        }
        return Ok(schedule.clone());
    }
    let base_burn = *tables.dev_burn_by_phase.get(input.phase);
    let mut schedule = Vec::with_capacity(n);
    for year in 0..n {
        schedule.push(base_burn * DEV_BURN_GROWTH.powu(year as u64));
    }
    Ok(schedule)
}

fn validate_input(input: &DrugDcfInput) -> BiotargetResult<()> {
    if input.drug_name.trim().is_empty() {
        return Err(BiotargetError::InvalidInput {
            field: "drug_name".into(),
            reason: "Drug name must not be empty".into(),
        });
    }
    if input.peak_sales_estimate <= Decimal::ZERO {
        return Err(BiotargetError::InvalidInput {
            field: "peak_sales_estimate".into(),
            reason: "Peak sales estimate must be positive".into(),
        });
    }
    if let Some(r) = input.discount_rate {
        if r <= Decimal::ZERO {
            return Err(BiotargetError::InvalidInput {
                field: "discount_rate".into(),
                reason: "Discount rate must be positive".into(),
            });
        }
    }
    if let Some(p) = input.pos_override {
        if p <= Decimal::ZERO || p > Decimal::ONE {
            return Err(BiotargetError::InvalidInput {
                field: "pos_override".into(),
                reason: "Probability of success must be in (0, 1]".into(),
            });
        }
    }
    if let Some(ref costs) = input.costs {
        if costs.tax_rate < Decimal::ZERO || costs.tax_rate > Decimal::ONE {
            return Err(BiotargetError::InvalidInput {
                field: "costs.tax_rate".into(),
                reason: "Tax rate must be between 0 and 1".into(),
            });
        }
    }
    Ok(())
}

fn cap_probability(p: Probability) -> Probability {
    if p > Decimal::ONE {
        Decimal::ONE
    } else {
        p
    }
}

fn scenario_case(name: &str, input: &DrugDcfInput, valuation: &DrugValuation) -> ScenarioCase {
    ScenarioCase {
        name: name.to_string(),
        peak_sales: input.peak_sales_estimate,
        probability_of_success: valuation.probability_of_success,
        discount_rate: valuation.discount_rate,
        years_to_launch: input.years_to_launch,
        npv_unadjusted: valuation.npv_unadjusted,
        npv_risk_adjusted: valuation.npv_risk_adjusted,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
