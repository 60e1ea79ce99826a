use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::assumptions::{AssumptionTables, CostAssumptions};
use crate::error::BiotargetError;
use crate::types::{
    with_metadata, ClinicalPhase, ComputationOutput, CurveArchetype, Money, Probability, Rate,
    TherapeuticArea,
};
use crate::BiotargetResult;

use super::drug_dcf::{run_valuation, DrugDcfInput, DrugValuation};

/// Maximum portfolio uplift from diversification, applied at zero
/// concentration and zero correlation.
const DEFAULT_DIVERSIFICATION_UPLIFT_CAP: Decimal = dec!(0.10);

/// Control premium applied to derive an implied acquisition value.
const DEFAULT_CONTROL_PREMIUM: Decimal = dec!(0.40);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One development-stage asset in a company's pipeline. Owned by whoever
/// constructs the portfolio; immutable once valued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugCandidate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    pub phase: ClinicalPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapeutic_area: Option<TherapeuticArea>,
    pub archetype: CurveArchetype,
    pub peak_sales_estimate: Money,
    pub years_to_launch: u32,
    pub patent_life_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos_override: Option<Probability>,
}

impl DrugCandidate {
    fn to_dcf_input(
        &self,
        horizon_years: Option<u32>,
        costs: Option<CostAssumptions>,
    ) -> DrugDcfInput {
        DrugDcfInput {
            drug_name: self.name.clone(),
            indication: self.indication.clone(),
            phase: self.phase,
            therapeutic_area: self.therapeutic_area,
            archetype: self.archetype,
            peak_sales_estimate: self.peak_sales_estimate,
            years_to_launch: self.years_to_launch,
            patent_life_years: self.patent_life_years,
            horizon_years,
            costs,
            discount_rate: None,
            pos_override: self.pos_override,
            development_costs: None,
            ramp_years_override: None,
        }
    }
}

/// Input for a multi-asset pipeline valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineValuationInput {
    pub company_name: String,
    pub candidates: Vec<DrugCandidate>,
    /// Apply the concentration-aware diversification uplift
    pub apply_diversification: bool,
    /// Pairwise asset correlation proxy in [0, 1]; 1.0 = perfectly
    /// correlated, no diversification benefit
    pub correlation_factor: Rate,
    /// Current market capitalization for the comparison block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Money>,
    /// Override for the 40% control-premium heuristic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_premium: Option<Rate>,
    /// Override for the 10% diversification uplift cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diversification_uplift_cap: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<CostAssumptions>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCapComparison {
    pub market_cap: Money,
    /// pipeline value / market cap - 1
    pub premium_discount: Rate,
    /// pipeline value x (1 + control premium)
    pub implied_acquisition_value: Money,
}

/// Sum-of-parts valuation of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub company_name: String,
    /// Plain sum of risk-adjusted asset NPVs
    pub total_pipeline_value: Money,
    /// Sum-of-parts after the diversification adjustment
    pub risk_adjusted_value: Money,
    pub diversification_benefit: Rate,
    pub herfindahl_index: Decimal,
    /// Largest single asset's share of the total
    pub top_asset_concentration: Rate,
    pub valuations: Vec<DrugValuation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_comparison: Option<MarketCapComparison>,
}

/// Aggregation bucket for by-phase / by-indication groupings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationGroup {
    pub key: String,
    pub total_value: Money,
    pub asset_count: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value every candidate via the drug DCF, sum to a sum-of-parts total,
/// and apply the concentration-aware diversification adjustment.
pub fn value_pipeline(
    input: &PipelineValuationInput,
    tables: &AssumptionTables,
) -> BiotargetResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.candidates.is_empty() {
        return Err(BiotargetError::InsufficientData(
            "Pipeline valuation requires at least one candidate".into(),
        ));
    }
    if input.correlation_factor < Decimal::ZERO || input.correlation_factor > Decimal::ONE {
        return Err(BiotargetError::InvalidInput {
            field: "correlation_factor".into(),
            reason: "Correlation factor must be between 0 and 1".into(),
        });
    }

    // --- Value each asset ---
    let mut valuations = Vec::with_capacity(input.candidates.len());
    for candidate in &input.candidates {
        let dcf_input = candidate.to_dcf_input(input.horizon_years, input.costs);
        let valuation = run_valuation(&dcf_input, tables, &mut warnings)?;
        valuations.push(valuation);
    }

    // --- Sum of parts ---
    let total: Money = valuations.iter().map(|v| v.npv_risk_adjusted).sum();

    // --- Concentration ---
    let (herfindahl, top_concentration) = concentration(&valuations, total, &mut warnings);

    // --- Diversification adjustment ---
    let uplift_cap = input
        .diversification_uplift_cap
        .unwrap_or(DEFAULT_DIVERSIFICATION_UPLIFT_CAP);
    let (benefit, risk_adjusted_value) = if input.apply_diversification
        && input.candidates.len() > 1
        && total > Decimal::ZERO
    {
        let benefit = (Decimal::ONE - herfindahl) * (Decimal::ONE - input.correlation_factor);
        (benefit, total * (Decimal::ONE + benefit * uplift_cap))
    } else {
        (Decimal::ZERO, total)
    };

    // --- Market cap comparison ---
    let market_cap_comparison = match input.market_cap {
        Some(mcap) if mcap > Decimal::ZERO => {
            let premium = input.control_premium.unwrap_or(DEFAULT_CONTROL_PREMIUM);
            Some(MarketCapComparison {
                market_cap: mcap,
                premium_discount: risk_adjusted_value / mcap - Decimal::ONE,
                implied_acquisition_value: risk_adjusted_value * (Decimal::ONE + premium),
            })
        }
        Some(_) => {
            warnings.push("Market cap must be positive; comparison skipped".into());
            None
        }
        None => None,
    };

    let output = PortfolioSummary {
        company_name: input.company_name.clone(),
        total_pipeline_value: total,
        risk_adjusted_value,
        diversification_benefit: benefit,
        herfindahl_index: herfindahl,
        top_asset_concentration: top_concentration,
        valuations,
        market_cap_comparison,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sum-of-Parts Pipeline Valuation",
        &serde_json::json!({
            "candidates": input.candidates.len(),
            "apply_diversification": input.apply_diversification,
            "correlation_factor": input.correlation_factor.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Group valuations by clinical phase, summing value and counting assets.
pub fn group_by_phase(valuations: &[DrugValuation]) -> Vec<ValuationGroup> {
    group_by(valuations, |v| v.phase.label().to_string())
}

/// Group valuations by indication; assets without one land in "unspecified".
pub fn group_by_indication(valuations: &[DrugValuation]) -> Vec<ValuationGroup> {
    group_by(valuations, |v| {
        v.indication
            .clone()
            .unwrap_or_else(|| "unspecified".to_string())
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Herfindahl index and top-asset share over risk-adjusted values.
/// Negative asset values are floored at zero for share purposes.
fn concentration(
    valuations: &[DrugValuation],
    total: Money,
    warnings: &mut Vec<String>,
) -> (Decimal, Rate) {
    if total <= Decimal::ZERO {
        if valuations.len() > 1 {
            warnings.push(
                "Total pipeline value is not positive; concentration metrics set to 1.0".into(),
            );
        }
        return (Decimal::ONE, Decimal::ONE);
    }

    let mut herfindahl = Decimal::ZERO;
    let mut top_share = Decimal::ZERO;
    for v in valuations {
        let value = if v.npv_risk_adjusted > Decimal::ZERO {
            v.npv_risk_adjusted
        } else {
            warnings.push(format!(
                "Asset '{}' has non-positive risk-adjusted NPV; treated as zero weight",
                v.drug_name
            ));
            Decimal::ZERO
        };
        let share = value / total;
        herfindahl += share * share;
        if share > top_share {
            top_share = share;
        }
    }
    (herfindahl, top_share)
}

fn group_by<F>(valuations: &[DrugValuation], key_fn: F) -> Vec<ValuationGroup>
where
    F: Fn(&DrugValuation) -> String,
{
    let mut groups: Vec<ValuationGroup> = Vec::new();
    for v in valuations {
        let key = key_fn(v);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => {
                group.total_value += v.npv_risk_adjusted;
                group.asset_count += 1;
            }
            None => groups.push(ValuationGroup {
                key,
                total_value: v.npv_risk_adjusted,
                asset_count: 1,
            }),
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
