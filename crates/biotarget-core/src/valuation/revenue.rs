use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::assumptions::AssumptionTables;
use crate::error::BiotargetError;
use crate::types::{CurveArchetype, Money};
use crate::BiotargetResult;

/// Annual erosion applied to post-cliff revenue, for up to
/// `POST_EXPIRY_EROSION_YEARS` years after patent expiry.
const POST_EXPIRY_EROSION: Decimal = dec!(0.90);
const POST_EXPIRY_EROSION_YEARS: u32 = 3;

/// Steepness of the launch ramp sigmoid. Higher values concentrate more
/// of the uptake into the middle ramp years.
const RAMP_STEEPNESS: Decimal = dec!(6);

/// Input to the revenue projector. Years are whole calendar years; year 0
/// of the projection is the first year of the horizon, launch occurs
/// `years_to_launch` years in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueProjectionInput {
    pub peak_sales: Money,
    pub archetype: CurveArchetype,
    pub years_to_launch: u32,
    /// Patent life remaining, measured from launch
    pub patent_life_years: u32,
    pub horizon_years: u32,
    /// Overrides the archetype's ramp length (sensitivity sweeps)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_years_override: Option<u32>,
}

/// Project a year-by-year revenue sequence of length `horizon_years`.
///
/// Curve segments, in offset-since-launch order: zero before launch, a
/// tanh-smoothed S-curve ramp that lands exactly on peak sales, a plateau
/// at peak, a linear pre-expiry decline toward a floor of
/// (cliff + 0.1) x peak, an immediate drop to cliff x peak at expiry, and
/// geometric 10%/year erosion for three further years before flattening.
pub fn project_revenue(
    input: &RevenueProjectionInput,
    tables: &AssumptionTables,
) -> BiotargetResult<Vec<Money>> {
    validate(input)?;

    let mut params = tables.archetype_params(input.archetype);
    if let Some(ramp) = input.ramp_years_override {
        params.ramp_years = ramp.max(1);
    }

    let peak = input.peak_sales;
    let cliff = params.patent_cliff_multiplier;
    let decline_floor = (cliff + dec!(0.1)) * peak;
    let mut revenue = Vec::with_capacity(input.horizon_years as usize);

    for year in 0..input.horizon_years {
        if year < input.years_to_launch {
            revenue.push(Decimal::ZERO);
            continue;
        }
        let t = year - input.years_to_launch;

        let value = if t >= input.patent_life_years {
            // Loss of exclusivity: cliff, then erosion, then flat
            let years_past = (t - input.patent_life_years).min(POST_EXPIRY_EROSION_YEARS);
            cliff * peak * POST_EXPIRY_EROSION.powu(years_past as u64)
        } else if t < params.ramp_years {
            let progress =
                Decimal::from(t + 1) / Decimal::from(params.ramp_years);
            peak * s_curve(progress)
        } else if t < params.decline_start_year {
            peak
        } else {
            // Linear decay from peak toward the pre-expiry floor
            let span = input.patent_life_years - params.decline_start_year;
            let frac = Decimal::from(t - params.decline_start_year) / Decimal::from(span);
            peak - (peak - decline_floor) * frac
        };
        revenue.push(value);
    }

    Ok(revenue)
}

fn validate(input: &RevenueProjectionInput) -> BiotargetResult<()> {
    if input.peak_sales < Decimal::ZERO {
        return Err(BiotargetError::InvalidInput {
            field: "peak_sales".into(),
            reason: "Peak sales must be non-negative".into(),
        });
    }
    if input.horizon_years == 0 {
        return Err(BiotargetError::InvalidInput {
            field: "horizon_years".into(),
            reason: "Projection horizon must be at least one year".into(),
        });
    }
    if input.patent_life_years == 0 {
        return Err(BiotargetError::InvalidInput {
            field: "patent_life_years".into(),
            reason: "Patent life must be at least one year".into(),
        });
    }
    Ok(())
}

/// Normalised tanh sigmoid on [0, 1], pinned to 0 at t = 0 and exactly 1
/// at t = 1 so the final ramp year lands on peak sales.
fn s_curve(t: Decimal) -> Decimal {
    let half = tanh(RAMP_STEEPNESS / dec!(2));
    let raw = tanh(RAMP_STEEPNESS * (t - dec!(0.5)));
    (raw + half) / (dec!(2) * half)
}

fn tanh(x: Decimal) -> Decimal {
    let e2x = (dec!(2) * x).exp();
    (e2x - Decimal::ONE) / (e2x + Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> RevenueProjectionInput {
        RevenueProjectionInput {
            peak_sales: dec!(1_000_000_000),
            archetype: CurveArchetype::Standard,
            years_to_launch: 2,
            patent_life_years: 12,
            horizon_years: 20,
            ramp_years_override: None,
        }
    }

    #[test]
    fn test_sequence_length_matches_horizon() {
        let tables = AssumptionTables::default();
        let rev = project_revenue(&sample_input(), &tables).unwrap();
        assert_eq!(rev.len(), 20);
    }

    #[test]
    fn test_zero_before_launch() {
        let tables = AssumptionTables::default();
        let rev = project_revenue(&sample_input(), &tables).unwrap();
        assert_eq!(rev[0], Decimal::ZERO);
        assert_eq!(rev[1], Decimal::ZERO);
        assert!(rev[2] > Decimal::ZERO);
    }

    #[test]
    fn test_all_values_non_negative() {
        let tables = AssumptionTables::default();
        let rev = project_revenue(&sample_input(), &tables).unwrap();
        assert!(rev.iter().all(|v| *v >= Decimal::ZERO));
    }

    #[test]
    fn test_plateau_hits_peak() {
        let tables = AssumptionTables::default();
        let input = sample_input();
        let rev = project_revenue(&input, &tables).unwrap();
        // Standard archetype: ramp 5y, plateau years 5..9 after launch.
        // Launch at year 2, so years 7 and 8 of the horizon sit on the
        // plateau and must equal peak within 1%.
        let peak = input.peak_sales;
        let max_plateau = rev[7..=10].iter().copied().max().unwrap();
        assert!(
            (max_plateau - peak).abs() <= peak * dec!(0.01),
            "plateau max {max_plateau} should equal peak {peak}"
        );
    }

    #[test]
    fn test_ramp_is_monotonic_and_s_shaped() {
        let tables = AssumptionTables::default();
        let input = sample_input();
        let rev = project_revenue(&input, &tables).unwrap();
        // Ramp occupies horizon years 2..7 (launch offset 0..5)
        for w in rev[2..7].windows(2) {
            assert!(w[1] > w[0], "ramp must be strictly increasing");
        }
        // Mid-ramp growth exceeds first-year growth (sigmoid, not linear)
        let first_step = rev[3] - rev[2];
        let mid_step = rev[4] - rev[3];
        assert!(
            mid_step > first_step,
            "mid-ramp step {mid_step} should exceed first step {first_step}"
        );
    }

    #[test]
    fn test_cliff_at_patent_expiry() {
        let tables = AssumptionTables::default();
        let input = sample_input();
        let rev = project_revenue(&input, &tables).unwrap();
        let params = tables.archetype_params(CurveArchetype::Standard);
        // Expiry at launch offset 12 = horizon year 14
        let expiry = (input.years_to_launch + input.patent_life_years) as usize;
        assert_eq!(rev[expiry], params.patent_cliff_multiplier * input.peak_sales);
        // Year before expiry still sits above the post-cliff level
        assert!(rev[expiry - 1] > rev[expiry]);
    }

    #[test]
    fn test_post_expiry_erosion_then_flat() {
        let tables = AssumptionTables::default();
        let input = sample_input();
        let rev = project_revenue(&input, &tables).unwrap();
        let expiry = (input.years_to_launch + input.patent_life_years) as usize;
        assert_eq!(rev[expiry + 1], rev[expiry] * dec!(0.90));
        assert_eq!(rev[expiry + 2], rev[expiry] * dec!(0.90) * dec!(0.90));
        assert_eq!(rev[expiry + 3], rev[expiry] * dec!(0.90) * dec!(0.90) * dec!(0.90));
        // Flat after three erosion years
        assert_eq!(rev[expiry + 4], rev[expiry + 3]);
        assert_eq!(rev[expiry + 5], rev[expiry + 3]);
    }

    #[test]
    fn test_decline_moves_toward_floor() {
        let tables = AssumptionTables::default();
        let input = sample_input();
        let rev = project_revenue(&input, &tables).unwrap();
        let params = tables.archetype_params(CurveArchetype::Standard);
        // Decline runs from launch offset 9 to 11 (horizon years 11..13)
        let decline_start = (input.years_to_launch + params.decline_start_year) as usize;
        let expiry = (input.years_to_launch + input.patent_life_years) as usize;
        for i in decline_start..expiry - 1 {
            assert!(rev[i + 1] < rev[i], "decline must be strictly decreasing");
        }
        let floor = (params.patent_cliff_multiplier + dec!(0.1)) * input.peak_sales;
        assert!(rev[expiry - 1] >= floor);
    }

    #[test]
    fn test_gene_therapy_declines_early() {
        let tables = AssumptionTables::default();
        let mut input = sample_input();
        input.archetype = CurveArchetype::GeneTherapy;
        let rev = project_revenue(&input, &tables).unwrap();
        // Gene therapy: ramp 2, decline starts at offset 6 (horizon year 8)
        assert!(rev[9] < rev[7]);
    }

    #[test]
    fn test_ramp_override() {
        let tables = AssumptionTables::default();
        let mut input = sample_input();
        input.ramp_years_override = Some(1);
        let rev = project_revenue(&input, &tables).unwrap();
        // One-year ramp lands on peak immediately at launch
        assert_eq!(rev[2], input.peak_sales);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let tables = AssumptionTables::default();
        let mut input = sample_input();
        input.horizon_years = 0;
        assert!(project_revenue(&input, &tables).is_err());
    }

    #[test]
    fn test_negative_peak_rejected() {
        let tables = AssumptionTables::default();
        let mut input = sample_input();
        input.peak_sales = dec!(-1);
        assert!(project_revenue(&input, &tables).is_err());
    }

    #[test]
    fn test_s_curve_endpoints() {
        assert!(s_curve(Decimal::ZERO).abs() < dec!(0.000001));
        assert!((s_curve(Decimal::ONE) - Decimal::ONE).abs() < dec!(0.000001));
        // Midpoint of a symmetric sigmoid
        assert!((s_curve(dec!(0.5)) - dec!(0.5)).abs() < dec!(0.000001));
    }
}
