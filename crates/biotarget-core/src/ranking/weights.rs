use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BiotargetError;
use crate::types::{Rate, Score};
use crate::BiotargetResult;

/// Tolerance on the weight-sum invariant.
const WEIGHT_SUM_TOLERANCE: Decimal = dec!(0.001);

/// The twelve factor weights. The record is paired field-for-field with
/// `FactorScores`, so every factor has exactly one weight by construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankingWeights {
    pub pipeline_quality: Rate,
    pub market_cap_fit: Rate,
    pub cash_runway: Rate,
    pub therapeutic_area: Rate,
    pub clinical_stage: Rate,
    pub financial_distress: Rate,
    pub scientific_differentiation: Rate,
    pub acquisition_tension: Rate,
    pub strategic_acquirer_fit: Rate,
    pub data_catalyst_timing: Rate,
    pub competitive_landscape: Rate,
    pub deal_structure_feasibility: Rate,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            pipeline_quality: dec!(0.15),
            market_cap_fit: dec!(0.05),
            cash_runway: dec!(0.08),
            therapeutic_area: dec!(0.12),
            clinical_stage: dec!(0.10),
            financial_distress: dec!(0.07),
            scientific_differentiation: dec!(0.12),
            acquisition_tension: dec!(0.10),
            strategic_acquirer_fit: dec!(0.08),
            data_catalyst_timing: dec!(0.06),
            competitive_landscape: dec!(0.04),
            deal_structure_feasibility: dec!(0.03),
        }
    }
}

/// The twelve factor scores, each in [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FactorScores {
    pub pipeline_quality: Score,
    pub market_cap_fit: Score,
    pub cash_runway: Score,
    pub therapeutic_area: Score,
    pub clinical_stage: Score,
    pub financial_distress: Score,
    pub scientific_differentiation: Score,
    pub acquisition_tension: Score,
    pub strategic_acquirer_fit: Score,
    pub data_catalyst_timing: Score,
    pub competitive_landscape: Score,
    pub deal_structure_feasibility: Score,
}

impl FactorScores {
    /// Factor name / score pairs in declaration order.
    pub fn named(&self) -> [(&'static str, Score); 12] {
        [
            ("pipeline_quality", self.pipeline_quality),
            ("market_cap_fit", self.market_cap_fit),
            ("cash_runway", self.cash_runway),
            ("therapeutic_area", self.therapeutic_area),
            ("clinical_stage", self.clinical_stage),
            ("financial_distress", self.financial_distress),
            (
                "scientific_differentiation",
                self.scientific_differentiation,
            ),
            ("acquisition_tension", self.acquisition_tension),
            ("strategic_acquirer_fit", self.strategic_acquirer_fit),
            ("data_catalyst_timing", self.data_catalyst_timing),
            ("competitive_landscape", self.competitive_landscape),
            (
                "deal_structure_feasibility",
                self.deal_structure_feasibility,
            ),
        ]
    }
}

impl RankingWeights {
    /// Construct validated weights. The twelve weights must sum to 1.0
    /// within a +/-0.001 tolerance and each must be non-negative.
    pub fn try_new(weights: RankingWeights) -> BiotargetResult<Self> {
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> BiotargetResult<()> {
        for (name, w) in self.named() {
            if w < Decimal::ZERO {
                return Err(BiotargetError::InvalidInput {
                    field: format!("weights.{name}"),
                    reason: "Weight must be non-negative".into(),
                });
            }
        }
        let sum = self.sum();
        if (sum - Decimal::ONE).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(BiotargetError::InvalidInput {
                field: "weights".into(),
                reason: format!("The 12 weights must sum to 1.0 (got {sum})"),
            });
        }
        Ok(())
    }

    pub fn sum(&self) -> Decimal {
        self.named().iter().map(|(_, w)| *w).sum()
    }

    /// Weight name / value pairs in declaration order.
    pub fn named(&self) -> [(&'static str, Rate); 12] {
        [
            ("pipeline_quality", self.pipeline_quality),
            ("market_cap_fit", self.market_cap_fit),
            ("cash_runway", self.cash_runway),
            ("therapeutic_area", self.therapeutic_area),
            ("clinical_stage", self.clinical_stage),
            ("financial_distress", self.financial_distress),
            (
                "scientific_differentiation",
                self.scientific_differentiation,
            ),
            ("acquisition_tension", self.acquisition_tension),
            ("strategic_acquirer_fit", self.strategic_acquirer_fit),
            ("data_catalyst_timing", self.data_catalyst_timing),
            ("competitive_landscape", self.competitive_landscape),
            (
                "deal_structure_feasibility",
                self.deal_structure_feasibility,
            ),
        ]
    }

    /// Composite score: the dot product of weights against scores. Each
    /// factor contributes weight x score, and the result stays in [0, 100]
    /// whenever the scores do.
    pub fn composite(&self, scores: &FactorScores) -> Score {
        self.pipeline_quality * scores.pipeline_quality
            + self.market_cap_fit * scores.market_cap_fit
            + self.cash_runway * scores.cash_runway
            + self.therapeutic_area * scores.therapeutic_area
            + self.clinical_stage * scores.clinical_stage
            + self.financial_distress * scores.financial_distress
            + self.scientific_differentiation * scores.scientific_differentiation
            + self.acquisition_tension * scores.acquisition_tension
            + self.strategic_acquirer_fit * scores.strategic_acquirer_fit
            + self.data_catalyst_timing * scores.data_catalyst_timing
            + self.competitive_landscape * scores.competitive_landscape
            + self.deal_structure_feasibility * scores.deal_structure_feasibility
    }

    /// Per-factor weighted contributions, used to find the thesis driver.
    pub fn contributions(&self, scores: &FactorScores) -> [(&'static str, Decimal); 12] {
        let w = self.named();
        let s = scores.named();
        let mut out = [("", Decimal::ZERO); 12];
        for i in 0..12 {
            out[i] = (w[i].0, w[i].1 * s[i].1);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_scores(value: Score) -> FactorScores {
        FactorScores {
            pipeline_quality: value,
            market_cap_fit: value,
            cash_runway: value,
            therapeutic_area: value,
            clinical_stage: value,
            financial_distress: value,
            scientific_differentiation: value,
            acquisition_tension: value,
            strategic_acquirer_fit: value,
            data_catalyst_timing: value,
            competitive_landscape: value,
            deal_structure_feasibility: value,
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = RankingWeights::default();
        assert_eq!(w.sum(), Decimal::ONE);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_try_new_rejects_bad_sum() {
        let mut w = RankingWeights::default();
        w.pipeline_quality = dec!(0.30);
        let err = RankingWeights::try_new(w).unwrap_err();
        match err {
            BiotargetError::InvalidInput { field, .. } => assert_eq!(field, "weights"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_try_new_accepts_within_tolerance() {
        let mut w = RankingWeights::default();
        // Nudge by less than the 0.001 tolerance
        w.pipeline_quality = dec!(0.1505);
        assert!(RankingWeights::try_new(w).is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut w = RankingWeights::default();
        w.market_cap_fit = dec!(-0.05);
        w.pipeline_quality = dec!(0.25);
        assert!(RankingWeights::try_new(w).is_err());
    }

    #[test]
    fn test_composite_of_uniform_scores() {
        let w = RankingWeights::default();
        // With weights summing to 1, a uniform score is a fixed point
        assert_eq!(w.composite(&uniform_scores(dec!(75))), dec!(75));
        assert_eq!(w.composite(&uniform_scores(Decimal::ZERO)), Decimal::ZERO);
        assert_eq!(w.composite(&uniform_scores(dec!(100))), dec!(100));
    }

    #[test]
    fn test_named_covers_all_twelve() {
        let w = RankingWeights::default();
        assert_eq!(w.named().len(), 12);
        let s = uniform_scores(dec!(50));
        assert_eq!(s.named().len(), 12);
    }

    #[test]
    fn test_contributions_sum_to_composite() {
        let w = RankingWeights::default();
        let s = uniform_scores(dec!(60));
        let total: Decimal = w.contributions(&s).iter().map(|(_, c)| *c).sum();
        assert_eq!(total, w.composite(&s));
    }
}
