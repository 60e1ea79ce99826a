use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::company::CompanyProfile;
use crate::types::{with_metadata, ComputationOutput, Score};
use crate::BiotargetResult;

use super::factors::score_company;
use super::weights::{FactorScores, RankingWeights};

/// A factor is a strength at or above this score.
const STRENGTH_THRESHOLD: Decimal = dec!(70);
/// A factor is a weakness at or below this score.
const WEAKNESS_THRESHOLD: Decimal = dec!(50);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A company with its composite score, rank and qualitative read-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTarget {
    pub ticker: String,
    pub name: String,
    pub composite_score: Score,
    pub factor_scores: FactorScores,
    /// 1..N, 1 = highest composite
    pub rank: u32,
    /// (N - rank + 1) / N x 100
    pub percentile: Decimal,
    /// Up to three factors scoring >= 70, strongest first
    pub strengths: Vec<String>,
    /// Up to three factors scoring <= 50, weakest first
    pub weaknesses: Vec<String>,
    pub investment_thesis: String,
}

/// Composite scorer over the 12-factor model.
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: RankingWeights,
}

// ---------------------------------------------------------------------------
// Ranker
// ---------------------------------------------------------------------------

impl Ranker {
    /// Weights are validated here, before any ranking runs.
    pub fn new(weights: RankingWeights) -> BiotargetResult<Self> {
        let weights = RankingWeights::try_new(weights)?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Score one company without ranking context.
    pub fn score(&self, profile: &CompanyProfile) -> BiotargetResult<(FactorScores, Score)> {
        profile.validate()?;
        let scores = score_company(profile);
        Ok((scores, self.weights.composite(&scores)))
    }

    /// Rank companies by composite score, descending, with a deterministic
    /// tie-break on ticker. Percentiles are assigned against the full
    /// field before any top-N truncation.
    pub fn rank_targets(
        &self,
        profiles: &[CompanyProfile],
        top_n: Option<usize>,
    ) -> BiotargetResult<ComputationOutput<Vec<RankedTarget>>> {
        let start = Instant::now();
        let warnings: Vec<String> = Vec::new();

        let mut scored: Vec<(&CompanyProfile, FactorScores, Score)> =
            Vec::with_capacity(profiles.len());
        for profile in profiles {
            let (scores, composite) = self.score(profile)?;
            scored.push((profile, scores, composite));
        }

        scored.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.ticker.cmp(&b.0.ticker)));

        let n = scored.len();
        let mut targets = Vec::with_capacity(n);
        for (idx, (profile, scores, composite)) in scored.into_iter().enumerate() {
            let rank = idx as u32 + 1;
            let percentile = percentile_for(rank, n);
            let strengths = top_strengths(&scores);
            let weaknesses = top_weaknesses(&scores);
            let investment_thesis = build_thesis(
                profile,
                &self.weights,
                &scores,
                composite,
                &weaknesses,
            );
            targets.push(RankedTarget {
                ticker: profile.ticker.clone(),
                name: profile.name.clone(),
                composite_score: composite,
                factor_scores: scores,
                rank,
                percentile,
                strengths,
                weaknesses,
                investment_thesis,
            });
        }

        if let Some(top_n) = top_n {
            targets.truncate(top_n);
        }

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "12-Factor Weighted Composite Ranking",
            &serde_json::json!({
                "companies": n,
                "top_n": top_n,
                "weights": self.weights,
            }),
            warnings,
            elapsed,
            targets,
        ))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn percentile_for(rank: u32, n: usize) -> Decimal {
    let n = Decimal::from(n as u64);
    let rank = Decimal::from(rank);
    (n - rank + Decimal::ONE) / n * dec!(100)
}

fn factor_label(name: &str) -> &'static str {
    match name {
        "pipeline_quality" => "pipeline quality",
        "market_cap_fit" => "market cap fit",
        "cash_runway" => "cash runway pressure",
        "therapeutic_area" => "therapeutic area heat",
        "clinical_stage" => "clinical stage",
        "financial_distress" => "financial distress",
        "scientific_differentiation" => "scientific differentiation",
        "acquisition_tension" => "acquisition tension",
        "strategic_acquirer_fit" => "strategic acquirer fit",
        "data_catalyst_timing" => "catalyst timing",
        "competitive_landscape" => "competitive landscape",
        "deal_structure_feasibility" => "deal structure feasibility",
        _ => "unknown factor",
    }
}

fn top_strengths(scores: &FactorScores) -> Vec<String> {
    let mut strong: Vec<(&'static str, Score)> = scores
        .named()
        .into_iter()
        .filter(|(_, s)| *s >= STRENGTH_THRESHOLD)
        .collect();
    strong.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    strong
        .into_iter()
        .take(3)
        .map(|(name, _)| factor_label(name).to_string())
        .collect()
}

fn top_weaknesses(scores: &FactorScores) -> Vec<String> {
    let mut weak: Vec<(&'static str, Score)> = scores
        .named()
        .into_iter()
        .filter(|(_, s)| *s <= WEAKNESS_THRESHOLD)
        .collect();
    weak.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    weak.into_iter()
        .take(3)
        .map(|(name, _)| factor_label(name).to_string())
        .collect()
}

/// Short templated thesis naming the dominant weighted driver(s).
fn build_thesis(
    profile: &CompanyProfile,
    weights: &RankingWeights,
    scores: &FactorScores,
    composite: Score,
    weaknesses: &[String],
) -> String {
    let mut contributions = weights.contributions(scores);
    contributions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let named = scores.named();
    let score_of = |key: &str| {
        named
            .iter()
            .find(|(n, _)| *n == key)
            .map(|(_, s)| *s)
            .unwrap_or(Decimal::ZERO)
    };

    let (first, _) = contributions[0];
    let (second, _) = contributions[1];
    let mut thesis = format!(
        "{} ({}) scores {:.1}/100, led by {} ({:.0}/100) and {} ({:.0}/100).",
        profile.name,
        profile.ticker,
        composite,
        factor_label(first),
        score_of(first),
        factor_label(second),
        score_of(second),
    );
    if let Some(weakest) = weaknesses.first() {
        thesis.push_str(&format!(" The main watch item is {weakest}."));
    }
    thesis
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
