use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::assumptions::AssumptionTables;
use crate::company::CompanyProfile;
use crate::ranking::ranker::{RankedTarget, Ranker};
use crate::ranking::weights::RankingWeights;
use crate::screening::criteria::ScreeningCriteria;
use crate::screening::screener::{ScreenResult, ScreenStats, Screener};
use crate::types::{
    with_metadata, ClinicalPhase, ComputationOutput, Money, Probability, Rate, Score,
    TherapeuticArea,
};
use crate::valuation::pipeline::{value_pipeline, DrugCandidate, PipelineValuationInput, PortfolioSummary};
use crate::BiotargetResult;

use super::watchlist::RankedWatchlist;

/// Hard ceiling on the 12-month deal probability.
const MAX_DEAL_PROBABILITY_12MO: Probability = dec!(0.85);
/// Hard ceiling on the 24-month deal probability.
const MAX_DEAL_PROBABILITY_24MO: Probability = dec!(0.95);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One plausible acquirer with a fixed fit score and derived deal terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquirerMatch {
    pub acquirer: String,
    /// 0-100 strategic fit from the static directory
    pub fit_score: Score,
    pub rationale: String,
    /// fit/100 x 0.4
    pub probability: Probability,
    /// 0.40 + fit/100 x 0.20, as a fraction of market cap
    pub expected_premium: Rate,
}

/// Takeout range anchored on the current market cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationRange {
    pub low: Money,
    pub base: Money,
    pub high: Money,
}

/// A value-inflection event attached to a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataCatalyst {
    pub description: String,
    pub expected_months_out: u32,
}

/// A fully-populated acquisition target: the ranked read-out plus deal
/// mechanics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionTarget {
    #[serde(flatten)]
    pub ranked: RankedTarget,
    pub therapeutic_areas: Vec<TherapeuticArea>,
    pub market_cap: Money,
    pub acquirer_matches: Vec<AcquirerMatch>,
    pub valuation_range: ValuationRange,
    pub catalysts: Vec<DataCatalyst>,
    pub deal_probability_12mo: Probability,
    pub deal_probability_24mo: Probability,
    /// Sum-of-parts pipeline valuation, present when the caller supplied
    /// drug candidates for this ticker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_summary: Option<PortfolioSummary>,
}

/// Output of a full identification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetIdentification {
    pub watchlist: RankedWatchlist,
    pub screen_pass_rate: Rate,
    pub screen_failures: Vec<ScreenResult>,
    pub screen_stats: ScreenStats,
}

/// Knobs for the identification pipeline. The multiples and caps are
/// heuristics ported as configuration for domain-expert review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetIdentifierConfig {
    pub top_n: usize,
    /// Market-cap multiples for the low/base/high takeout range
    pub valuation_multiples: (Rate, Rate, Rate),
    /// Acquirer matches kept per target
    pub max_acquirer_matches: usize,
}

impl Default for TargetIdentifierConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            valuation_multiples: (dec!(1.3), dec!(1.5), dec!(1.8)),
            max_acquirer_matches: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Acquirer directory
// ---------------------------------------------------------------------------

/// Static therapeutic-area to acquirer lookup with fixed fit scores and
/// rationale. Injectable so desks can maintain their own house view.
#[derive(Debug, Clone, Default)]
pub struct AcquirerDirectory;

impl AcquirerDirectory {
    /// Directory rows for one area: (acquirer, fit, rationale).
    pub fn for_area(&self, area: TherapeuticArea) -> Vec<(&'static str, Score, &'static str)> {
        match area {
            TherapeuticArea::Obesity => vec![
                ("Eli Lilly", dec!(95), "Incretin franchise depth and supply scale"),
                ("Novo Nordisk", dec!(95), "GLP-1 category defense"),
                ("Roche", dec!(80), "Re-entry into metabolic disease"),
                ("AstraZeneca", dec!(75), "Cardiometabolic adjacency"),
            ],
            TherapeuticArea::Oncology => vec![
                ("Merck", dec!(90), "Keytruda loss-of-exclusivity gap"),
                ("AstraZeneca", dec!(88), "Oncology growth mandate"),
                ("Pfizer", dec!(85), "Post-Seagen integration capacity"),
                ("Bristol Myers Squibb", dec!(82), "Revenue cliff replacement"),
                ("Roche", dec!(80), "Diagnostics-paired oncology strategy"),
            ],
            TherapeuticArea::Radiopharma => vec![
                ("Novartis", dec!(95), "Pluvicto/Lutathera franchise extension"),
                ("Eli Lilly", dec!(85), "Point Biopharma platform build-out"),
                ("Bristol Myers Squibb", dec!(80), "RayzeBio follow-on appetite"),
            ],
            TherapeuticArea::Cns => vec![
                ("Biogen", dec!(85), "Neurology pipeline replenishment"),
                ("AbbVie", dec!(80), "Cerevel integration momentum"),
                ("Lundbeck", dec!(75), "Pure-play CNS focus"),
            ],
            TherapeuticArea::Immunology => vec![
                ("AbbVie", dec!(90), "Humira successor stack"),
                ("Sanofi", dec!(85), "Dupixent adjacency"),
                ("Johnson & Johnson", dec!(82), "Immunology franchise breadth"),
            ],
            TherapeuticArea::RareDisease => vec![
                ("AstraZeneca", dec!(90), "Alexion rare-disease engine"),
                ("Sanofi", dec!(88), "Genzyme heritage and global reach"),
                ("BioMarin", dec!(78), "Rare-disease commercial synergy"),
            ],
            TherapeuticArea::GeneTherapy => vec![
                ("Novartis", dec!(85), "Zolgensma manufacturing know-how"),
                ("Roche", dec!(80), "Spark platform extension"),
                ("Pfizer", dec!(70), "Selective gene-therapy bets"),
            ],
            TherapeuticArea::Cardiovascular => vec![
                ("Novartis", dec!(85), "Entresto/Leqvio cardiovascular focus"),
                ("Bristol Myers Squibb", dec!(80), "Camzyos franchise adjacency"),
                ("Amgen", dec!(78), "Repatha commercial channel"),
            ],
            TherapeuticArea::InfectiousDisease => vec![
                ("Gilead", dec!(85), "Antiviral franchise heritage"),
                ("GSK", dec!(78), "Vaccines and anti-infectives base"),
                ("Merck", dec!(75), "Hospital anti-infective channel"),
            ],
            TherapeuticArea::Other => vec![
                ("Pfizer", dec!(60), "General business-development interest"),
            ],
        }
    }

    /// Matches across all of a company's areas, deduplicated by acquirer
    /// (keeping the best fit), sorted by fit descending then name.
    pub fn matches_for(&self, profile: &CompanyProfile, limit: usize) -> Vec<AcquirerMatch> {
        let mut rows: Vec<(&'static str, Score, &'static str)> = Vec::new();
        for area in &profile.therapeutic_areas {
            for (acquirer, fit, rationale) in self.for_area(*area) {
                match rows.iter_mut().find(|(a, _, _)| *a == acquirer) {
                    Some(existing) if existing.1 < fit => {
                        existing.1 = fit;
                        existing.2 = rationale;
                    }
                    Some(_) => {}
                    None => rows.push((acquirer, fit, rationale)),
                }
            }
        }
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows.truncate(limit);
        rows.into_iter()
            .map(|(acquirer, fit, rationale)| AcquirerMatch {
                acquirer: acquirer.to_string(),
                fit_score: fit,
                rationale: rationale.to_string(),
                probability: fit / dec!(100) * dec!(0.4),
                expected_premium: dec!(0.40) + fit / dec!(100) * dec!(0.20),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// TargetIdentifier
// ---------------------------------------------------------------------------

/// Orchestrates screen -> rank -> assemble into a sorted watchlist.
#[derive(Debug, Clone)]
pub struct TargetIdentifier {
    criteria: ScreeningCriteria,
    ranker: Ranker,
    directory: AcquirerDirectory,
    config: TargetIdentifierConfig,
}

impl TargetIdentifier {
    pub fn new(
        criteria: ScreeningCriteria,
        weights: RankingWeights,
        config: TargetIdentifierConfig,
    ) -> BiotargetResult<Self> {
        criteria.validate()?;
        Ok(Self {
            criteria,
            ranker: Ranker::new(weights)?,
            directory: AcquirerDirectory,
            config,
        })
    }

    /// Run the full pipeline over a set of company profiles.
    pub fn identify(
        &self,
        watchlist_name: &str,
        profiles: &[CompanyProfile],
    ) -> BiotargetResult<ComputationOutput<TargetIdentification>> {
        self.run(watchlist_name, profiles, None)
    }

    /// Run the full pipeline and additionally value each target's drug
    /// pipeline via the sum-of-parts DCF, keyed by ticker.
    pub fn identify_with_valuations(
        &self,
        watchlist_name: &str,
        profiles: &[CompanyProfile],
        candidates_by_ticker: &BTreeMap<String, Vec<DrugCandidate>>,
        tables: &AssumptionTables,
    ) -> BiotargetResult<ComputationOutput<TargetIdentification>> {
        self.run(watchlist_name, profiles, Some((candidates_by_ticker, tables)))
    }

    fn run(
        &self,
        watchlist_name: &str,
        profiles: &[CompanyProfile],
        valuation_ctx: Option<(&BTreeMap<String, Vec<DrugCandidate>>, &AssumptionTables)>,
    ) -> BiotargetResult<ComputationOutput<TargetIdentification>> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        // --- Screen ---
        let mut screener = Screener::new(self.criteria.clone())?;
        let screen = screener.batch_screen(profiles)?;
        for w in &screen.warnings {
            warnings.push(format!("[screen] {w}"));
        }
        let screen_out = screen.result;

        if screen_out.passed.is_empty() {
            warnings.push("No companies survived screening; watchlist is empty".into());
        }

        // --- Rank survivors ---
        let ranked = self
            .ranker
            .rank_targets(&screen_out.passed, Some(self.config.top_n))?;
        let ranked_targets = ranked.result;

        // --- Assemble full targets ---
        let mut targets = Vec::with_capacity(ranked_targets.len());
        for ranked in ranked_targets {
            let profile = screen_out
                .passed
                .iter()
                .find(|p| p.ticker == ranked.ticker)
                .expect("ranked target must originate from the screened set");
            let pipeline_summary =
                self.value_target_pipeline(profile, valuation_ctx, &mut warnings)?;
            targets.push(self.assemble(ranked, profile, pipeline_summary));
        }

        let watchlist = RankedWatchlist::new(watchlist_name, targets);

        let output = TargetIdentification {
            watchlist,
            screen_pass_rate: screen_out.pass_rate,
            screen_failures: screen_out.failed,
            screen_stats: screen_out.stats,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Acquisition Target Identification Pipeline",
            &serde_json::json!({
                "companies": profiles.len(),
                "top_n": self.config.top_n,
                "valuation_multiples": [
                    self.config.valuation_multiples.0.to_string(),
                    self.config.valuation_multiples.1.to_string(),
                    self.config.valuation_multiples.2.to_string(),
                ],
            }),
            warnings,
            elapsed,
            output,
        ))
    }

    /// Sum-of-parts valuation for one target when candidates were supplied.
    fn value_target_pipeline(
        &self,
        profile: &CompanyProfile,
        valuation_ctx: Option<(&BTreeMap<String, Vec<DrugCandidate>>, &AssumptionTables)>,
        warnings: &mut Vec<String>,
    ) -> BiotargetResult<Option<PortfolioSummary>> {
        let Some((candidates_by_ticker, tables)) = valuation_ctx else {
            return Ok(None);
        };
        let Some(candidates) = candidates_by_ticker.get(&profile.ticker) else {
            warnings.push(format!(
                "No drug candidates supplied for {}; pipeline valuation skipped",
                profile.ticker
            ));
            return Ok(None);
        };
        let input = PipelineValuationInput {
            company_name: profile.name.clone(),
            candidates: candidates.clone(),
            apply_diversification: true,
            correlation_factor: dec!(0.5),
            market_cap: Some(profile.market_cap),
            control_premium: None,
            diversification_uplift_cap: None,
            horizon_years: None,
            costs: None,
        };
        let valued = value_pipeline(&input, tables)?;
        for w in &valued.warnings {
            warnings.push(format!("[{}] {w}", profile.ticker));
        }
        Ok(Some(valued.result))
    }

    fn assemble(
        &self,
        ranked: RankedTarget,
        profile: &CompanyProfile,
        pipeline_summary: Option<PortfolioSummary>,
    ) -> AcquisitionTarget {
        let (low_mult, base_mult, high_mult) = self.config.valuation_multiples;
        let valuation_range = ValuationRange {
            low: profile.market_cap * low_mult,
            base: profile.market_cap * base_mult,
            high: profile.market_cap * high_mult,
        };

        let deal_probability_12mo = deal_probability_12mo(&ranked, profile);
        let deal_probability_24mo =
            (deal_probability_12mo * dec!(1.6)).min(MAX_DEAL_PROBABILITY_24MO);

        AcquisitionTarget {
            therapeutic_areas: profile.therapeutic_areas.clone(),
            market_cap: profile.market_cap,
            acquirer_matches: self
                .directory
                .matches_for(profile, self.config.max_acquirer_matches),
            valuation_range,
            catalysts: derive_catalysts(profile),
            deal_probability_12mo,
            deal_probability_24mo,
            pipeline_summary,
            ranked,
        }
    }
}

// ---------------------------------------------------------------------------
// Deal probability
// ---------------------------------------------------------------------------

/// Additive bonus model on top of a composite-driven base term, capped.
fn deal_probability_12mo(ranked: &RankedTarget, profile: &CompanyProfile) -> Probability {
    let base = ranked.composite_score / dec!(100) * dec!(0.5);

    let runway = profile.cash_runway_months();
    let runway_bonus = if runway < dec!(12) {
        dec!(0.10)
    } else if runway < dec!(18) {
        dec!(0.06)
    } else if runway < dec!(24) {
        dec!(0.03)
    } else {
        Decimal::ZERO
    };

    let decline = profile.stock.pct_off_52w_high;
    let decline_bonus = if decline >= dec!(0.50) {
        dec!(0.08)
    } else if decline >= dec!(0.30) {
        dec!(0.05)
    } else if decline >= dec!(0.15) {
        dec!(0.02)
    } else {
        Decimal::ZERO
    };

    let mut signal_bonus = Decimal::ZERO;
    if profile.deal.activist_investor {
        signal_bonus += dec!(0.05);
    }
    if profile.deal.acquisition_rumors {
        signal_bonus += dec!(0.08);
    }

    (base + runway_bonus + decline_bonus + signal_bonus).min(MAX_DEAL_PROBABILITY_12MO)
}

/// Stage-typical upcoming events, plus any tracked company catalysts.
fn derive_catalysts(profile: &CompanyProfile) -> Vec<DataCatalyst> {
    let mut catalysts: Vec<DataCatalyst> = match profile.lead_phase {
        ClinicalPhase::Preclinical => vec![DataCatalyst {
            description: "IND filing".into(),
            expected_months_out: 12,
        }],
        ClinicalPhase::Phase1 => vec![
            DataCatalyst {
                description: "Phase 1 safety and dose-escalation data".into(),
                expected_months_out: 9,
            },
            DataCatalyst {
                description: "Phase 2 initiation".into(),
                expected_months_out: 15,
            },
        ],
        ClinicalPhase::Phase2 => vec![
            DataCatalyst {
                description: "Phase 2 topline data".into(),
                expected_months_out: 9,
            },
            DataCatalyst {
                description: "Phase 3 initiation".into(),
                expected_months_out: 18,
            },
        ],
        ClinicalPhase::Phase3 => vec![
            DataCatalyst {
                description: "Phase 3 topline data".into(),
                expected_months_out: 12,
            },
            DataCatalyst {
                description: "Regulatory filing".into(),
                expected_months_out: 18,
            },
        ],
        ClinicalPhase::Filed => vec![DataCatalyst {
            description: "Approval decision".into(),
            expected_months_out: 10,
        }],
        ClinicalPhase::Approved => vec![DataCatalyst {
            description: "Launch trajectory update".into(),
            expected_months_out: 6,
        }],
    };

    for c in &profile.catalysts {
        catalysts.push(DataCatalyst {
            description: c.description.clone(),
            expected_months_out: c.months_out,
        });
    }
    catalysts.sort_by(|a, b| {
        a.expected_months_out
            .cmp(&b.expected_months_out)
            .then_with(|| a.description.cmp(&b.description))
    });
    catalysts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
