use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::BiotargetError;
use crate::types::{Money, Probability, Rate, Score, TherapeuticArea};
use crate::BiotargetResult;

use super::identifier::AcquisitionTarget;

/// A target counts as high-probability above this 12-month threshold.
const HIGH_PROBABILITY_THRESHOLD: Probability = dec!(0.50);

// ---------------------------------------------------------------------------
// RankedWatchlist
// ---------------------------------------------------------------------------

/// A named, always-sorted collection of acquisition targets. Every
/// mutation re-sorts the list and re-assigns rank and percentile, so the
/// ordering invariant can never go stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedWatchlist {
    name: String,
    targets: Vec<AcquisitionTarget>,
}

/// Aggregate statistics over a watchlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistStats {
    pub target_count: usize,
    pub average_composite_score: Score,
    pub average_deal_probability_12mo: Probability,
    pub high_probability_count: usize,
    /// Sum of base-case takeout values
    pub total_estimated_value: Money,
    pub average_percentile: Rate,
}

impl RankedWatchlist {
    pub fn new(name: &str, targets: Vec<AcquisitionTarget>) -> Self {
        let mut list = Self {
            name: name.to_string(),
            targets,
        };
        list.resort_and_rerank();
        list
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn targets(&self) -> &[AcquisitionTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Add a target. Duplicate tickers are rejected; use `update_target`.
    pub fn add_target(&mut self, target: AcquisitionTarget) -> BiotargetResult<()> {
        if self.find(&target.ranked.ticker).is_some() {
            return Err(BiotargetError::InvalidInput {
                field: "ticker".into(),
                reason: format!(
                    "'{}' is already on watchlist '{}'",
                    target.ranked.ticker, self.name
                ),
            });
        }
        self.targets.push(target);
        self.resort_and_rerank();
        Ok(())
    }

    /// Remove a target by ticker, returning it.
    pub fn remove_target(&mut self, ticker: &str) -> BiotargetResult<AcquisitionTarget> {
        let idx = self.position(ticker)?;
        let removed = self.targets.remove(idx);
        self.resort_and_rerank();
        Ok(removed)
    }

    /// Replace an existing target (matched on ticker) with fresh data.
    pub fn update_target(&mut self, target: AcquisitionTarget) -> BiotargetResult<()> {
        let idx = self.position(&target.ranked.ticker)?;
        self.targets[idx] = target;
        self.resort_and_rerank();
        Ok(())
    }

    pub fn find(&self, ticker: &str) -> Option<&AcquisitionTarget> {
        self.targets.iter().find(|t| t.ranked.ticker == ticker)
    }

    pub fn filter_by_area(&self, area: TherapeuticArea) -> Vec<&AcquisitionTarget> {
        self.targets
            .iter()
            .filter(|t| t.therapeutic_areas.contains(&area))
            .collect()
    }

    pub fn filter_by_acquirer(&self, acquirer: &str) -> Vec<&AcquisitionTarget> {
        self.targets
            .iter()
            .filter(|t| t.acquirer_matches.iter().any(|m| m.acquirer == acquirer))
            .collect()
    }

    pub fn stats(&self) -> WatchlistStats {
        let n = self.targets.len();
        if n == 0 {
            return WatchlistStats {
                target_count: 0,
                average_composite_score: Decimal::ZERO,
                average_deal_probability_12mo: Decimal::ZERO,
                high_probability_count: 0,
                total_estimated_value: Decimal::ZERO,
                average_percentile: Decimal::ZERO,
            };
        }
        let count = Decimal::from(n as u64);
        let composite_sum: Decimal = self.targets.iter().map(|t| t.ranked.composite_score).sum();
        let prob_sum: Decimal = self.targets.iter().map(|t| t.deal_probability_12mo).sum();
        let percentile_sum: Decimal = self.targets.iter().map(|t| t.ranked.percentile).sum();
        WatchlistStats {
            target_count: n,
            average_composite_score: composite_sum / count,
            average_deal_probability_12mo: prob_sum / count,
            high_probability_count: self
                .targets
                .iter()
                .filter(|t| t.deal_probability_12mo >= HIGH_PROBABILITY_THRESHOLD)
                .count(),
            total_estimated_value: self.targets.iter().map(|t| t.valuation_range.base).sum(),
            average_percentile: percentile_sum / count,
        }
    }

    fn position(&self, ticker: &str) -> BiotargetResult<usize> {
        self.targets
            .iter()
            .position(|t| t.ranked.ticker == ticker)
            .ok_or_else(|| BiotargetError::InvalidInput {
                field: "ticker".into(),
                reason: format!("'{ticker}' is not on watchlist '{}'", self.name),
            })
    }

    fn resort_and_rerank(&mut self) {
        self.targets.sort_by(|a, b| {
            b.ranked
                .composite_score
                .cmp(&a.ranked.composite_score)
                .then_with(|| a.ranked.ticker.cmp(&b.ranked.ticker))
        });
        let n = self.targets.len();
        for (idx, target) in self.targets.iter_mut().enumerate() {
            let rank = idx as u32 + 1;
            target.ranked.rank = rank;
            target.ranked.percentile = if n == 0 {
                Decimal::ZERO
            } else {
                (Decimal::from((n as u32 - rank + 1) as u64) / Decimal::from(n as u64))
                    * dec!(100)
            };
        }
    }
}

// ---------------------------------------------------------------------------
// WatchlistManager
// ---------------------------------------------------------------------------

/// Registry of named watchlists. All mutations flow through the
/// watchlist's own operations, so rank/percentile stay consistent.
/// Callers must serialize concurrent mutating calls against the same
/// watchlist name; no internal locking is provided.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchlistManager {
    watchlists: BTreeMap<String, RankedWatchlist>,
}

impl WatchlistManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str) -> BiotargetResult<()> {
        if self.watchlists.contains_key(name) {
            return Err(BiotargetError::InvalidInput {
                field: "name".into(),
                reason: format!("Watchlist '{name}' already exists"),
            });
        }
        self.watchlists
            .insert(name.to_string(), RankedWatchlist::new(name, Vec::new()));
        Ok(())
    }

    /// Insert or replace a fully-built watchlist under its own name.
    pub fn insert(&mut self, watchlist: RankedWatchlist) {
        self.watchlists
            .insert(watchlist.name().to_string(), watchlist);
    }

    pub fn get(&self, name: &str) -> Option<&RankedWatchlist> {
        self.watchlists.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<RankedWatchlist> {
        self.watchlists.remove(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.watchlists.keys().map(|k| k.as_str()).collect()
    }

    pub fn add_target(&mut self, name: &str, target: AcquisitionTarget) -> BiotargetResult<()> {
        self.get_mut(name)?.add_target(target)
    }

    pub fn remove_target(
        &mut self,
        name: &str,
        ticker: &str,
    ) -> BiotargetResult<AcquisitionTarget> {
        self.get_mut(name)?.remove_target(ticker)
    }

    pub fn update_target(&mut self, name: &str, target: AcquisitionTarget) -> BiotargetResult<()> {
        self.get_mut(name)?.update_target(target)
    }

    fn get_mut(&mut self, name: &str) -> BiotargetResult<&mut RankedWatchlist> {
        self.watchlists
            .get_mut(name)
            .ok_or_else(|| BiotargetError::InvalidInput {
                field: "name".into(),
                reason: format!("No watchlist named '{name}'"),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::ranker::RankedTarget;
    use crate::ranking::weights::FactorScores;
    use crate::targets::identifier::{AcquirerMatch, DataCatalyst, ValuationRange};

    fn scores(value: Decimal) -> FactorScores {
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

    fn target(ticker: &str, composite: Decimal, probability: Decimal) -> AcquisitionTarget {
        AcquisitionTarget {
            ranked: RankedTarget {
                ticker: ticker.into(),
                name: format!("{ticker} Therapeutics"),
                composite_score: composite,
                factor_scores: scores(composite),
                rank: 0,
                percentile: Decimal::ZERO,
                strengths: vec![],
                weaknesses: vec![],
                investment_thesis: String::new(),
            },
            therapeutic_areas: vec![TherapeuticArea::Oncology],
            market_cap: dec!(1_000_000_000),
            acquirer_matches: vec![AcquirerMatch {
                acquirer: "Merck".into(),
                fit_score: dec!(90),
                rationale: "Keytruda loss-of-exclusivity gap".into(),
                probability: dec!(0.36),
                expected_premium: dec!(0.58),
            }],
            valuation_range: ValuationRange {
                low: dec!(1_300_000_000),
                base: dec!(1_500_000_000),
                high: dec!(1_800_000_000),
            },
            catalysts: vec![DataCatalyst {
                description: "Phase 2 topline data".into(),
                expected_months_out: 9,
            }],
            deal_probability_12mo: probability,
            deal_probability_24mo: (probability * dec!(1.6)).min(dec!(0.95)),
            pipeline_summary: None,
        }
    }

    #[test]
    fn test_new_sorts_and_reranks() {
        let list = RankedWatchlist::new(
            "test",
            vec![
                target("LOWW", dec!(40), dec!(0.2)),
                target("HIGH", dec!(80), dec!(0.6)),
                target("MIDD", dec!(60), dec!(0.4)),
            ],
        );
        let t = list.targets();
        assert_eq!(t[0].ranked.ticker, "HIGH");
        assert_eq!(t[0].ranked.rank, 1);
        assert_eq!(t[0].ranked.percentile, dec!(100));
        assert_eq!(t[2].ranked.ticker, "LOWW");
        assert_eq!(t[2].ranked.rank, 3);
    }

    #[test]
    fn test_add_triggers_rerank() {
        let mut list = RankedWatchlist::new(
            "test",
            vec![
                target("AAAA", dec!(70), dec!(0.5)),
                target("BBBB", dec!(50), dec!(0.3)),
            ],
        );
        list.add_target(target("CCCC", dec!(90), dec!(0.7))).unwrap();
        let t = list.targets();
        assert_eq!(t[0].ranked.ticker, "CCCC");
        assert_eq!(t[0].ranked.rank, 1);
        assert_eq!(t[1].ranked.ticker, "AAAA");
        assert_eq!(t[1].ranked.rank, 2);
        assert_eq!(t[2].ranked.rank, 3);
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let mut list = RankedWatchlist::new("test", vec![target("AAAA", dec!(70), dec!(0.5))]);
        assert!(list.add_target(target("AAAA", dec!(90), dec!(0.7))).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_triggers_rerank() {
        let mut list = RankedWatchlist::new(
            "test",
            vec![
                target("AAAA", dec!(90), dec!(0.5)),
                target("BBBB", dec!(70), dec!(0.3)),
                target("CCCC", dec!(50), dec!(0.2)),
            ],
        );
        let removed = list.remove_target("AAAA").unwrap();
        assert_eq!(removed.ranked.ticker, "AAAA");
        let t = list.targets();
        assert_eq!(t[0].ranked.ticker, "BBBB");
        assert_eq!(t[0].ranked.rank, 1);
        assert_eq!(t[0].ranked.percentile, dec!(100));
        assert_eq!(t[1].ranked.rank, 2);
        assert_eq!(t[1].ranked.percentile, dec!(50));
    }

    #[test]
    fn test_remove_missing_rejected() {
        let mut list = RankedWatchlist::new("test", vec![target("AAAA", dec!(70), dec!(0.5))]);
        assert!(list.remove_target("ZZZZ").is_err());
    }

    #[test]
    fn test_update_triggers_rerank() {
        let mut list = RankedWatchlist::new(
            "test",
            vec![
                target("AAAA", dec!(90), dec!(0.5)),
                target("BBBB", dec!(70), dec!(0.3)),
            ],
        );
        // BBBB re-scores above AAAA
        list.update_target(target("BBBB", dec!(95), dec!(0.6))).unwrap();
        let t = list.targets();
        assert_eq!(t[0].ranked.ticker, "BBBB");
        assert_eq!(t[0].ranked.rank, 1);
        assert_eq!(t[1].ranked.ticker, "AAAA");
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let list = RankedWatchlist::new(
            "test",
            vec![
                target("ZZZZ", dec!(70), dec!(0.5)),
                target("AAAA", dec!(70), dec!(0.5)),
            ],
        );
        assert_eq!(list.targets()[0].ranked.ticker, "AAAA");
    }

    #[test]
    fn test_filters() {
        let mut obesity = target("OBES", dec!(80), dec!(0.6));
        obesity.therapeutic_areas = vec![TherapeuticArea::Obesity];
        obesity.acquirer_matches[0].acquirer = "Eli Lilly".into();
        let list = RankedWatchlist::new(
            "test",
            vec![target("ONCO", dec!(70), dec!(0.4)), obesity],
        );

        let by_area = list.filter_by_area(TherapeuticArea::Obesity);
        assert_eq!(by_area.len(), 1);
        assert_eq!(by_area[0].ranked.ticker, "OBES");

        let by_acquirer = list.filter_by_acquirer("Merck");
        assert_eq!(by_acquirer.len(), 1);
        assert_eq!(by_acquirer[0].ranked.ticker, "ONCO");
    }

    #[test]
    fn test_stats() {
        let list = RankedWatchlist::new(
            "test",
            vec![
                target("AAAA", dec!(80), dec!(0.6)),
                target("BBBB", dec!(60), dec!(0.3)),
            ],
        );
        let stats = list.stats();
        assert_eq!(stats.target_count, 2);
        assert_eq!(stats.average_composite_score, dec!(70));
        assert_eq!(stats.average_deal_probability_12mo, dec!(0.45));
        assert_eq!(stats.high_probability_count, 1);
        assert_eq!(stats.total_estimated_value, dec!(3_000_000_000));
    }

    #[test]
    fn test_stats_empty() {
        let list = RankedWatchlist::new("test", vec![]);
        let stats = list.stats();
        assert_eq!(stats.target_count, 0);
        assert_eq!(stats.average_composite_score, Decimal::ZERO);
    }

    #[test]
    fn test_manager_create_and_route_mutations() {
        let mut mgr = WatchlistManager::new();
        mgr.create("q3").unwrap();
        assert!(mgr.create("q3").is_err());

        mgr.add_target("q3", target("AAAA", dec!(70), dec!(0.5))).unwrap();
        mgr.add_target("q3", target("BBBB", dec!(90), dec!(0.7))).unwrap();
        let list = mgr.get("q3").unwrap();
        assert_eq!(list.targets()[0].ranked.ticker, "BBBB");
        assert_eq!(list.targets()[0].ranked.rank, 1);

        mgr.remove_target("q3", "BBBB").unwrap();
        assert_eq!(mgr.get("q3").unwrap().targets()[0].ranked.rank, 1);
        assert!(mgr.add_target("nope", target("CCCC", dec!(50), dec!(0.2))).is_err());
    }

    #[test]
    fn test_manager_insert_and_names() {
        let mut mgr = WatchlistManager::new();
        mgr.insert(RankedWatchlist::new("alpha", vec![]));
        mgr.insert(RankedWatchlist::new("beta", vec![]));
        assert_eq!(mgr.names(), vec!["alpha", "beta"]);
        assert!(mgr.remove("alpha").is_some());
        assert_eq!(mgr.names(), vec!["beta"]);
    }
}
