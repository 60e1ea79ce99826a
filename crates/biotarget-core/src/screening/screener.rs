use chrono::Months;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::company::CompanyProfile;
use crate::types::{with_metadata, ClinicalPhase, ComputationOutput, Rate};
use crate::BiotargetResult;

use super::criteria::ScreeningCriteria;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The ordered screening stages. A company is evaluated against them in
/// declaration order and drops out at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenStage {
    MarketCap,
    Pipeline,
    FinancialHealth,
    StrategicFit,
    Exclusions,
}

impl ScreenStage {
    pub fn label(&self) -> &'static str {
        match self {
            ScreenStage::MarketCap => "Market Cap",
            ScreenStage::Pipeline => "Pipeline",
            ScreenStage::FinancialHealth => "Financial Health",
            ScreenStage::StrategicFit => "Strategic Fit",
            ScreenStage::Exclusions => "Exclusions",
        }
    }
}

/// Outcome for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenResult {
    pub ticker: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<ScreenStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Running pass counters, incremented once per stage a company clears.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenStats {
    pub evaluated: u64,
    pub market_cap_passed: u64,
    pub pipeline_passed: u64,
    pub financial_health_passed: u64,
    pub strategic_fit_passed: u64,
    pub exclusions_passed: u64,
    pub passed_all: u64,
}

/// Batch screening output: the surviving profiles, per-company failure
/// records, and the overall pass rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchScreenOutput {
    pub passed: Vec<CompanyProfile>,
    pub failed: Vec<ScreenResult>,
    pub pass_rate: Rate,
    pub stats: ScreenStats,
}

// ---------------------------------------------------------------------------
// Screener
// ---------------------------------------------------------------------------

/// Multi-stage boolean filter over company profiles. Stages are a linear
/// state machine with early exit; the first failing stage's reason is
/// returned with the result.
#[derive(Debug, Clone)]
pub struct Screener {
    criteria: ScreeningCriteria,
    stats: ScreenStats,
}

impl Screener {
    pub fn new(criteria: ScreeningCriteria) -> BiotargetResult<Self> {
        criteria.validate()?;
        Ok(Self {
            criteria,
            stats: ScreenStats::default(),
        })
    }

    pub fn criteria(&self) -> &ScreeningCriteria {
        &self.criteria
    }

    pub fn stats(&self) -> &ScreenStats {
        &self.stats
    }

    /// Evaluate one company against the ordered stages.
    pub fn screen_company(&mut self, profile: &CompanyProfile) -> BiotargetResult<ScreenResult> {
        profile.validate()?;
        self.stats.evaluated += 1;

        if let Some(reason) = self.check_market_cap(profile) {
            return Ok(fail(profile, ScreenStage::MarketCap, reason));
        }
        self.stats.market_cap_passed += 1;

        if let Some(reason) = self.check_pipeline(profile) {
            return Ok(fail(profile, ScreenStage::Pipeline, reason));
        }
        self.stats.pipeline_passed += 1;

        if let Some(reason) = self.check_financial_health(profile) {
            return Ok(fail(profile, ScreenStage::FinancialHealth, reason));
        }
        self.stats.financial_health_passed += 1;

        if let Some(reason) = self.check_strategic_fit(profile) {
            return Ok(fail(profile, ScreenStage::StrategicFit, reason));
        }
        self.stats.strategic_fit_passed += 1;

        if let Some(reason) = self.check_exclusions(profile) {
            return Ok(fail(profile, ScreenStage::Exclusions, reason));
        }
        self.stats.exclusions_passed += 1;

        self.stats.passed_all += 1;
        Ok(ScreenResult {
            ticker: profile.ticker.clone(),
            passed: true,
            failed_stage: None,
            reason: None,
        })
    }

    /// Screen a list of companies, partitioning into passed and failed.
    pub fn batch_screen(
        &mut self,
        profiles: &[CompanyProfile],
    ) -> BiotargetResult<ComputationOutput<BatchScreenOutput>> {
        let start = Instant::now();
        let warnings: Vec<String> = Vec::new();

        let mut passed = Vec::new();
        let mut failed = Vec::new();
        for profile in profiles {
            let result = self.screen_company(profile)?;
            if result.passed {
                passed.push(profile.clone());
            } else {
                failed.push(result);
            }
        }

        let total = profiles.len();
        let pass_rate = if total == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(passed.len() as u64) / Decimal::from(total as u64)
        };

        let output = BatchScreenOutput {
            passed,
            failed,
            pass_rate,
            stats: self.stats.clone(),
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Multi-Stage Acquisition Screen",
            &serde_json::json!({
                "companies": total,
                "min_market_cap": self.criteria.min_market_cap.to_string(),
                "max_market_cap": self.criteria.max_market_cap.to_string(),
                "min_phase": self.criteria.min_phase.label(),
            }),
            warnings,
            elapsed,
            output,
        ))
    }

    // -- Stage 1: market cap -------------------------------------------------

    fn check_market_cap(&self, p: &CompanyProfile) -> Option<String> {
        if p.market_cap < self.criteria.min_market_cap {
            return Some(format!(
                "Market cap {} below minimum {}",
                p.market_cap, self.criteria.min_market_cap
            ));
        }
        if p.market_cap > self.criteria.max_market_cap {
            return Some(format!(
                "Market cap {} above maximum {}",
                p.market_cap, self.criteria.max_market_cap
            ));
        }
        None
    }

    // -- Stage 2: pipeline ---------------------------------------------------

    fn check_pipeline(&self, p: &CompanyProfile) -> Option<String> {
        if p.lead_phase < self.criteria.min_phase {
            return Some(format!(
                "Lead asset at {} is earlier than required {}",
                p.lead_phase.label(),
                self.criteria.min_phase.label()
            ));
        }
        if p.pipeline_asset_count < self.criteria.min_pipeline_assets {
            return Some(format!(
                "Pipeline has {} assets, fewer than the required {}",
                p.pipeline_asset_count, self.criteria.min_pipeline_assets
            ));
        }
        if p.lead_asset.trim().is_empty() {
            return Some("No identifiable lead asset".to_string());
        }
        None
    }

    // -- Stage 3: financial health -------------------------------------------

    fn check_financial_health(&self, p: &CompanyProfile) -> Option<String> {
        let runway = p.cash_runway_months();
        if runway < self.criteria.min_cash_runway_months {
            return Some(format!(
                "Cash runway of {runway} months below minimum {}",
                self.criteria.min_cash_runway_months
            ));
        }
        if runway > self.criteria.max_cash_runway_months && !self.runway_exception(p) {
            return Some(format!(
                "Cash runway of {runway} months exceeds ceiling {} with no strategic exception",
                self.criteria.max_cash_runway_months
            ));
        }
        None
    }

    /// Long-runway companies stay in scope when the acquisition case does
    /// not rest on funding pressure: hot therapeutic areas, platform
    /// companies, and assets at Phase 3 or later.
    fn runway_exception(&self, p: &CompanyProfile) -> bool {
        if p.is_platform_company || p.lead_phase >= ClinicalPhase::Phase3 {
            return true;
        }
        self.criteria.hot_areas.iter().any(|a| p.has_area(*a))
    }

    // -- Stage 4: strategic fit ----------------------------------------------

    fn check_strategic_fit(&self, p: &CompanyProfile) -> Option<String> {
        if !self.criteria.priority_areas.is_empty()
            && !self.criteria.priority_areas.iter().any(|a| p.has_area(*a))
        {
            return Some("No overlap with priority therapeutic areas".to_string());
        }
        if !self.criteria.allowed_regions.is_empty()
            && !self.criteria.allowed_regions.contains(&p.region)
        {
            return Some(format!("Region {:?} not in the allow-list", p.region));
        }
        if self.criteria.require_recent_catalyst {
            match p.months_to_next_catalyst() {
                Some(months) if months <= self.criteria.catalyst_window_months => {}
                Some(months) => {
                    return Some(format!(
                        "Next catalyst is {months} months out, beyond the {}-month window",
                        self.criteria.catalyst_window_months
                    ));
                }
                None => return Some("No upcoming catalyst".to_string()),
            }
        }
        let decline = p.stock.pct_off_52w_high;
        if decline < self.criteria.min_stock_decline {
            return Some(format!(
                "Stock decline {decline} below minimum {}",
                self.criteria.min_stock_decline
            ));
        }
        if decline > self.criteria.max_stock_decline {
            return Some(format!(
                "Stock decline {decline} above maximum {}",
                self.criteria.max_stock_decline
            ));
        }
        let ownership = p.institutional_ownership_pct;
        if ownership < self.criteria.min_institutional_ownership
            || ownership > self.criteria.max_institutional_ownership
        {
            return Some(format!(
                "Institutional ownership {ownership} outside bounds [{}, {}]",
                self.criteria.min_institutional_ownership,
                self.criteria.max_institutional_ownership
            ));
        }
        None
    }

    // -- Stage 5: exclusions -------------------------------------------------

    fn check_exclusions(&self, p: &CompanyProfile) -> Option<String> {
        if self.criteria.exclude_preclinical_single_asset
            && p.pipeline_asset_count == 1
            && p.lead_phase == ClinicalPhase::Preclinical
        {
            return Some("Single-asset preclinical company".to_string());
        }
        if self.criteria.exclude_royalty_companies && p.is_royalty_company {
            return Some("Royalty company".to_string());
        }
        if self.criteria.ipo_lookback_months > 0 {
            if let Some(ipo) = p.ipo_date {
                let cutoff = self
                    .criteria
                    .as_of
                    .checked_sub_months(Months::new(self.criteria.ipo_lookback_months));
                if let Some(cutoff) = cutoff {
                    if ipo > cutoff {
                        return Some(format!(
                            "IPO on {ipo} falls within the {}-month lookback",
                            self.criteria.ipo_lookback_months
                        ));
                    }
                }
            }
        }
        None
    }
}

fn fail(profile: &CompanyProfile, stage: ScreenStage, reason: String) -> ScreenResult {
    ScreenResult {
        ticker: profile.ticker.clone(),
        passed: false,
        failed_stage: Some(stage),
        reason: Some(reason),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::company::{
        AnalystSentiment, CatalystEvent, CatalystKind, CompetitiveContext, DealSignals,
        MarketPosition, RiskLevel, ScienceProfile, StockMetrics,
    };
    use crate::types::{Region, TherapeuticArea};
    use chrono::NaiveDate;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn passing_profile() -> CompanyProfile {
        CompanyProfile {
            ticker: "ORPX".into(),
            name: "Orphix Therapeutics".into(),
            market_cap: dec!(2_400_000_000),
            cash_position: dec!(450_000_000),
            quarterly_burn_rate: dec!(75_000_000),
            institutional_ownership_pct: dec!(0.62),
            region: Region::UnitedStates,
            ipo_date: NaiveDate::from_ymd_opt(2019, 6, 12),
            lead_asset: "ORX-201".into(),
            lead_phase: ClinicalPhase::Phase2,
            pipeline_asset_count: 3,
            therapeutic_areas: vec![TherapeuticArea::RareDisease],
            is_royalty_company: false,
            has_approved_products: false,
            is_platform_company: false,
            stock: StockMetrics {
                pct_off_52w_high: dec!(0.38),
                return_3m: dec!(-0.12),
                return_12m: dec!(-0.30),
                analyst_sentiment: AnalystSentiment::Positive,
            },
            science: ScienceProfile {
                novel_mechanism: true,
                differentiated_moa: true,
                proprietary_platform: false,
                best_in_class: false,
                has_positive_phase2_data: true,
                orphan_designation: true,
                patent_life_years: 14,
            },
            deal: DealSignals {
                likely_acquirer_count: 3,
                acquisition_rumors: false,
                activist_investor: false,
                recent_partnership: true,
                sole_asset_in_space: false,
                fills_acquirer_gap: true,
                commercial_infrastructure_fit: true,
                combination_potential: false,
                antitrust_risk: RiskLevel::Low,
                regulatory_complexity: RiskLevel::Medium,
            },
            catalysts: vec![CatalystEvent {
                kind: CatalystKind::ToplineData,
                months_out: 5,
                expected_date: None,
                description: "ORX-201 Phase 2b topline".into(),
            }],
            competition: CompetitiveContext {
                position: MarketPosition::Challenger,
                competitor_count: 4,
                recent_competitor_setback: false,
                recent_competitor_approval: false,
            },
        }
    }

    fn screener() -> Screener {
        Screener::new(ScreeningCriteria::with_defaults(as_of())).unwrap()
    }

    #[test]
    fn test_passing_profile_clears_all_stages() {
        let mut s = screener();
        let result = s.screen_company(&passing_profile()).unwrap();
        assert!(result.passed);
        assert!(result.failed_stage.is_none());
        assert_eq!(s.stats().passed_all, 1);
        assert_eq!(s.stats().exclusions_passed, 1);
    }

    #[test]
    fn test_market_cap_failure_short_circuits() {
        let mut s = screener();
        let mut p = passing_profile();
        p.market_cap = dec!(100_000_000);
        let result = s.screen_company(&p).unwrap();
        assert!(!result.passed);
        assert_eq!(result.failed_stage, Some(ScreenStage::MarketCap));
        assert!(result.reason.unwrap().contains("below minimum"));
        // Later stages never counted the company as passing
        assert_eq!(s.stats().market_cap_passed, 0);
        assert_eq!(s.stats().pipeline_passed, 0);
    }

    #[test]
    fn test_small_cap_fails_under_raised_floor() {
        let mut criteria = ScreeningCriteria::with_defaults(as_of());
        criteria.min_market_cap = dec!(500_000_000);
        criteria.max_market_cap = dec!(50_000_000_000);
        criteria.min_phase = ClinicalPhase::Phase2;
        let mut s = Screener::new(criteria).unwrap();

        let mut p = passing_profile();
        p.market_cap = dec!(300_000_000);
        let result = s.screen_company(&p).unwrap();
        assert!(!result.passed);
        assert_eq!(result.failed_stage, Some(ScreenStage::MarketCap));
        assert_eq!(s.stats().pipeline_passed, 0);
    }

    #[test]
    fn test_phase_requirement() {
        let mut s = screener();
        let mut p = passing_profile();
        p.lead_phase = ClinicalPhase::Phase1;
        let result = s.screen_company(&p).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::Pipeline));
    }

    #[test]
    fn test_runway_below_minimum_fails() {
        let mut s = screener();
        let mut p = passing_profile();
        // 450M cash at 300M/quarter = 4.5 months
        p.quarterly_burn_rate = dec!(300_000_000);
        let result = s.screen_company(&p).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::FinancialHealth));
    }

    #[test]
    fn test_long_runway_hot_area_exception() {
        let mut s = screener();
        let mut p = passing_profile();
        // Minimal burn: sentinel runway, way above the 36-month ceiling,
        // but the company is in a hot area (rare disease)
        p.quarterly_burn_rate = dec!(0);
        let result = s.screen_company(&p).unwrap();
        assert!(result.passed);
    }

    #[test]
    fn test_long_runway_without_exception_fails() {
        let mut s = screener();
        let mut p = passing_profile();
        p.quarterly_burn_rate = dec!(0);
        p.therapeutic_areas = vec![TherapeuticArea::InfectiousDisease];
        let result = s.screen_company(&p).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::FinancialHealth));
    }

    #[test]
    fn test_long_runway_phase3_exception() {
        let mut s = screener();
        let mut p = passing_profile();
        p.quarterly_burn_rate = dec!(0);
        p.therapeutic_areas = vec![TherapeuticArea::InfectiousDisease];
        p.lead_phase = ClinicalPhase::Phase3;
        let result = s.screen_company(&p).unwrap();
        assert!(result.passed);
    }

    #[test]
    fn test_priority_area_overlap() {
        let mut criteria = ScreeningCriteria::with_defaults(as_of());
        criteria.priority_areas = vec![TherapeuticArea::Obesity];
        let mut s = Screener::new(criteria).unwrap();
        let result = s.screen_company(&passing_profile()).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::StrategicFit));
    }

    #[test]
    fn test_region_allow_list() {
        let mut s = screener();
        let mut p = passing_profile();
        p.region = Region::China;
        let result = s.screen_company(&p).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::StrategicFit));
    }

    #[test]
    fn test_recent_catalyst_requirement() {
        let mut criteria = ScreeningCriteria::with_defaults(as_of());
        criteria.require_recent_catalyst = true;
        criteria.catalyst_window_months = 3;
        let mut s = Screener::new(criteria).unwrap();
        // Next catalyst at 5 months is beyond the 3-month window
        let result = s.screen_company(&passing_profile()).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::StrategicFit));
    }

    #[test]
    fn test_royalty_company_excluded() {
        let mut s = screener();
        let mut p = passing_profile();
        p.is_royalty_company = true;
        let result = s.screen_company(&p).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::Exclusions));
        assert_eq!(result.reason.as_deref(), Some("Royalty company"));
    }

    #[test]
    fn test_recent_ipo_excluded() {
        let mut s = screener();
        let mut p = passing_profile();
        p.ipo_date = NaiveDate::from_ymd_opt(2024, 11, 1);
        let result = s.screen_company(&p).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::Exclusions));
    }

    #[test]
    fn test_preclinical_single_asset_excluded() {
        let mut criteria = ScreeningCriteria::with_defaults(as_of());
        criteria.min_phase = ClinicalPhase::Preclinical;
        let mut s = Screener::new(criteria).unwrap();
        let mut p = passing_profile();
        p.lead_phase = ClinicalPhase::Preclinical;
        p.pipeline_asset_count = 1;
        p.quarterly_burn_rate = dec!(40_000_000);
        let result = s.screen_company(&p).unwrap();
        assert_eq!(result.failed_stage, Some(ScreenStage::Exclusions));
    }

    #[test]
    fn test_batch_screen_partitions_and_pass_rate() {
        let mut s = screener();
        let mut too_small = passing_profile();
        too_small.ticker = "TINY".into();
        too_small.market_cap = dec!(50_000_000);
        let mut royalty = passing_profile();
        royalty.ticker = "ROYL".into();
        royalty.is_royalty_company = true;

        let profiles = vec![passing_profile(), too_small, royalty];
        let out = s.batch_screen(&profiles).unwrap().result;

        assert_eq!(out.passed.len(), 1);
        assert_eq!(out.failed.len(), 2);
        assert_eq!(out.passed[0].ticker, "ORPX");
        assert_eq!(out.pass_rate, Decimal::ONE / dec!(3));
        assert!(out.failed.iter().any(|f| f.ticker == "TINY"));
        assert_eq!(out.stats.evaluated, 3);
        assert_eq!(out.stats.passed_all, 1);
    }

    #[test]
    fn test_malformed_profile_rejected() {
        let mut s = screener();
        let mut p = passing_profile();
        p.ticker = "".into();
        assert!(s.screen_company(&p).is_err());
    }
}
