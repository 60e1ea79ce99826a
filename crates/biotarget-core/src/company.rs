use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BiotargetError;
use crate::types::{ClinicalPhase, Money, Rate, Region, TherapeuticArea};
use crate::BiotargetResult;

/// Runway reported when the company is not burning cash (profitable or
/// break-even). Large enough to clear any screening ceiling.
pub const RUNWAY_SENTINEL_MONTHS: Decimal = dec!(999);

// ---------------------------------------------------------------------------
// Metric groups
// ---------------------------------------------------------------------------

/// Broker/analyst consensus bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalystSentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// Coarse risk bucket used for antitrust and regulatory complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Competitive standing within the asset's primary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    Leader,
    CoLeader,
    #[default]
    Challenger,
    Niche,
}

/// Anticipated value-inflection event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalystKind {
    ToplineData,
    InterimReadout,
    RegulatoryDecision,
    AdcomMeeting,
    ConferencePresentation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalystEvent {
    pub kind: CatalystKind,
    pub months_out: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
    pub description: String,
}

/// Share-price performance metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMetrics {
    /// Decline from the 52-week high, as a positive fraction (0.45 = down 45%)
    pub pct_off_52w_high: Rate,
    pub return_3m: Rate,
    pub return_12m: Rate,
    pub analyst_sentiment: AnalystSentiment,
}

/// Science and IP profile of the lead program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScienceProfile {
    pub novel_mechanism: bool,
    pub differentiated_moa: bool,
    pub proprietary_platform: bool,
    pub best_in_class: bool,
    pub has_positive_phase2_data: bool,
    pub orphan_designation: bool,
    pub patent_life_years: u32,
}

/// M&A context signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealSignals {
    /// Plausible strategic acquirers identified by the ingestion layer
    pub likely_acquirer_count: u32,
    pub acquisition_rumors: bool,
    pub activist_investor: bool,
    pub recent_partnership: bool,
    pub sole_asset_in_space: bool,
    pub fills_acquirer_gap: bool,
    pub commercial_infrastructure_fit: bool,
    pub combination_potential: bool,
    pub antitrust_risk: RiskLevel,
    pub regulatory_complexity: RiskLevel,
}

/// Competitive landscape around the lead asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitiveContext {
    pub position: MarketPosition,
    pub competitor_count: u32,
    pub recent_competitor_setback: bool,
    pub recent_competitor_approval: bool,
}

// ---------------------------------------------------------------------------
// CompanyProfile
// ---------------------------------------------------------------------------

/// Structured snapshot of a potential acquisition target, as assembled by
/// the ingestion collaborators. Immutable once it enters the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Unique key
    pub ticker: String,
    pub name: String,
    pub market_cap: Money,
    pub cash_position: Money,
    /// Cash consumed per quarter; zero or negative means cash-generative
    pub quarterly_burn_rate: Money,
    /// 0-1
    pub institutional_ownership_pct: Rate,
    pub region: Region,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipo_date: Option<NaiveDate>,
    pub lead_asset: String,
    pub lead_phase: ClinicalPhase,
    pub pipeline_asset_count: u32,
    pub therapeutic_areas: Vec<TherapeuticArea>,
    pub is_royalty_company: bool,
    pub has_approved_products: bool,
    pub is_platform_company: bool,
    pub stock: StockMetrics,
    pub science: ScienceProfile,
    pub deal: DealSignals,
    pub catalysts: Vec<CatalystEvent>,
    pub competition: CompetitiveContext,
}

impl CompanyProfile {
    /// Months of cash remaining at the current burn rate. A company that
    /// is not burning cash gets `RUNWAY_SENTINEL_MONTHS`.
    pub fn cash_runway_months(&self) -> Decimal {
        if self.quarterly_burn_rate <= Decimal::ZERO {
            return RUNWAY_SENTINEL_MONTHS;
        }
        let monthly_burn = self.quarterly_burn_rate / dec!(3);
        self.cash_position / monthly_burn
    }

    /// Months until the nearest upcoming catalyst, if any.
    pub fn months_to_next_catalyst(&self) -> Option<u32> {
        self.catalysts.iter().map(|c| c.months_out).min()
    }

    pub fn has_area(&self, area: TherapeuticArea) -> bool {
        self.therapeutic_areas.contains(&area)
    }

    /// Reject profiles that should never enter the computation pipeline.
    pub fn validate(&self) -> BiotargetResult<()> {
        if self.ticker.trim().is_empty() {
            return Err(BiotargetError::InvalidInput {
                field: "ticker".into(),
                reason: "Ticker must not be empty".into(),
            });
        }
        if self.market_cap <= Decimal::ZERO {
            return Err(BiotargetError::InvalidInput {
                field: "market_cap".into(),
                reason: "Market cap must be positive".into(),
            });
        }
        if self.cash_position < Decimal::ZERO {
            return Err(BiotargetError::InvalidInput {
                field: "cash_position".into(),
                reason: "Cash position must be non-negative".into(),
            });
        }
        if self.institutional_ownership_pct < Decimal::ZERO
            || self.institutional_ownership_pct > Decimal::ONE
        {
            return Err(BiotargetError::InvalidInput {
                field: "institutional_ownership_pct".into(),
                reason: "Must be between 0 and 1".into(),
            });
        }
        if self.pipeline_asset_count == 0 {
            return Err(BiotargetError::InvalidInput {
                field: "pipeline_asset_count".into(),
                reason: "A profile must carry at least one pipeline asset".into(),
            });
        }
        if self.stock.pct_off_52w_high < Decimal::ZERO || self.stock.pct_off_52w_high > Decimal::ONE
        {
            return Err(BiotargetError::InvalidInput {
                field: "pct_off_52w_high".into(),
                reason: "Must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
