use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BiotargetError;
use crate::types::{ClinicalPhase, Money, Rate, Region, TherapeuticArea};
use crate::BiotargetResult;

/// Configurable screening thresholds. Constructed once per screening run
/// and never mutated mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningCriteria {
    pub min_market_cap: Money,
    pub max_market_cap: Money,
    /// Minimum clinical phase of the lead asset
    pub min_phase: ClinicalPhase,
    pub min_pipeline_assets: u32,
    pub min_cash_runway_months: Decimal,
    /// Normal runway ceiling; companies above it face no funding pressure.
    /// Hot-area, platform and Phase-3+ companies are exempt.
    pub max_cash_runway_months: Decimal,
    /// Required therapeutic-area overlap; empty disables the check
    pub priority_areas: Vec<TherapeuticArea>,
    /// Areas that exempt a company from the runway ceiling
    pub hot_areas: Vec<TherapeuticArea>,
    /// Region allow-list; empty disables the check
    pub allowed_regions: Vec<Region>,
    pub require_recent_catalyst: bool,
    /// A catalyst counts as recent when due within this many months
    pub catalyst_window_months: u32,
    /// Stock-decline bounds on the fall from the 52-week high
    pub min_stock_decline: Rate,
    pub max_stock_decline: Rate,
    pub min_institutional_ownership: Rate,
    pub max_institutional_ownership: Rate,
    pub exclude_royalty_companies: bool,
    pub exclude_preclinical_single_asset: bool,
    /// Companies that listed within this window are excluded; 0 disables
    pub ipo_lookback_months: u32,
    /// Reference date for the IPO lookback
    pub as_of: NaiveDate,
}

impl ScreeningCriteria {
    /// Sensible defaults for a small/mid-cap biotech sweep, anchored to an
    /// explicit reference date.
    pub fn with_defaults(as_of: NaiveDate) -> Self {
        Self {
            min_market_cap: dec!(200_000_000),
            max_market_cap: dec!(20_000_000_000),
            min_phase: ClinicalPhase::Phase2,
            min_pipeline_assets: 1,
            min_cash_runway_months: dec!(6),
            max_cash_runway_months: dec!(36),
            priority_areas: Vec::new(),
            hot_areas: vec![
                TherapeuticArea::Obesity,
                TherapeuticArea::Radiopharma,
                TherapeuticArea::RareDisease,
            ],
            allowed_regions: vec![
                Region::UnitedStates,
                Region::Europe,
                Region::UnitedKingdom,
            ],
            require_recent_catalyst: false,
            catalyst_window_months: 12,
            min_stock_decline: Decimal::ZERO,
            max_stock_decline: Decimal::ONE,
            min_institutional_ownership: Decimal::ZERO,
            max_institutional_ownership: Decimal::ONE,
            exclude_royalty_companies: true,
            exclude_preclinical_single_asset: true,
            ipo_lookback_months: 18,
            as_of,
        }
    }

    pub fn validate(&self) -> BiotargetResult<()> {
        if self.min_market_cap < Decimal::ZERO {
            return Err(BiotargetError::InvalidInput {
                field: "min_market_cap".into(),
                reason: "Must be non-negative".into(),
            });
        }
        if self.max_market_cap <= self.min_market_cap {
            return Err(BiotargetError::InvalidInput {
                field: "max_market_cap".into(),
                reason: "Must exceed min_market_cap".into(),
            });
        }
        if self.max_cash_runway_months < self.min_cash_runway_months {
            return Err(BiotargetError::InvalidInput {
                field: "max_cash_runway_months".into(),
                reason: "Must be at least min_cash_runway_months".into(),
            });
        }
        if self.max_stock_decline < self.min_stock_decline {
            return Err(BiotargetError::InvalidInput {
                field: "max_stock_decline".into(),
                reason: "Must be at least min_stock_decline".into(),
            });
        }
        if self.min_institutional_ownership < Decimal::ZERO
            || self.max_institutional_ownership > Decimal::ONE
            || self.max_institutional_ownership < self.min_institutional_ownership
        {
            return Err(BiotargetError::InvalidInput {
                field: "institutional_ownership".into(),
                reason: "Bounds must satisfy 0 <= min <= max <= 1".into(),
            });
        }
        Ok(())
    }
}
