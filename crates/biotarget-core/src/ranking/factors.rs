use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::company::{
    AnalystSentiment, CatalystKind, CompanyProfile, MarketPosition, RiskLevel,
};
use crate::types::{ClinicalPhase, Money, Score, TherapeuticArea};

use super::weights::FactorScores;

const SCORE_MIN: Decimal = dec!(0);
const SCORE_MAX: Decimal = dec!(100);

/// Compute all twelve factor scores for a company. Every score is clamped
/// into [0, 100] even under adversarial inputs, preserving the ranking
/// invariants downstream.
pub fn score_company(profile: &CompanyProfile) -> FactorScores {
    FactorScores {
        pipeline_quality: score_pipeline_quality(profile),
        market_cap_fit: score_market_cap_fit(profile.market_cap),
        cash_runway: score_cash_runway(profile.cash_runway_months()),
        therapeutic_area: score_therapeutic_area(&profile.therapeutic_areas),
        clinical_stage: score_clinical_stage(profile.lead_phase),
        financial_distress: score_financial_distress(profile),
        scientific_differentiation: score_scientific_differentiation(profile),
        acquisition_tension: score_acquisition_tension(profile),
        strategic_acquirer_fit: score_strategic_acquirer_fit(profile),
        data_catalyst_timing: score_data_catalyst_timing(profile),
        competitive_landscape: score_competitive_landscape(profile),
        deal_structure_feasibility: score_deal_structure_feasibility(profile),
    }
}

/// Static heat table over therapeutic areas. Unmapped areas land on the
/// explicit `Other` arm rather than a silent runtime fallback.
pub fn area_heat(area: TherapeuticArea) -> Score {
    match area {
        TherapeuticArea::Obesity => dec!(100),
        TherapeuticArea::Radiopharma => dec!(95),
        TherapeuticArea::RareDisease => dec!(85),
        TherapeuticArea::Oncology => dec!(80),
        TherapeuticArea::Immunology => dec!(75),
        TherapeuticArea::GeneTherapy => dec!(70),
        TherapeuticArea::Cns => dec!(65),
        TherapeuticArea::Cardiovascular => dec!(60),
        TherapeuticArea::InfectiousDisease => dec!(55),
        TherapeuticArea::Other => dec!(50),
    }
}

// ---------------------------------------------------------------------------
// Factor 1: pipeline quality
// ---------------------------------------------------------------------------

fn score_pipeline_quality(p: &CompanyProfile) -> Score {
    let asset_bonus = match p.pipeline_asset_count {
        0 => dec!(0),
        1 => dec!(5),
        2 => dec!(12),
        3 => dec!(20),
        4 => dec!(25),
        _ => dec!(30),
    };
    let phase_bonus = match p.lead_phase {
        ClinicalPhase::Preclinical => dec!(5),
        ClinicalPhase::Phase1 => dec!(12),
        ClinicalPhase::Phase2 => dec!(22),
        ClinicalPhase::Phase3 => dec!(28),
        ClinicalPhase::Filed => dec!(30),
        ClinicalPhase::Approved => dec!(34),
    };
    let mut score = asset_bonus + phase_bonus;
    if p.science.has_positive_phase2_data {
        score += dec!(20);
    }
    if p.science.differentiated_moa {
        score += dec!(16);
    }
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Factor 2: market cap fit
// ---------------------------------------------------------------------------

/// Bell-shaped preference peaking in the $1B-$5B digestible-deal range.
fn score_market_cap_fit(market_cap: Money) -> Score {
    let score = if market_cap < dec!(250_000_000) {
        dec!(40)
    } else if market_cap < dec!(1_000_000_000) {
        dec!(75)
    } else if market_cap <= dec!(5_000_000_000) {
        dec!(100)
    } else if market_cap <= dec!(10_000_000_000) {
        dec!(80)
    } else if market_cap <= dec!(20_000_000_000) {
        dec!(60)
    } else if market_cap <= dec!(50_000_000_000) {
        dec!(40)
    } else {
        dec!(20)
    };
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Factor 3: cash runway
// ---------------------------------------------------------------------------

/// Peaks at 12-18 months: long enough to negotiate, short enough that the
/// board feels the clock.
fn score_cash_runway(runway_months: Decimal) -> Score {
    let score = if runway_months < dec!(6) {
        dec!(40)
    } else if runway_months < dec!(12) {
        dec!(85)
    } else if runway_months <= dec!(18) {
        dec!(100)
    } else if runway_months <= dec!(24) {
        dec!(80)
    } else if runway_months <= dec!(36) {
        dec!(60)
    } else {
        dec!(35)
    };
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Factor 4: therapeutic area heat
// ---------------------------------------------------------------------------

fn score_therapeutic_area(areas: &[TherapeuticArea]) -> Score {
    // Multi-area companies take the hottest of their areas
    areas
        .iter()
        .map(|a| area_heat(*a))
        .max()
        .unwrap_or_else(|| area_heat(TherapeuticArea::Other))
}

// ---------------------------------------------------------------------------
// Factor 5: clinical stage
// ---------------------------------------------------------------------------

/// Peaks at Phase 2/3: de-risked enough to believe, early enough that the
/// acquirer still captures the approval step-up.
fn score_clinical_stage(phase: ClinicalPhase) -> Score {
    match phase {
        ClinicalPhase::Preclinical => dec!(25),
        ClinicalPhase::Phase1 => dec!(45),
        ClinicalPhase::Phase2 => dec!(90),
        ClinicalPhase::Phase3 => dec!(95),
        ClinicalPhase::Filed => dec!(75),
        ClinicalPhase::Approved => dec!(60),
    }
}

// ---------------------------------------------------------------------------
// Factor 6: financial distress
// ---------------------------------------------------------------------------

/// Higher score = more pressure to transact. Blend of stock-decline
/// bucket (40 pts), runway bucket (30 pts) and sentiment bucket (30 pts).
fn score_financial_distress(p: &CompanyProfile) -> Score {
    let decline = p.stock.pct_off_52w_high;
    let decline_points = if decline >= dec!(0.60) {
        dec!(40)
    } else if decline >= dec!(0.40) {
        dec!(30)
    } else if decline >= dec!(0.20) {
        dec!(18)
    } else {
        dec!(8)
    };

    let runway = p.cash_runway_months();
    let runway_points = if runway < dec!(9) {
        dec!(30)
    } else if runway < dec!(15) {
        dec!(22)
    } else if runway < dec!(24) {
        dec!(12)
    } else {
        dec!(5)
    };

    let sentiment_points = match p.stock.analyst_sentiment {
        AnalystSentiment::Negative => dec!(30),
        AnalystSentiment::Neutral => dec!(18),
        AnalystSentiment::Positive => dec!(8),
    };

    clamp_score(decline_points + runway_points + sentiment_points)
}

// ---------------------------------------------------------------------------
// Factor 7: scientific differentiation
// ---------------------------------------------------------------------------

fn score_scientific_differentiation(p: &CompanyProfile) -> Score {
    let mut score = Decimal::ZERO;
    if p.science.novel_mechanism || p.science.differentiated_moa {
        score += dec!(25);
    }
    if p.science.proprietary_platform {
        score += dec!(20);
    }
    if p.science.best_in_class {
        score += dec!(15);
    }
    if p.science.has_positive_phase2_data {
        score += dec!(15);
    }
    score += match p.science.patent_life_years {
        0..=4 => dec!(0),
        5..=7 => dec!(8),
        8..=11 => dec!(15),
        _ => dec!(25),
    };
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Factor 8: acquisition tension
// ---------------------------------------------------------------------------

fn score_acquisition_tension(p: &CompanyProfile) -> Score {
    // 8 points per plausible acquirer, capped at five bidders
    let bidders = Decimal::from(p.deal.likely_acquirer_count.min(5));
    let mut score = bidders * dec!(8);
    if p.deal.acquisition_rumors {
        score += dec!(15);
    }
    if p.deal.activist_investor {
        score += dec!(10);
    }
    if p.deal.recent_partnership {
        score += dec!(10);
    }
    // Scarcity
    if p.deal.sole_asset_in_space {
        score += dec!(15);
    }
    if p.science.orphan_designation {
        score += dec!(10);
    }
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Factor 9: strategic acquirer fit
// ---------------------------------------------------------------------------

fn score_strategic_acquirer_fit(p: &CompanyProfile) -> Score {
    let mut score = Decimal::ZERO;
    if p.deal.fills_acquirer_gap {
        score += dec!(30);
    }
    if p.deal.commercial_infrastructure_fit {
        score += dec!(25);
    }
    if p.deal.combination_potential {
        score += dec!(20);
    }
    // Shared therapeutic focus with large-pharma buy-side priorities
    if p.therapeutic_areas.iter().any(|a| area_heat(*a) >= dec!(80)) {
        score += dec!(25);
    }
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Factor 10: data catalyst timing
// ---------------------------------------------------------------------------

fn catalyst_importance(kind: CatalystKind) -> Decimal {
    match kind {
        CatalystKind::RegulatoryDecision => dec!(30),
        CatalystKind::ToplineData => dec!(28),
        CatalystKind::AdcomMeeting => dec!(22),
        CatalystKind::InterimReadout => dec!(15),
        CatalystKind::ConferencePresentation => dec!(8),
    }
}

fn score_data_catalyst_timing(p: &CompanyProfile) -> Score {
    let nearest = p
        .catalysts
        .iter()
        .min_by_key(|c| c.months_out);

    let Some(nearest) = nearest else {
        return SCORE_MIN;
    };

    let timing_points = match nearest.months_out {
        0..=3 => dec!(50),
        4..=6 => dec!(40),
        7..=12 => dec!(25),
        13..=18 => dec!(12),
        _ => dec!(5),
    };

    let multi_bonus = match p.catalysts.len() {
        0 | 1 => dec!(5),
        2 => dec!(12),
        _ => dec!(20),
    };

    clamp_score(timing_points + catalyst_importance(nearest.kind) + multi_bonus)
}

// ---------------------------------------------------------------------------
// Factor 11: competitive landscape
// ---------------------------------------------------------------------------

fn score_competitive_landscape(p: &CompanyProfile) -> Score {
    let position_points = match p.competition.position {
        MarketPosition::Leader => dec!(45),
        MarketPosition::CoLeader => dec!(38),
        MarketPosition::Challenger => dec!(28),
        MarketPosition::Niche => dec!(18),
    };
    let crowding_points = match p.competition.competitor_count {
        0..=1 => dec!(30),
        2..=3 => dec!(22),
        4..=5 => dec!(12),
        _ => dec!(4),
    };
    let mut score = position_points + crowding_points;
    if p.competition.recent_competitor_setback {
        score += dec!(15);
    }
    if p.competition.recent_competitor_approval {
        score -= dec!(15);
    }
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Factor 12: deal structure feasibility
// ---------------------------------------------------------------------------

fn score_deal_structure_feasibility(p: &CompanyProfile) -> Score {
    let mut score = dec!(70);
    score -= match p.deal.antitrust_risk {
        RiskLevel::Low => dec!(0),
        RiskLevel::Medium => dec!(12),
        RiskLevel::High => dec!(30),
    };
    score += match p.deal.regulatory_complexity {
        RiskLevel::Low => dec!(5),
        RiskLevel::Medium => dec!(-5),
        RiskLevel::High => dec!(-15),
    };
    let ownership = p.institutional_ownership_pct;
    score += if ownership >= dec!(0.60) {
        dec!(10)
    } else if ownership >= dec!(0.30) {
        dec!(3)
    } else {
        dec!(-8)
    };
    clamp_score(score)
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

fn clamp_score(score: Decimal) -> Score {
    if score < SCORE_MIN {
        SCORE_MIN
    } else if score > SCORE_MAX {
        SCORE_MAX
    } else {
        score
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
