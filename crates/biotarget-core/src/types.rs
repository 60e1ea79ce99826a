use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.12 = 12%). Never as percentages.
pub type Rate = Decimal;

/// Probabilities in [0, 1].
pub type Probability = Decimal;

/// Factor and composite scores on a 0-100 scale.
pub type Score = Decimal;

/// Multiples (e.g., 2.4x NPV / peak sales)
pub type Multiple = Decimal;

/// Clinical development phase, ordered from earliest to latest.
/// The derived `Ord` follows declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalPhase {
    #[default]
    Preclinical,
    Phase1,
    Phase2,
    Phase3,
    Filed,
    Approved,
}

impl ClinicalPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ClinicalPhase::Preclinical => "Preclinical",
            ClinicalPhase::Phase1 => "Phase 1",
            ClinicalPhase::Phase2 => "Phase 2",
            ClinicalPhase::Phase3 => "Phase 3",
            ClinicalPhase::Filed => "Filed",
            ClinicalPhase::Approved => "Approved",
        }
    }
}

/// Therapeutic area. A closed tag set: adding a new area is a compile-time
/// decision, with `Other` as the explicit catch-all arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TherapeuticArea {
    Obesity,
    Oncology,
    Radiopharma,
    Cns,
    Immunology,
    RareDisease,
    GeneTherapy,
    Cardiovascular,
    InfectiousDisease,
    Other,
}

impl TherapeuticArea {
    pub fn label(&self) -> &'static str {
        match self {
            TherapeuticArea::Obesity => "Obesity / Metabolic",
            TherapeuticArea::Oncology => "Oncology",
            TherapeuticArea::Radiopharma => "Radiopharmaceuticals",
            TherapeuticArea::Cns => "CNS / Neurology",
            TherapeuticArea::Immunology => "Immunology",
            TherapeuticArea::RareDisease => "Rare Disease",
            TherapeuticArea::GeneTherapy => "Gene Therapy",
            TherapeuticArea::Cardiovascular => "Cardiovascular",
            TherapeuticArea::InfectiousDisease => "Infectious Disease",
            TherapeuticArea::Other => "Other",
        }
    }
}

/// Revenue-curve archetype selecting ramp, plateau and erosion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CurveArchetype {
    #[default]
    Standard,
    Blockbuster,
    Orphan,
    FastFollower,
    GeneTherapy,
}

/// Company maturity stage, derived from the lead asset's clinical phase.
/// Keys the discount-rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStage {
    PreclinicalBiotech,
    ClinicalStage,
    LateStage,
    Commercial,
}

impl CompanyStage {
    pub fn from_phase(phase: ClinicalPhase) -> Self {
        match phase {
            ClinicalPhase::Preclinical => CompanyStage::PreclinicalBiotech,
            ClinicalPhase::Phase1 | ClinicalPhase::Phase2 => CompanyStage::ClinicalStage,
            ClinicalPhase::Phase3 | ClinicalPhase::Filed => CompanyStage::LateStage,
            ClinicalPhase::Approved => CompanyStage::Commercial,
        }
    }
}

/// Listing / operating region used by the screening allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    UnitedStates,
    Europe,
    UnitedKingdom,
    Japan,
    China,
    RestOfWorld,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_ordering() {
        assert!(ClinicalPhase::Preclinical < ClinicalPhase::Phase1);
        assert!(ClinicalPhase::Phase1 < ClinicalPhase::Phase2);
        assert!(ClinicalPhase::Phase2 < ClinicalPhase::Phase3);
        assert!(ClinicalPhase::Phase3 < ClinicalPhase::Filed);
        assert!(ClinicalPhase::Filed < ClinicalPhase::Approved);
    }

    #[test]
    fn test_stage_from_phase() {
        assert_eq!(
            CompanyStage::from_phase(ClinicalPhase::Preclinical),
            CompanyStage::PreclinicalBiotech
        );
        assert_eq!(
            CompanyStage::from_phase(ClinicalPhase::Phase2),
            CompanyStage::ClinicalStage
        );
        assert_eq!(
            CompanyStage::from_phase(ClinicalPhase::Filed),
            CompanyStage::LateStage
        );
        assert_eq!(
            CompanyStage::from_phase(ClinicalPhase::Approved),
            CompanyStage::Commercial
        );
    }

    #[test]
    fn test_phase_serde_snake_case() {
        let json = serde_json::to_string(&ClinicalPhase::Phase3).unwrap();
        assert_eq!(json, "\"phase3\"");
        let back: ClinicalPhase = serde_json::from_str("\"preclinical\"").unwrap();
        assert_eq!(back, ClinicalPhase::Preclinical);
    }
}
