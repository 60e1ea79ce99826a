use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::BiotargetError;
use crate::types::{
    ClinicalPhase, CompanyStage, CurveArchetype, Money, Probability, Rate, TherapeuticArea,
};
use crate::BiotargetResult;

// ---------------------------------------------------------------------------
// Table primitives
// ---------------------------------------------------------------------------

/// A min / typical / max estimate for a rate or probability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeEstimate {
    pub min: Decimal,
    pub typical: Decimal,
    pub max: Decimal,
}

impl RangeEstimate {
    pub const fn new(min: Decimal, typical: Decimal, max: Decimal) -> Self {
        Self { min, typical, max }
    }
}

/// One value per clinical phase. Adding a phase forces every table to be
/// extended, so a new phase can never fall through to a silent default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTable<T> {
    pub preclinical: T,
    pub phase1: T,
    pub phase2: T,
    pub phase3: T,
    pub filed: T,
    pub approved: T,
}

impl<T> PhaseTable<T> {
    pub fn get(&self, phase: ClinicalPhase) -> &T {
        match phase {
            ClinicalPhase::Preclinical => &self.preclinical,
            ClinicalPhase::Phase1 => &self.phase1,
            ClinicalPhase::Phase2 => &self.phase2,
            ClinicalPhase::Phase3 => &self.phase3,
            ClinicalPhase::Filed => &self.filed,
            ClinicalPhase::Approved => &self.approved,
        }
    }
}

/// One value per therapeutic area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaTable<T> {
    pub obesity: T,
    pub oncology: T,
    pub radiopharma: T,
    pub cns: T,
    pub immunology: T,
    pub rare_disease: T,
    pub gene_therapy: T,
    pub cardiovascular: T,
    pub infectious_disease: T,
    pub other: T,
}

impl<T> AreaTable<T> {
    pub fn get(&self, area: TherapeuticArea) -> &T {
        match area {
            TherapeuticArea::Obesity => &self.obesity,
            TherapeuticArea::Oncology => &self.oncology,
            TherapeuticArea::Radiopharma => &self.radiopharma,
            TherapeuticArea::Cns => &self.cns,
            TherapeuticArea::Immunology => &self.immunology,
            TherapeuticArea::RareDisease => &self.rare_disease,
            TherapeuticArea::GeneTherapy => &self.gene_therapy,
            TherapeuticArea::Cardiovascular => &self.cardiovascular,
            TherapeuticArea::InfectiousDisease => &self.infectious_disease,
            TherapeuticArea::Other => &self.other,
        }
    }
}

/// One value per company maturity stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTable<T> {
    pub preclinical_biotech: T,
    pub clinical_stage: T,
    pub late_stage: T,
    pub commercial: T,
}

impl<T> StageTable<T> {
    pub fn get(&self, stage: CompanyStage) -> &T {
        match stage {
            CompanyStage::PreclinicalBiotech => &self.preclinical_biotech,
            CompanyStage::ClinicalStage => &self.clinical_stage,
            CompanyStage::LateStage => &self.late_stage,
            CompanyStage::Commercial => &self.commercial,
        }
    }
}

/// One value per revenue-curve archetype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeTable<T> {
    pub standard: T,
    pub blockbuster: T,
    pub orphan: T,
    pub fast_follower: T,
    pub gene_therapy: T,
}

impl<T> ArchetypeTable<T> {
    pub fn get(&self, archetype: CurveArchetype) -> &T {
        match archetype {
            CurveArchetype::Standard => &self.standard,
            CurveArchetype::Blockbuster => &self.blockbuster,
            CurveArchetype::Orphan => &self.orphan,
            CurveArchetype::FastFollower => &self.fast_follower,
            CurveArchetype::GeneTherapy => &self.gene_therapy,
        }
    }
}

// ---------------------------------------------------------------------------
// Table entry types
// ---------------------------------------------------------------------------

/// Shape parameters for a revenue-curve archetype. Years are offsets from
/// launch; `decline_start_year` equals `ramp_years + peak_years` in every
/// default archetype.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArchetypeParams {
    pub ramp_years: u32,
    pub peak_years: u32,
    pub decline_start_year: u32,
    /// Fraction of peak revenue retained immediately after patent expiry
    pub patent_cliff_multiplier: Rate,
}

/// Total-addressable-market estimate for one indication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TamEntry {
    pub low: Money,
    pub typical: Money,
    pub high: Money,
    /// Addressable patients (prevalence-adjusted)
    pub patient_population: Decimal,
}

/// Operating cost structure as fractions of revenue, plus the tax rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostAssumptions {
    pub cogs_pct: Rate,
    pub rd_pct: Rate,
    pub sga_pct: Rate,
    pub da_pct: Rate,
    pub capex_pct: Rate,
    pub tax_rate: Rate,
}

impl Default for CostAssumptions {
    fn default() -> Self {
        Self {
            cogs_pct: dec!(0.15),
            rd_pct: dec!(0.20),
            sga_pct: dec!(0.30),
            da_pct: dec!(0.05),
            capex_pct: dec!(0.05),
            tax_rate: dec!(0.21),
        }
    }
}

// ---------------------------------------------------------------------------
// AssumptionTables
// ---------------------------------------------------------------------------

/// Immutable lookup data behind the valuation engine. Constructed once
/// (usually via `Default`) and passed by reference into every computation,
/// so tests can override any table without touching global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssumptionTables {
    /// Probability of reaching approval from each phase
    pub pos_by_phase: PhaseTable<RangeEstimate>,
    /// Multiplier applied to base PoS per therapeutic area
    pub area_pos_multiplier: AreaTable<Rate>,
    /// WACC range per company maturity stage
    pub discount_by_stage: StageTable<RangeEstimate>,
    /// Revenue-curve shape per archetype
    pub archetypes: ArchetypeTable<ArchetypeParams>,
    /// TAM estimates keyed by lower-case indication name
    pub tam_by_indication: BTreeMap<String, TamEntry>,
    /// Default operating cost structure
    pub costs: CostAssumptions,
    /// Annual development burn per phase, used when no explicit
    /// pre-launch cost schedule is supplied
    pub dev_burn_by_phase: PhaseTable<Money>,
}

impl Default for AssumptionTables {
    fn default() -> Self {
        Self {
            pos_by_phase: PhaseTable {
                preclinical: RangeEstimate::new(dec!(0.05), dec!(0.075), dec!(0.10)),
                phase1: RangeEstimate::new(dec!(0.12), dec!(0.175), dec!(0.25)),
                phase2: RangeEstimate::new(dec!(0.22), dec!(0.30), dec!(0.40)),
                phase3: RangeEstimate::new(dec!(0.50), dec!(0.60), dec!(0.70)),
                filed: RangeEstimate::new(dec!(0.85), dec!(0.90), dec!(0.95)),
                approved: RangeEstimate::new(dec!(1.00), dec!(1.00), dec!(1.00)),
            },
            area_pos_multiplier: AreaTable {
                obesity: dec!(1.05),
                oncology: dec!(0.90),
                radiopharma: dec!(1.05),
                cns: dec!(0.75),
                immunology: dec!(1.00),
                rare_disease: dec!(1.15),
                gene_therapy: dec!(1.10),
                cardiovascular: dec!(0.95),
                infectious_disease: dec!(0.85),
                other: dec!(1.00),
            },
            discount_by_stage: StageTable {
                preclinical_biotech: RangeEstimate::new(dec!(0.15), dec!(0.18), dec!(0.22)),
                clinical_stage: RangeEstimate::new(dec!(0.12), dec!(0.15), dec!(0.18)),
                late_stage: RangeEstimate::new(dec!(0.10), dec!(0.12), dec!(0.15)),
                commercial: RangeEstimate::new(dec!(0.08), dec!(0.10), dec!(0.12)),
            },
            archetypes: ArchetypeTable {
                standard: ArchetypeParams {
                    ramp_years: 5,
                    peak_years: 4,
                    decline_start_year: 9,
                    patent_cliff_multiplier: dec!(0.30),
                },
                blockbuster: ArchetypeParams {
                    ramp_years: 6,
                    peak_years: 5,
                    decline_start_year: 11,
                    patent_cliff_multiplier: dec!(0.35),
                },
                orphan: ArchetypeParams {
                    ramp_years: 3,
                    peak_years: 6,
                    decline_start_year: 9,
                    patent_cliff_multiplier: dec!(0.45),
                },
                fast_follower: ArchetypeParams {
                    ramp_years: 4,
                    peak_years: 3,
                    decline_start_year: 7,
                    patent_cliff_multiplier: dec!(0.25),
                },
                gene_therapy: ArchetypeParams {
                    ramp_years: 2,
                    peak_years: 4,
                    decline_start_year: 6,
                    patent_cliff_multiplier: dec!(0.50),
                },
            },
            tam_by_indication: default_tam_table(),
            costs: CostAssumptions::default(),
            dev_burn_by_phase: PhaseTable {
                preclinical: dec!(15_000_000),
                phase1: dec!(25_000_000),
                phase2: dec!(45_000_000),
                phase3: dec!(90_000_000),
                filed: dec!(25_000_000),
                approved: dec!(0),
            },
        }
    }
}

fn default_tam_table() -> BTreeMap<String, TamEntry> {
    let mut tam = BTreeMap::new();
    tam.insert(
        "obesity".to_string(),
        TamEntry {
            low: dec!(80_000_000_000),
            typical: dec!(100_000_000_000),
            high: dec!(130_000_000_000),
            patient_population: dec!(110_000_000),
        },
    );
    tam.insert(
        "nsclc".to_string(),
        TamEntry {
            low: dec!(25_000_000_000),
            typical: dec!(32_000_000_000),
            high: dec!(40_000_000_000),
            patient_population: dec!(2_200_000),
        },
    );
    tam.insert(
        "multiple myeloma".to_string(),
        TamEntry {
            low: dec!(18_000_000_000),
            typical: dec!(23_000_000_000),
            high: dec!(28_000_000_000),
            patient_population: dec!(180_000),
        },
    );
    tam.insert(
        "alzheimers".to_string(),
        TamEntry {
            low: dec!(8_000_000_000),
            typical: dec!(13_000_000_000),
            high: dec!(20_000_000_000),
            patient_population: dec!(6_500_000),
        },
    );
    tam.insert(
        "nash".to_string(),
        TamEntry {
            low: dec!(10_000_000_000),
            typical: dec!(16_000_000_000),
            high: dec!(25_000_000_000),
            patient_population: dec!(9_000_000),
        },
    );
    tam.insert(
        "atopic dermatitis".to_string(),
        TamEntry {
            low: dec!(12_000_000_000),
            typical: dec!(15_000_000_000),
            high: dec!(20_000_000_000),
            patient_population: dec!(16_000_000),
        },
    );
    tam.insert(
        "sickle cell disease".to_string(),
        TamEntry {
            low: dec!(3_000_000_000),
            typical: dec!(5_000_000_000),
            high: dec!(8_000_000_000),
            patient_population: dec!(100_000),
        },
    );
    tam.insert(
        "duchenne muscular dystrophy".to_string(),
        TamEntry {
            low: dec!(4_000_000_000),
            typical: dec!(6_000_000_000),
            high: dec!(9_000_000_000),
            patient_population: dec!(15_000),
        },
    );
    tam
}

impl AssumptionTables {
    /// Base probability of success for a phase, adjusted by therapeutic
    /// area and capped at 1.0.
    pub fn probability_of_success(
        &self,
        phase: ClinicalPhase,
        area: Option<TherapeuticArea>,
    ) -> Probability {
        let base = self.pos_by_phase.get(phase).typical;
        let multiplier = area
            .map(|a| *self.area_pos_multiplier.get(a))
            .unwrap_or(Decimal::ONE);
        let adjusted = base * multiplier;
        if adjusted > Decimal::ONE {
            Decimal::ONE
        } else {
            adjusted
        }
    }

    /// Typical discount rate for the maturity stage implied by a phase.
    pub fn discount_rate_for_phase(&self, phase: ClinicalPhase) -> Rate {
        self.discount_by_stage
            .get(CompanyStage::from_phase(phase))
            .typical
    }

    pub fn archetype_params(&self, archetype: CurveArchetype) -> ArchetypeParams {
        *self.archetypes.get(archetype)
    }

    /// Peak-sales range from an indication's TAM and an assumed peak
    /// market share. Unknown indications fail; silent defaults here would
    /// contaminate every valuation downstream.
    pub fn peak_sales_from_tam(
        &self,
        indication: &str,
        peak_share: Rate,
    ) -> BiotargetResult<RangeEstimate> {
        if peak_share <= Decimal::ZERO || peak_share > Decimal::ONE {
            return Err(BiotargetError::InvalidInput {
                field: "peak_share".into(),
                reason: "Peak market share must be in (0, 1]".into(),
            });
        }
        let entry = self.tam_entry(indication)?;
        Ok(RangeEstimate::new(
            entry.low * peak_share,
            entry.typical * peak_share,
            entry.high * peak_share,
        ))
    }

    /// Peak sales from addressable patients, an assumed annual price per
    /// patient, and an assumed peak penetration.
    pub fn peak_sales_from_patients(
        &self,
        indication: &str,
        annual_price_per_patient: Money,
        peak_penetration: Rate,
    ) -> BiotargetResult<Money> {
        if annual_price_per_patient <= Decimal::ZERO {
            return Err(BiotargetError::InvalidInput {
                field: "annual_price_per_patient".into(),
                reason: "Price per patient must be positive".into(),
            });
        }
        if peak_penetration <= Decimal::ZERO || peak_penetration > Decimal::ONE {
            return Err(BiotargetError::InvalidInput {
                field: "peak_penetration".into(),
                reason: "Peak penetration must be in (0, 1]".into(),
            });
        }
        let entry = self.tam_entry(indication)?;
        Ok(entry.patient_population * annual_price_per_patient * peak_penetration)
    }

    fn tam_entry(&self, indication: &str) -> BiotargetResult<&TamEntry> {
        let key = indication.trim().to_lowercase();
        self.tam_by_indication
            .get(&key)
            .ok_or_else(|| BiotargetError::UnknownIndication(indication.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_typical_values() {
        let t = AssumptionTables::default();
        assert_eq!(t.pos_by_phase.get(ClinicalPhase::Preclinical).typical, dec!(0.075));
        assert_eq!(t.pos_by_phase.get(ClinicalPhase::Phase1).typical, dec!(0.175));
        assert_eq!(t.pos_by_phase.get(ClinicalPhase::Phase2).typical, dec!(0.30));
        assert_eq!(t.pos_by_phase.get(ClinicalPhase::Phase3).typical, dec!(0.60));
        assert_eq!(t.pos_by_phase.get(ClinicalPhase::Filed).typical, dec!(0.90));
        assert_eq!(t.pos_by_phase.get(ClinicalPhase::Approved).typical, dec!(1.00));
    }

    #[test]
    fn test_pos_area_adjustment() {
        let t = AssumptionTables::default();
        // Rare disease boosts PoS by 15%
        let rare = t.probability_of_success(ClinicalPhase::Phase2, Some(TherapeuticArea::RareDisease));
        assert_eq!(rare, dec!(0.30) * dec!(1.15));
        // CNS is penalised
        let cns = t.probability_of_success(ClinicalPhase::Phase2, Some(TherapeuticArea::Cns));
        assert_eq!(cns, dec!(0.30) * dec!(0.75));
        // No area: base value unchanged
        let base = t.probability_of_success(ClinicalPhase::Phase2, None);
        assert_eq!(base, dec!(0.30));
    }

    #[test]
    fn test_pos_capped_at_one() {
        let t = AssumptionTables::default();
        let pos = t.probability_of_success(
            ClinicalPhase::Approved,
            Some(TherapeuticArea::RareDisease),
        );
        assert_eq!(pos, Decimal::ONE);
    }

    #[test]
    fn test_discount_rate_by_stage() {
        let t = AssumptionTables::default();
        assert_eq!(t.discount_rate_for_phase(ClinicalPhase::Preclinical), dec!(0.18));
        assert_eq!(t.discount_rate_for_phase(ClinicalPhase::Phase2), dec!(0.15));
        assert_eq!(t.discount_rate_for_phase(ClinicalPhase::Phase3), dec!(0.12));
        assert_eq!(t.discount_rate_for_phase(ClinicalPhase::Approved), dec!(0.10));
    }

    #[test]
    fn test_archetype_decline_start_consistency() {
        let t = AssumptionTables::default();
        for archetype in [
            CurveArchetype::Standard,
            CurveArchetype::Blockbuster,
            CurveArchetype::Orphan,
            CurveArchetype::FastFollower,
            CurveArchetype::GeneTherapy,
        ] {
            let p = t.archetype_params(archetype);
            assert_eq!(
                p.decline_start_year,
                p.ramp_years + p.peak_years,
                "decline start should follow the plateau for {archetype:?}"
            );
            assert!(p.patent_cliff_multiplier > Decimal::ZERO);
            assert!(p.patent_cliff_multiplier < Decimal::ONE);
        }
    }

    #[test]
    fn test_peak_sales_from_tam() {
        let t = AssumptionTables::default();
        let est = t.peak_sales_from_tam("obesity", dec!(0.10)).unwrap();
        assert_eq!(est.typical, dec!(10_000_000_000));
        assert_eq!(est.min, dec!(8_000_000_000));
        assert_eq!(est.max, dec!(13_000_000_000));
    }

    #[test]
    fn test_peak_sales_from_tam_case_insensitive() {
        let t = AssumptionTables::default();
        let est = t.peak_sales_from_tam("  Obesity ", dec!(0.10)).unwrap();
        assert_eq!(est.typical, dec!(10_000_000_000));
    }

    #[test]
    fn test_unknown_indication_fails() {
        let t = AssumptionTables::default();
        let err = t.peak_sales_from_tam("alopecia", dec!(0.10)).unwrap_err();
        match err {
            BiotargetError::UnknownIndication(name) => assert_eq!(name, "alopecia"),
            other => panic!("Expected UnknownIndication, got {other:?}"),
        }
    }

    #[test]
    fn test_peak_sales_from_patients() {
        let t = AssumptionTables::default();
        // 100k sickle cell patients x $200k/yr x 5% penetration = $1.0B
        let peak = t
            .peak_sales_from_patients("sickle cell disease", dec!(200_000), dec!(0.05))
            .unwrap();
        assert_eq!(peak, dec!(1_000_000_000));
    }

    #[test]
    fn test_invalid_share_rejected() {
        let t = AssumptionTables::default();
        assert!(t.peak_sales_from_tam("obesity", dec!(0)).is_err());
        assert!(t.peak_sales_from_tam("obesity", dec!(1.2)).is_err());
    }
}
