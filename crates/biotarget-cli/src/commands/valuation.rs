use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use biotarget_core::types::{ClinicalPhase, CurveArchetype, TherapeuticArea};
use biotarget_core::valuation::drug_dcf::{
    self, DrugDcfInput, ScenarioWeights,
};
use biotarget_core::valuation::pipeline::{self, PipelineValuationInput};

use super::{load_tables, parse_token};
use crate::input;

/// Arguments for a single-asset risk-adjusted DCF
#[derive(Args)]
pub struct DrugDcfArgs {
    /// Path to a JSON/YAML input file with the full DCF parameters
    #[arg(long)]
    pub input: Option<String>,

    /// Drug candidate name
    #[arg(long)]
    pub name: Option<String>,

    /// Peak sales estimate in dollars
    #[arg(long)]
    pub peak_sales: Option<Decimal>,

    /// Clinical phase (preclinical, phase1, phase2, phase3, filed, approved)
    #[arg(long)]
    pub phase: Option<String>,

    /// Therapeutic area (obesity, oncology, rare_disease, ...)
    #[arg(long)]
    pub area: Option<String>,

    /// Revenue-curve archetype (standard, blockbuster, orphan,
    /// fast_follower, gene_therapy)
    #[arg(long, default_value = "standard")]
    pub archetype: String,

    /// Years until commercial launch
    #[arg(long, default_value = "2")]
    pub years_to_launch: u32,

    /// Patent life remaining from launch, in years
    #[arg(long, default_value = "12")]
    pub patent_life: u32,

    /// Discount rate override (e.g. 0.12)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Probability-of-success override (e.g. 0.6)
    #[arg(long)]
    pub pos: Option<Decimal>,

    /// Path to an assumption-tables file overriding the defaults
    #[arg(long)]
    pub assumptions: Option<String>,
}

/// Arguments for scenario analysis
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to a JSON/YAML DCF input file
    #[arg(long)]
    pub input: Option<String>,

    /// Bear case probability weight
    #[arg(long, default_value = "0.25")]
    pub bear_weight: Decimal,

    /// Base case probability weight
    #[arg(long, default_value = "0.50")]
    pub base_weight: Decimal,

    /// Bull case probability weight
    #[arg(long, default_value = "0.25")]
    pub bull_weight: Decimal,

    /// Path to an assumption-tables file overriding the defaults
    #[arg(long)]
    pub assumptions: Option<String>,
}

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a JSON/YAML DCF input file
    #[arg(long)]
    pub input: Option<String>,

    /// Path to an assumption-tables file overriding the defaults
    #[arg(long)]
    pub assumptions: Option<String>,
}

/// Arguments for pipeline (sum-of-parts) valuation
#[derive(Args)]
pub struct PipelineArgs {
    /// Path to a JSON/YAML file with the pipeline valuation input
    #[arg(long)]
    pub input: Option<String>,

    /// Path to an assumption-tables file overriding the defaults
    #[arg(long)]
    pub assumptions: Option<String>,
}

/// Arguments for TAM-based peak sales estimation
#[derive(Args)]
pub struct PeakSalesArgs {
    /// Indication name from the TAM table (e.g. "obesity", "nsclc")
    #[arg(long)]
    pub indication: String,

    /// Assumed peak market share (e.g. 0.10)
    #[arg(long)]
    pub peak_share: Option<Decimal>,

    /// Assumed annual price per patient; pairs with --penetration
    #[arg(long)]
    pub price_per_patient: Option<Decimal>,

    /// Assumed peak patient penetration (e.g. 0.05)
    #[arg(long)]
    pub penetration: Option<Decimal>,

    /// Path to an assumption-tables file overriding the defaults
    #[arg(long)]
    pub assumptions: Option<String>,
}

pub fn run_drug_dcf(args: DrugDcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = load_tables(&args.assumptions)?;
    let dcf_input = resolve_dcf_input(
        &args.input,
        || build_dcf_input_from_flags(&args),
    )?;
    let result = drug_dcf::value_drug(&dcf_input, &tables)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenario(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = load_tables(&args.assumptions)?;
    let dcf_input = resolve_dcf_input(&args.input, || {
        Err("--input file (or piped JSON) is required for scenario analysis".into())
    })?;
    let weights = ScenarioWeights {
        bear: args.bear_weight,
        base: args.base_weight,
        bull: args.bull_weight,
    };
    let result = drug_dcf::scenario_analysis(&dcf_input, &tables, Some(weights))?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = load_tables(&args.assumptions)?;
    let dcf_input = resolve_dcf_input(&args.input, || {
        Err("--input file (or piped JSON) is required for sensitivity analysis".into())
    })?;
    let result = drug_dcf::sensitivity_analysis(&dcf_input, &tables)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_pipeline(args: PipelineArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = load_tables(&args.assumptions)?;
    let pipeline_input: PipelineValuationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file (or piped JSON) is required for pipeline valuation".into());
    };
    let result = pipeline::value_pipeline(&pipeline_input, &tables)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_peak_sales(args: PeakSalesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tables = load_tables(&args.assumptions)?;
    match (args.peak_share, args.price_per_patient, args.penetration) {
        (Some(share), None, None) => {
            let estimate = tables.peak_sales_from_tam(&args.indication, share)?;
            Ok(serde_json::to_value(estimate)?)
        }
        (None, Some(price), Some(penetration)) => {
            let peak =
                tables.peak_sales_from_patients(&args.indication, price, penetration)?;
            Ok(serde_json::json!({ "peak_sales": peak }))
        }
        _ => Err(
            "Provide either --peak-share, or --price-per-patient with --penetration".into(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Input resolution
// ---------------------------------------------------------------------------

fn resolve_dcf_input(
    path: &Option<String>,
    fallback: impl FnOnce() -> Result<DrugDcfInput, Box<dyn std::error::Error>>,
) -> Result<DrugDcfInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return input::file::read_input(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(data);
    }
    fallback()
}

fn build_dcf_input_from_flags(
    args: &DrugDcfArgs,
) -> Result<DrugDcfInput, Box<dyn std::error::Error>> {
    let phase: ClinicalPhase = parse_token(
        args.phase
            .as_deref()
            .ok_or("--phase is required (or provide --input)")?,
        "clinical phase",
    )?;
    let archetype: CurveArchetype = parse_token(&args.archetype, "curve archetype")?;
    let area: Option<TherapeuticArea> = match &args.area {
        Some(token) => Some(parse_token(token, "therapeutic area")?),
        None => None,
    };

    Ok(DrugDcfInput {
        drug_name: args.name.clone().unwrap_or_else(|| "unnamed".to_string()),
        indication: None,
        phase,
        therapeutic_area: area,
        archetype,
        peak_sales_estimate: args
            .peak_sales
            .ok_or("--peak-sales is required (or provide --input)")?,
        years_to_launch: args.years_to_launch,
        patent_life_years: args.patent_life,
        horizon_years: None,
        costs: None,
        discount_rate: args.discount_rate,
        pos_override: args.pos,
        development_costs: None,
        ramp_years_override: None,
    })
}
