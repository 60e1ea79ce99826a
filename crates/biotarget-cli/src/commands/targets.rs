use clap::Args;
use serde_json::Value;
use std::collections::BTreeMap;

use biotarget_core::company::CompanyProfile;
use biotarget_core::targets::identifier::{TargetIdentifier, TargetIdentifierConfig};
use biotarget_core::valuation::pipeline::DrugCandidate;

use super::{load_tables, ranking, screening};
use crate::input;

/// Arguments for the full target-identification pipeline
#[derive(Args)]
pub struct TargetsArgs {
    /// Path to a JSON/YAML file with an array of company profiles
    #[arg(long)]
    pub companies: Option<String>,

    /// Path to a JSON/YAML file with the screening criteria
    #[arg(long)]
    pub criteria: Option<String>,

    /// Reference date (YYYY-MM-DD) for default criteria
    #[arg(long)]
    pub as_of: Option<String>,

    /// Path to a JSON/YAML file with custom factor weights
    #[arg(long)]
    pub weights: Option<String>,

    /// Keep only the top N targets
    #[arg(long, default_value = "10")]
    pub top_n: usize,

    /// Name for the produced watchlist
    #[arg(long, default_value = "default")]
    pub watchlist: String,

    /// Path to a JSON/YAML map of ticker to drug candidates; when given,
    /// each target also gets a sum-of-parts pipeline valuation
    #[arg(long)]
    pub pipelines: Option<String>,

    /// Path to an assumption-tables file overriding the defaults
    #[arg(long)]
    pub assumptions: Option<String>,
}

pub fn run_targets(args: TargetsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let profiles: Vec<CompanyProfile> = if let Some(ref path) = args.companies {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--companies file (or piped JSON) is required".into());
    };

    let criteria = screening::resolve_criteria(&args.criteria, &args.as_of)?;
    let weights = ranking::resolve_weights(&args.weights)?;
    let config = TargetIdentifierConfig {
        top_n: args.top_n,
        ..TargetIdentifierConfig::default()
    };

    let identifier = TargetIdentifier::new(criteria, weights, config)?;
    let result = match args.pipelines {
        Some(ref path) => {
            let candidates: BTreeMap<String, Vec<DrugCandidate>> =
                input::file::read_input(path)?;
            let tables = load_tables(&args.assumptions)?;
            identifier.identify_with_valuations(&args.watchlist, &profiles, &candidates, &tables)?
        }
        None => identifier.identify(&args.watchlist, &profiles)?,
    };
    Ok(serde_json::to_value(result)?)
}
