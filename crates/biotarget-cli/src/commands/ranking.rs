use clap::Args;
use serde_json::Value;

use biotarget_core::company::CompanyProfile;
use biotarget_core::ranking::ranker::Ranker;
use biotarget_core::ranking::weights::RankingWeights;

use crate::input;

/// Arguments for 12-factor composite ranking
#[derive(Args)]
pub struct RankArgs {
    /// Path to a JSON/YAML file with an array of company profiles
    #[arg(long)]
    pub companies: Option<String>,

    /// Path to a JSON/YAML file with custom factor weights
    #[arg(long)]
    pub weights: Option<String>,

    /// Keep only the top N targets
    #[arg(long)]
    pub top_n: Option<usize>,
}

pub fn run_rank(args: RankArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let profiles: Vec<CompanyProfile> = if let Some(ref path) = args.companies {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--companies file (or piped JSON) is required".into());
    };

    let weights = resolve_weights(&args.weights)?;
    let ranker = Ranker::new(weights)?;
    let result = ranker.rank_targets(&profiles, args.top_n)?;
    Ok(serde_json::to_value(result)?)
}

pub fn resolve_weights(
    path: &Option<String>,
) -> Result<RankingWeights, Box<dyn std::error::Error>> {
    match path {
        Some(path) => input::file::read_input(path),
        None => Ok(RankingWeights::default()),
    }
}
