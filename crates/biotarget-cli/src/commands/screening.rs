use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use biotarget_core::company::CompanyProfile;
use biotarget_core::screening::criteria::ScreeningCriteria;
use biotarget_core::screening::screener::Screener;

use crate::input;

/// Arguments for multi-stage screening
#[derive(Args)]
pub struct ScreenArgs {
    /// Path to a JSON/YAML file with an array of company profiles
    #[arg(long)]
    pub companies: Option<String>,

    /// Path to a JSON/YAML file with the screening criteria
    #[arg(long)]
    pub criteria: Option<String>,

    /// Reference date (YYYY-MM-DD) for default criteria; today's date
    /// semantics belong to the caller, not the core
    #[arg(long)]
    pub as_of: Option<String>,
}

pub fn run_screen(args: ScreenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let profiles: Vec<CompanyProfile> = if let Some(ref path) = args.companies {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--companies file (or piped JSON) is required".into());
    };

    let criteria = resolve_criteria(&args.criteria, &args.as_of)?;
    let mut screener = Screener::new(criteria)?;
    let result = screener.batch_screen(&profiles)?;
    Ok(serde_json::to_value(result)?)
}

pub fn resolve_criteria(
    criteria_path: &Option<String>,
    as_of: &Option<String>,
) -> Result<ScreeningCriteria, Box<dyn std::error::Error>> {
    if let Some(path) = criteria_path {
        return input::file::read_input(path);
    }
    let as_of = as_of
        .as_deref()
        .ok_or("--as-of YYYY-MM-DD is required when no --criteria file is given")?;
    let date = NaiveDate::parse_from_str(as_of, "%Y-%m-%d")
        .map_err(|e| format!("Invalid --as-of date '{as_of}': {e}"))?;
    Ok(ScreeningCriteria::with_defaults(date))
}
