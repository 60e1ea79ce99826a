mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::ranking::RankArgs;
use commands::screening::ScreenArgs;
use commands::targets::TargetsArgs;
use commands::valuation::{
    DrugDcfArgs, PeakSalesArgs, PipelineArgs, ScenarioArgs, SensitivityArgs,
};

/// Biotech acquisition-target analytics
#[derive(Parser)]
#[command(
    name = "bta",
    version,
    about = "Biotech acquisition-target valuation, screening and ranking",
    long_about = "A CLI for valuing drug pipelines and ranking biotech acquisition \
                  targets with decimal precision. Supports risk-adjusted drug DCFs, \
                  scenario and sensitivity analysis, sum-of-parts pipeline valuation, \
                  multi-stage screening and 12-factor composite ranking."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a risk-adjusted DCF for a single drug candidate
    DrugDcf(DrugDcfArgs),
    /// Bear/base/bull scenario analysis for a drug candidate
    Scenario(ScenarioArgs),
    /// One-factor sensitivity (tornado) analysis for a drug candidate
    Sensitivity(SensitivityArgs),
    /// Sum-of-parts valuation of a multi-asset pipeline
    Pipeline(PipelineArgs),
    /// Estimate peak sales from an indication's TAM or patient count
    PeakSales(PeakSalesArgs),
    /// Screen company profiles against acquisition criteria
    Screen(ScreenArgs),
    /// Rank companies with the 12-factor composite model
    Rank(RankArgs),
    /// Full pipeline: screen, rank and assemble a target watchlist
    Targets(TargetsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::DrugDcf(args) => commands::valuation::run_drug_dcf(args),
        Commands::Scenario(args) => commands::valuation::run_scenario(args),
        Commands::Sensitivity(args) => commands::valuation::run_sensitivity(args),
        Commands::Pipeline(args) => commands::valuation::run_pipeline(args),
        Commands::PeakSales(args) => commands::valuation::run_peak_sales(args),
        Commands::Screen(args) => commands::screening::run_screen(args),
        Commands::Rank(args) => commands::ranking::run_rank(args),
        Commands::Targets(args) => commands::targets::run_targets(args),
        Commands::Version => {
            println!("bta {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
