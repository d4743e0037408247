//! Mars Link Scaling Analysis CLI
//!
//! Sweeps in-ring satellite counts, finds the optimal ring count for each,
//! fits the scaling laws and exports the tables.
//!
//! Usage:
//!   marslink-analysis --n-min 20 --n-max 5320 --n-step 20 \
//!                     --output analysis/marslink_analysis.csv
//!   marslink-analysis --config analysis.json --format json --convergence 1000,2000,5320

use anyhow::Result;
use clap::Parser;
use relay_link_model::RelayLinkModel;
use ring_scaling::convergence::convergence_study;
use ring_scaling::export::{export_report, settle_export, ExportFormat, ExportOutcome};
use ring_scaling::optimizer::RingOptimizer;
use ring_scaling::pipeline::run_relay_analysis;
use ring_scaling::{report, AnalysisConfig, NRange};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "marslink-analysis",
    about = "Optimal ring count and throughput scaling laws for an Earth-Mars relay constellation"
)]
struct Args {
    /// JSON config file (fields left out keep their defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First in-ring satellite count
    #[arg(long)]
    n_min: Option<u32>,

    /// Last in-ring satellite count (inclusive)
    #[arg(long)]
    n_max: Option<u32>,

    /// Stride between in-ring satellite counts
    #[arg(long)]
    n_step: Option<u32>,

    /// Largest ring count evaluated per search
    #[arg(long)]
    r_max: Option<u32>,

    /// Worst-case throughput target for the threshold report (Mbps)
    #[arg(long)]
    target_mbps: Option<f64>,

    /// Output file
    #[arg(short, long, default_value = "analysis/marslink_analysis.csv")]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    format: ExportFormat,

    /// Skip writing the export file
    #[arg(long)]
    no_export: bool,

    /// Compare the early-stop search with an exhaustive scan
    #[arg(long)]
    verify_unimodal: bool,

    /// Refit exponents for each of these N_max values
    #[arg(long, value_delimiter = ',')]
    convergence: Vec<u32>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };

        config.n_range = NRange {
            min: self.n_min.unwrap_or(config.n_range.min),
            max: self.n_max.unwrap_or(config.n_range.max),
            step: self.n_step.unwrap_or(config.n_range.step),
        };
        if let Some(r_max) = self.r_max {
            config.r_max = r_max;
        }
        if let Some(target) = self.target_mbps {
            config.target_mbps = target;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    report::banner("SX9-Orbital Mars Link Scaling Analysis");

    let config = args.analysis_config()?;
    let analysis = run_relay_analysis(&config)?;

    report::banner("RESULTS");
    report::log_report(&analysis);

    if !args.no_export {
        let outcome = settle_export(export_report(&analysis, &args.output, args.format))?;
        if let ExportOutcome::Written(paths) = outcome {
            for path in paths {
                info!("Wrote {:?}", path);
            }
        }
    }

    if args.verify_unimodal {
        report::banner("UNIMODALITY CHECK");
        let optimizer =
            RingOptimizer::new(RelayLinkModel::new(&config.constants)).with_r_max(config.r_max)?;
        let violations = optimizer.verify_unimodal(&config.n_range)?;
        report::log_violations(&violations);
    }

    if !args.convergence.is_empty() {
        let points = convergence_study(
            RelayLinkModel::new(&config.constants),
            &config,
            &args.convergence,
        )?;
        report::log_convergence(&points);
    }

    Ok(())
}
