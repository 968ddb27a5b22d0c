// ========================================================================================
//
//                         The command-line driver: cvtrunc
//
// ========================================================================================
//
// Reads an analysis file written by the path solver, evaluates every hypothesis in it,
// and writes one region report per hypothesis. All numeric work lives in the library;
// this binary owns argument parsing, logging setup and the output destination.

use clap::{Parser, Subcommand};
use cvtrunc::analysis::{Analysis, AnalysisError};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "cvtrunc",
    about = "Exact truncation regions for cross-validated sparse regression",
    long_about = "Computes, for each tested coefficient, the set of points on the data line \
                 where the observed active set and the cross-validated choice of \
                 regularisation would both be reproduced."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute truncation regions for every hypothesis in an analysis file
    #[command(about = "Compute truncation regions (outputs: TOML report)")]
    Region {
        /// Path to the analysis TOML file
        analysis: PathBuf,

        /// Write the report here instead of standard output
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Region { analysis, output } => region_command(&analysis, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn region_command(
    analysis_path: &std::path::Path,
    output: Option<&std::path::Path>,
) -> Result<(), AnalysisError> {
    log::info!("Loading analysis from {}", analysis_path.display());
    let analysis = Analysis::load(analysis_path)?;
    let report = analysis.evaluate()?;

    match output {
        Some(path) => {
            report.save(path)?;
            log::info!(
                "Wrote {} report(s) to {}",
                report.reports.len(),
                path.display()
            );
        }
        None => print!("{}", report.to_toml()?),
    }
    Ok(())
}
