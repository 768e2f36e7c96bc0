use std::error::Error;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use commands::{
    compute::{self, ComputeArgs},
    master_mix::{self, MasterMixArgs},
};
use prep_core::catalog::Constants;
use prep_record::{load_config, CalculatorConfig, SampleRecord};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "prepcalc", about = "Sample preparation reagent calculator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate one or more sample records and print their outputs.
    Compute(ComputeArgs),
    /// Print the persisted form of a freshly created sample record.
    Defaults,
    /// Print the constant catalog as YAML.
    Catalog(CatalogArgs),
    /// Calculate a primer master mix across several sample records.
    MasterMix(MasterMixArgs),
}

#[derive(ClapArgs, Debug)]
struct CatalogArgs {
    /// Calculator configuration whose catalog and overrides are printed.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compute(args) => compute::run(&args)?,
        Command::Defaults => {
            println!("{}", SampleRecord::new().to_json()?);
        }
        Command::Catalog(args) => {
            let constants = match &args.config {
                Some(path) => load_config(path)?.constants()?,
                None => Constants::builtin(),
            };
            print!("{}", constants.to_yaml_string()?);
        }
        Command::MasterMix(args) => master_mix::run(&args)?,
    }
    Ok(())
}

/// Configuration named on the command line, or the defaults.
pub(crate) fn resolve_config(path: Option<&PathBuf>) -> Result<CalculatorConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(CalculatorConfig::default()),
    }
}
