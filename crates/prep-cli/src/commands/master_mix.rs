use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use prep_record::master_mix;
use tracing::warn;

use super::load_record;
use crate::resolve_config;

#[derive(Args, Debug)]
pub struct MasterMixArgs {
    /// Persisted sample records (JSON) sharing the master mix.
    #[arg(long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,
    /// Calculator configuration (YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &MasterMixArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(args.config.as_ref())?;
    let engine = config.engine()?;
    let mut outputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let mut record = load_record(path)?;
        let output = record.calculate(&engine);
        if !output.success {
            warn!(path = %path.display(), "skipping sample that failed to calculate");
            continue;
        }
        outputs.push(output.clone());
    }
    let mix = master_mix(&outputs, &engine.constants().globals, engine.mode())?;
    println!("{}", serde_json::to_string_pretty(&mix)?);
    Ok(())
}
