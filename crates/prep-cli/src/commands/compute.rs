use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use prep_record::hash::output_fingerprint;
use serde_json::Value;
use tracing::info;

use super::load_record;
use crate::resolve_config;

#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Persisted sample records (JSON) to calculate.
    #[arg(long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,
    /// Calculator configuration (YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print a stable hash of each output instead of the output itself.
    #[arg(long, default_value_t = false)]
    pub fingerprint: bool,
}

pub fn run(args: &ComputeArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(args.config.as_ref())?;
    let engine = config.engine()?;
    let mut outputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let mut record = load_record(path)?;
        let output = record.calculate(&engine);
        info!(path = %path.display(), success = output.success, "calculated sample");
        if args.fingerprint {
            println!("{}  {}", output_fingerprint(output)?, path.display());
        } else {
            outputs.push(serde_json::to_value(output)?);
        }
    }
    if args.fingerprint {
        return Ok(());
    }
    let rendered = match outputs.len() {
        1 => outputs.remove(0),
        _ => Value::Array(outputs),
    };
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}
