pub mod compute;
pub mod master_mix;

use std::error::Error;
use std::fs;
use std::path::Path;

use prep_record::SampleRecord;

/// Reads one persisted sample record.
pub(crate) fn load_record(path: &Path) -> Result<SampleRecord, Box<dyn Error>> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    Ok(SampleRecord::from_json(&data)?)
}
