use prep_core::errors::PrepError;
use prep_core::serde::to_canonical_json_bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::schema::SampleOutput;

/// Computes a stable hexadecimal hash for the provided serializable payload.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, PrepError> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{:x}", digest))
}

/// Fingerprint of a computed sample, independent of its identity fields.
///
/// Two records with the same inputs fingerprint identically even when their
/// names or identifiers differ.
pub fn output_fingerprint(output: &SampleOutput) -> Result<String, PrepError> {
    let mut anonymous = output.clone();
    for key in ["SampleName", "SampleGuid", "Version"] {
        anonymous.values.remove(key);
    }
    stable_hash_string(&anonymous)
}
