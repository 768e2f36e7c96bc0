//! Bucket catalog and the full constant set consumed by the engine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bucket::{Bucket, Globals};
use crate::codes::ErrorRegistry;
use crate::errors::{ErrorInfo, PrepError};
use crate::options::ProtocolType;
use crate::serde::{from_yaml_slice, to_yaml_string};

fn catalog_error(code: &str, message: impl Into<String>) -> PrepError {
    PrepError::Catalog(ErrorInfo::new(code, message))
}

/// Ordered collection of buckets with deterministic lookup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketCatalog {
    buckets: Vec<Bucket>,
}

impl BucketCatalog {
    /// Builds a catalog and validates that no two ranges with the same key
    /// overlap.
    pub fn new(buckets: Vec<Bucket>) -> Result<Self, PrepError> {
        let catalog = Self { buckets };
        catalog.validate()?;
        Ok(catalog)
    }

    pub(crate) fn from_trusted(buckets: Vec<Bucket>) -> Self {
        Self { buckets }
    }

    /// Returns the unique bucket covering `length` for the given key.
    ///
    /// A `NaN` length never matches.
    pub fn find(
        &self,
        length: f64,
        protocol: ProtocolType,
        chemistry: &str,
        cell: &str,
    ) -> Option<&Bucket> {
        self.buckets.iter().find(|bucket| {
            bucket.protocol_type == protocol
                && bucket.chemistry == chemistry
                && bucket.cell == cell
                && bucket.covers(length)
        })
    }

    /// Checks range sanity and the single-match property.
    pub fn validate(&self) -> Result<(), PrepError> {
        for (idx, bucket) in self.buckets.iter().enumerate() {
            let ordered = bucket.min_base_pair_length < bucket.max_base_pair_length;
            if !ordered {
                return Err(PrepError::Catalog(
                    ErrorInfo::new("bucket-range", "bucket range is empty or not numeric")
                        .with_context("index", idx.to_string())
                        .with_context("chemistry", bucket.chemistry.clone())
                        .with_context("protocol", bucket.protocol_type.as_str()),
                ));
            }
            for (other_idx, other) in self.buckets.iter().enumerate().skip(idx + 1) {
                let same_key = bucket.protocol_type == other.protocol_type
                    && bucket.chemistry == other.chemistry
                    && bucket.cell == other.cell;
                let overlaps = bucket.min_base_pair_length < other.max_base_pair_length
                    && other.min_base_pair_length < bucket.max_base_pair_length;
                if same_key && overlaps {
                    return Err(PrepError::Catalog(
                        ErrorInfo::new("bucket-overlap", "bucket ranges overlap")
                            .with_context("first", idx.to_string())
                            .with_context("second", other_idx.to_string())
                            .with_hint("ranges sharing a key must be disjoint"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Iterates over the buckets in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` when the catalog holds no bucket.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Distinct nominal sizes available for `chemistry`, ascending.
    pub fn bucket_sizes(&self, chemistry: &str) -> Vec<f64> {
        let mut sizes: Vec<f64> = self
            .buckets
            .iter()
            .filter(|bucket| bucket.chemistry == chemistry)
            .map(|bucket| bucket.size)
            .collect();
        sizes.sort_by(f64::total_cmp);
        sizes.dedup();
        sizes
    }
}

/// Every constant the calculator reads: globals, the error message table,
/// the bucket catalog and the fallback bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constants {
    /// Constants shared by every bucket.
    pub globals: Globals,
    /// Messages for every raisable error code.
    pub errors: ErrorRegistry,
    /// Selectable buckets.
    pub buckets: BucketCatalog,
    /// Placeholder substituted when no bucket matches.
    #[serde(default = "Bucket::error_bucket")]
    pub error_bucket: Bucket,
}

impl Constants {
    /// Returns the compiled-in constant set.
    pub fn builtin() -> Self {
        crate::builtin::constants()
    }

    /// Validates the bucket catalog.
    pub fn validate(&self) -> Result<(), PrepError> {
        self.buckets.validate()
    }

    /// Serializes the constant set to YAML.
    pub fn to_yaml_string(&self) -> Result<String, PrepError> {
        to_yaml_string(self)
    }
}

/// Loads a constant set from a YAML file and validates it.
pub fn load_constants(path: impl AsRef<Path>) -> Result<Constants, PrepError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        PrepError::Catalog(
            ErrorInfo::new("catalog-read", err.to_string())
                .at_path(path.display().to_string()),
        )
    })?;
    let constants: Constants = from_yaml_slice(&bytes)?;
    constants.validate()?;
    if constants.buckets.is_empty() {
        return Err(catalog_error("catalog-empty", "catalog contains no bucket"));
    }
    debug!(
        path = %path.display(),
        buckets = constants.buckets.len(),
        "loaded constant catalog"
    );
    Ok(constants)
}
