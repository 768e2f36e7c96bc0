#![deny(missing_docs)]
#![doc = "Core types for the sample preparation calculator: errors, domain error codes, numeric helpers, protocol options and the bucket catalog."]

/// Bucket and global constant records.
pub mod bucket;
mod builtin;
/// Bucket catalog lookup and the full constant set.
pub mod catalog;
/// Domain error codes and their message table.
pub mod codes;
/// Structured error types shared across crates.
pub mod errors;
/// Rounding and parsing helpers with the calculator's arithmetic rules.
pub mod numeric;
/// Protocol option enums.
pub mod options;
/// JSON and YAML helpers.
pub mod serde;

pub use bucket::{Bucket, Globals};
pub use catalog::{load_constants, BucketCatalog, Constants};
pub use codes::{ErrorCode, ErrorMessage, ErrorRegistry};
pub use errors::{ErrorInfo, PrepError};
pub use numeric::{gaussian_round, js_max, trunc_int};
pub use options::{
    BindingComputation, BindingPolymeraseOption, Choice, CollectionProtocol, ComputeOption, Flag,
    PreparationProtocol, ProtocolType, RunMode,
};
