#![deny(missing_docs)]
#![doc = "Record facade for the sample preparation calculator: persisted inputs, numeric coercion, output sanitizing, master mixes and calculator configuration."]

/// YAML calculator configuration.
pub mod config;
/// Stable hashing of output records.
pub mod hash;
/// Persisted input record.
pub mod input;
/// Primer master mix across several samples.
pub mod mastermix;
/// One sample's inputs and computed outputs.
pub mod record;
/// Precision rules applied to every output value.
pub mod sanitize;
/// Output record layout.
pub mod schema;

pub use config::{load_config, CalculatorConfig};
pub use input::{InputRecord, Quantity};
pub use mastermix::{master_mix, MasterMix};
pub use record::SampleRecord;
pub use sanitize::{category_for, sanitize, Category};
pub use schema::{SampleOutput, UiFlags};
