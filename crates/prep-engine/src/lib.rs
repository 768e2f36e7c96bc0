#![deny(missing_docs)]
#![doc = "Calculation engine for the sample preparation calculator: an explicit dependency graph of computation steps, the plate layout model and the titration and magnetic bead sub-calculators."]

/// Primary sample calculation.
pub mod engine;
/// Domain condition aggregation.
pub mod errors;
/// Derived field names.
pub mod fields;
/// Formulas shared with the sub-calculators.
pub mod helpers;
/// Typed computation inputs.
pub mod inputs;
/// Magnetic bead purification sub-calculator.
pub mod magbead;
/// Sample plate well allocation.
pub mod plate;
/// Working record and step views.
pub mod record;
/// Dependency scheduling.
pub mod schedule;
/// Loading titration sub-calculator.
pub mod titration;

pub use engine::{Calculation, CalculationEngine};
pub use errors::ErrorMap;
pub use fields::{Field, MagBeadField, MagBeadVariant, SampleField, TitrationField};
pub use helpers::Helpers;
pub use inputs::SampleInputs;
pub use plate::PlateLayout;
pub use record::{Record, Value};
