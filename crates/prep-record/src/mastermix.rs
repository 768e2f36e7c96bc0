//! Diluted primer master mix shared by several samples.
//!
//! Every sample uses the same primer dilution, so one mix is prepared for
//! all of them with 20% overage for pipetting losses.

use prep_core::bucket::Globals;
use prep_core::errors::{ErrorInfo, PrepError};
use prep_core::numeric::js_max;
use prep_core::options::RunMode;
use prep_engine::Value;
use serde::Serialize;

use crate::sanitize::{sanitize, Category};
use crate::schema::SampleOutput;

const OVERAGE: f64 = 1.2;

/// Volumes of the aggregate primer dilution, rounded like any other output
/// volume. Volumes that cannot be computed hold the `"?"` sentinel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MasterMix {
    /// Total volume of the dilution.
    pub primer_and_elution_volume: Value,
    /// Stock primer going into the dilution.
    pub primer_volume: Value,
    /// Elution buffer making up the rest.
    pub elution_volume: Value,
}

/// Sizes the primer master mix for `samples`.
///
/// Samples whose calculation failed are left out. The dilution
/// concentration and minimum volume come from the first remaining sample.
/// A selection without any successfully computed sample is an input error.
pub fn master_mix(
    samples: &[SampleOutput],
    globals: &Globals,
    mode: RunMode,
) -> Result<MasterMix, PrepError> {
    let computed: Vec<&SampleOutput> = samples.iter().filter(|sample| sample.success).collect();
    let first = computed.first().ok_or_else(|| {
        PrepError::Input(
            ErrorInfo::new("master-mix-empty", "no computed samples selected for the master mix")
                .with_context("selected", samples.len().to_string())
                .with_hint("select at least one successfully computed sample"),
        )
    })?;
    let diluted = first.number("DilutedPrimerConcentration");
    let stock = globals.annealing_primer_stock_concentration;
    let minimum_pipettable = globals.minimum_pipettable_volume;

    let primer: f64 = computed
        .iter()
        .map(|sample| sample.number("PrimerVolumeInAnnealingReaction"))
        .sum();
    let mut total = js_max(first.number("MinimumVolumeOfDilutedPrimer"), primer * OVERAGE).ceil();
    if diluted * total / stock < minimum_pipettable {
        total = minimum_pipettable * stock / diluted;
    }
    let primer_volume = diluted * total / stock;
    let volume = |value: f64| sanitize(&Value::Number(value), Category::Volume, mode);
    Ok(MasterMix {
        primer_and_elution_volume: volume(total),
        primer_volume: volume(primer_volume),
        elution_volume: volume(total - primer_volume),
    })
}
