//! Layout of the output record.
//!
//! The output echoes the input record with its numbers coerced, adds every
//! exported engine field, the interface flags taken from the globals, the
//! raised errors and the success marker.

use std::collections::BTreeMap;

use prep_core::bucket::Globals;
use prep_engine::{SampleInputs, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::input::InputRecord;

/// Numeric inputs echoed with input precision.
pub const INPUT_NUMBER_FIELDS: [&str; 16] = [
    "SampleVolumeToUseInAnnealing",
    "NumberOfCellsToUse",
    "StartingSampleConcentration",
    "CustomNonStandardAnnealingConcentration",
    "CustomNonStandardBindingConcentration",
    "CustomConcentrationOnPlate",
    "BindingComplexNumberOfCellsRequested",
    "LoadingTitrationNumberOfCellsRequested",
    "TitrationConcentration1",
    "TitrationConcentration2",
    "TitrationConcentration3",
    "TitrationConcentration4",
    "AvailableSampleVolume",
    "CustomSpikeInRatioPercent",
    "CustomPolymeraseTemplateRatio",
    "CustomVolumeOfBindingReactionInStorageComplex",
];

/// Fields shown as whole numbers.
pub const INTEGER_FIELDS: [&str; 9] = [
    "AnnealedBasePairLength",
    "MaxNumberOfCellsPerWellFromBucket",
    "MaxNumberOfCellsPerWell",
    "NumberOfCellsInBinding",
    "NumberOfCellsFromBinding",
    "NumberOfFullWells",
    "NumberOfCellsFromPartialWells",
    "NumberOfPartialWells",
    "TotalComplexDilutionCells",
];

/// Coerced numeric inputs under their output names.
pub fn numeric_inputs(inputs: &SampleInputs) -> Vec<(&'static str, f64)> {
    let [first, second, third, fourth] = inputs.titration_concentrations;
    vec![
        ("SampleVolumeToUseInAnnealing", inputs.sample_volume_to_use_in_annealing),
        ("NumberOfCellsToUse", inputs.number_of_cells_to_use),
        ("StartingSampleConcentration", inputs.starting_sample_concentration),
        (
            "CustomNonStandardAnnealingConcentration",
            inputs.custom_non_standard_annealing_concentration,
        ),
        (
            "CustomNonStandardBindingConcentration",
            inputs.custom_non_standard_binding_concentration,
        ),
        (
            "BindingComplexNumberOfCellsRequested",
            inputs.binding_complex_number_of_cells_requested,
        ),
        (
            "LoadingTitrationNumberOfCellsRequested",
            inputs.loading_titration_number_of_cells_requested,
        ),
        ("TitrationConcentration1", first),
        ("TitrationConcentration2", second),
        ("TitrationConcentration3", third),
        ("TitrationConcentration4", fourth),
        ("AvailableSampleVolume", inputs.available_sample_volume),
        ("AnnealedBasePairLength", inputs.annealed_base_pair_length),
        ("CustomConcentrationOnPlate", inputs.custom_concentration_on_plate),
        ("CustomSpikeInRatioPercent", inputs.custom_spike_in_ratio_percent),
        ("CustomPolymeraseTemplateRatio", inputs.custom_polymerase_template_ratio),
        ("NumberOfCellsInBinding", inputs.number_of_cells_in_binding),
        (
            "CustomVolumeOfBindingReactionInStorageComplex",
            inputs.custom_volume_of_binding_reaction_in_storage_complex,
        ),
    ]
}

/// Text valued inputs and the record identity, passed through unchanged.
pub fn text_inputs(record: &InputRecord) -> Vec<(&'static str, String)> {
    vec![
        ("SampleName", record.sample_name.clone()),
        ("SampleGuid", record.sample_guid.to_string()),
        ("Version", record.version.clone()),
        ("ComputeOption", label(&record.compute_option)),
        ("MagBead", label(&record.mag_bead)),
        ("PreparationProtocol", label(&record.preparation_protocol)),
        ("LongTermStorage", label(&record.long_term_storage)),
        ("UseSpikeInControl", label(&record.use_spike_in_control)),
        ("ComplexReuse", label(&record.complex_reuse)),
        ("LowConcentrationsAllowed", label(&record.low_concentrations_allowed)),
        ("BindingComputation", label(&record.binding_computation)),
        ("CollectionProtocol", label(&record.collection_protocol)),
        ("Chemistry", record.chemistry.clone()),
        ("Cell", record.cell.clone()),
        ("ConcentrationOnPlateOption", label(&record.concentration_on_plate_option)),
        (
            "NonStandardAnnealingConcentrationOption",
            label(&record.non_standard_annealing_concentration_option),
        ),
        ("SpikeInRatioOption", label(&record.spike_in_ratio_option)),
        ("PolymeraseTemplateRatioOption", label(&record.polymerase_template_ratio_option)),
        ("BindingPolymeraseOption", label(&record.binding_polymerase_option)),
        ("StorageComplexOption", label(&record.storage_complex_option)),
    ]
}

/// Persisted spelling of an option value.
fn label<T: Serialize>(option: &T) -> String {
    match serde_json::to_value(option) {
        Ok(serde_json::Value::String(text)) => text,
        _ => String::new(),
    }
}

/// Interface switches carried through from the globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UiFlags {
    /// Whether the cell selector is shown.
    pub show_cell_option: bool,
    /// Whether the chemistry selector is shown.
    pub show_chemistry_option: bool,
    /// Whether the strobe protocol selector is shown; never offered.
    pub show_strobe_option: bool,
    /// Whether non-standard concentrations may be solved in reverse.
    pub allow_non_standard_reverse_calculations: bool,
}

impl UiFlags {
    /// Reads the flags from `globals`.
    pub fn from_globals(globals: &Globals) -> Self {
        Self {
            show_cell_option: globals.show_cell_option,
            show_chemistry_option: globals.show_chemistry_option,
            show_strobe_option: false,
            allow_non_standard_reverse_calculations: globals.allow_non_standard_reverse_calculations,
        }
    }
}

/// A computed sample as handed to printing and listing collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutput {
    /// Sanitized inputs and derived fields by output name.
    pub values: BTreeMap<String, Value>,
    /// Interface switches.
    pub flags: UiFlags,
    /// Raised domain errors.
    pub errors: prep_engine::ErrorMap,
    /// `false` only when the calculation itself failed.
    pub success: bool,
}

impl SampleOutput {
    /// Returns the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Numeric value under `name`; missing fields and text read as `NaN`.
    pub fn number(&self, name: &str) -> f64 {
        self.get(name).map_or(f64::NAN, Value::as_number)
    }

    /// Text value under `name`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }
}

impl Serialize for SampleOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 6))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("ShowCellOption", &self.flags.show_cell_option)?;
        map.serialize_entry("ShowChemistryOption", &self.flags.show_chemistry_option)?;
        map.serialize_entry("ShowStrobeOption", &self.flags.show_strobe_option)?;
        map.serialize_entry(
            "AllowNonStandardReverseCalculations",
            &self.flags.allow_non_standard_reverse_calculations,
        )?;
        map.serialize_entry("Errors", &self.errors)?;
        map.serialize_entry("Success", &self.success)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::catalog::Constants;

    #[test]
    fn every_numeric_input_is_categorised() {
        let inputs = SampleInputs::default();
        for (name, _) in numeric_inputs(&inputs) {
            assert!(
                INPUT_NUMBER_FIELDS.contains(&name) || INTEGER_FIELDS.contains(&name),
                "{name}"
            );
        }
    }

    #[test]
    fn options_use_their_persisted_spelling() {
        let record = InputRecord::default();
        let texts: BTreeMap<_, _> = text_inputs(&record).into_iter().collect();
        assert_eq!(texts["MagBead"], "True");
        assert_eq!(texts["ComputeOption"], "Volume");
        assert_eq!(texts["SampleName"], "Untitled");
    }

    #[test]
    fn strobe_is_never_offered() {
        let flags = UiFlags::from_globals(&Constants::builtin().globals);
        assert!(!flags.show_strobe_option);
        assert!(flags.show_chemistry_option);
        assert!(!flags.show_cell_option);
    }
}
