//! The persisted input record.
//!
//! Records are stored as flat JSON objects with PascalCase keys. Numeric
//! inputs may arrive as numbers or as strings typed by the user; they are
//! kept as given and only coerced when a computation needs them.

use prep_core::errors::PrepError;
use prep_core::numeric::{parse_float, parse_int};
use prep_core::options::{
    BindingComputation, BindingPolymeraseOption, Choice, CollectionProtocol, ComputeOption, Flag,
    PreparationProtocol,
};
use prep_core::serde::from_json_slice;
use prep_engine::SampleInputs;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A numeric input as it was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    /// Already numeric.
    Number(f64),
    /// Free text, parsed on use.
    Text(String),
}

impl Quantity {
    /// Real-valued reading; text is parsed up to its first invalid character.
    pub fn as_float(&self) -> f64 {
        match self {
            Quantity::Number(value) => *value,
            Quantity::Text(text) => parse_float(text),
        }
    }

    /// Count reading; fractions are truncated toward zero.
    pub fn as_int(&self) -> f64 {
        match self {
            Quantity::Number(value) if value.is_finite() => value.trunc(),
            Quantity::Number(_) => f64::NAN,
            Quantity::Text(text) => parse_int(text),
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::Number(0.0)
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Quantity::Number(value)
    }
}

impl From<&str> for Quantity {
    fn from(value: &str) -> Self {
        Quantity::Text(value.to_string())
    }
}

/// Every user-settable field of one sample plus its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InputRecord {
    /// Human readable name.
    pub sample_name: String,
    /// Stable record identifier.
    pub sample_guid: Uuid,
    /// Record format version.
    pub version: String,
    /// What drives the annealing volume.
    pub compute_option: ComputeOption,
    /// Magnetic bead loading.
    pub mag_bead: Flag,
    /// Preparation scale.
    pub preparation_protocol: PreparationProtocol,
    /// Long-term storage of the complex.
    pub long_term_storage: Flag,
    /// Spike-in control.
    pub use_spike_in_control: Flag,
    /// Complex reuse across cycles.
    pub complex_reuse: Flag,
    /// Non-standard (low concentration) mode.
    pub low_concentrations_allowed: Flag,
    /// Legacy binding selector.
    pub binding_computation: BindingComputation,
    /// Sample volume going into annealing.
    pub sample_volume_to_use_in_annealing: Quantity,
    /// Cells the annealing reaction should serve.
    pub number_of_cells_to_use: Quantity,
    /// Starting sample concentration in ng/uL.
    pub starting_sample_concentration: Quantity,
    /// Custom non-standard annealing concentration.
    pub custom_non_standard_annealing_concentration: Quantity,
    /// Custom non-standard binding concentration.
    pub custom_non_standard_binding_concentration: Quantity,
    /// Cells requested from the binding complex.
    pub binding_complex_number_of_cells_requested: Quantity,
    /// Cells requested per titration point.
    pub loading_titration_number_of_cells_requested: Quantity,
    /// First titration plate concentration.
    pub titration_concentration1: Quantity,
    /// Second titration plate concentration.
    pub titration_concentration2: Quantity,
    /// Third titration plate concentration.
    pub titration_concentration3: Quantity,
    /// Fourth titration plate concentration.
    pub titration_concentration4: Quantity,
    /// Sample volume the customer has available.
    pub available_sample_volume: Quantity,
    /// Collection protocol without beads.
    pub collection_protocol: CollectionProtocol,
    /// Chemistry version key.
    pub chemistry: String,
    /// Cell version key.
    pub cell: String,
    /// Insert length in base pairs.
    pub annealed_base_pair_length: Quantity,
    /// Custom concentration on plate.
    pub custom_concentration_on_plate: Quantity,
    /// Concentration on plate selector.
    pub concentration_on_plate_option: Choice,
    /// Non-standard annealing concentration selector.
    pub non_standard_annealing_concentration_option: Choice,
    /// Spike-in ratio selector.
    pub spike_in_ratio_option: Choice,
    /// Custom spike-in ratio in percent.
    pub custom_spike_in_ratio_percent: Quantity,
    /// Custom polymerase to template ratio.
    pub custom_polymerase_template_ratio: Quantity,
    /// Polymerase to template ratio selector.
    pub polymerase_template_ratio_option: Choice,
    /// Cells the binding reaction should serve.
    pub number_of_cells_in_binding: Quantity,
    /// How much annealed sample goes into binding.
    pub binding_polymerase_option: BindingPolymeraseOption,
    /// Storage complex volume selector.
    pub storage_complex_option: Choice,
    /// Custom binding volume in the storage complex.
    pub custom_volume_of_binding_reaction_in_storage_complex: Quantity,
}

impl Default for InputRecord {
    fn default() -> Self {
        Self {
            sample_name: "Untitled".to_string(),
            sample_guid: Uuid::new_v4(),
            version: "0".to_string(),
            compute_option: ComputeOption::Volume,
            mag_bead: Flag::True,
            preparation_protocol: PreparationProtocol::Small,
            long_term_storage: Flag::False,
            use_spike_in_control: Flag::True,
            complex_reuse: Flag::False,
            low_concentrations_allowed: Flag::False,
            binding_computation: BindingComputation::Volume,
            sample_volume_to_use_in_annealing: Quantity::default(),
            number_of_cells_to_use: Quantity::default(),
            starting_sample_concentration: Quantity::default(),
            custom_non_standard_annealing_concentration: Quantity::default(),
            custom_non_standard_binding_concentration: Quantity::default(),
            binding_complex_number_of_cells_requested: Quantity::default(),
            loading_titration_number_of_cells_requested: Quantity::default(),
            titration_concentration1: Quantity::default(),
            titration_concentration2: Quantity::default(),
            titration_concentration3: Quantity::default(),
            titration_concentration4: Quantity::default(),
            available_sample_volume: Quantity::default(),
            collection_protocol: CollectionProtocol::Standard,
            chemistry: "VersionP4".to_string(),
            cell: "CellVersion3".to_string(),
            annealed_base_pair_length: Quantity::Number(10_000.0),
            custom_concentration_on_plate: Quantity::default(),
            concentration_on_plate_option: Choice::Default,
            non_standard_annealing_concentration_option: Choice::Default,
            spike_in_ratio_option: Choice::Default,
            custom_spike_in_ratio_percent: Quantity::from("0"),
            custom_polymerase_template_ratio: Quantity::from("0"),
            polymerase_template_ratio_option: Choice::Default,
            number_of_cells_in_binding: Quantity::default(),
            binding_polymerase_option: BindingPolymeraseOption::Volume,
            storage_complex_option: Choice::Default,
            custom_volume_of_binding_reaction_in_storage_complex: Quantity::default(),
        }
    }
}

impl InputRecord {
    /// Parses a persisted record; absent keys take their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self, PrepError> {
        from_json_slice(data)
    }

    /// Coerces the entered values into engine inputs.
    ///
    /// Unparseable numbers become `NaN` and flow through the calculation.
    pub fn to_inputs(&self) -> SampleInputs {
        SampleInputs {
            compute_option: self.compute_option,
            mag_bead: self.mag_bead.is_set(),
            preparation_protocol: self.preparation_protocol,
            long_term_storage: self.long_term_storage.is_set(),
            use_spike_in_control: self.use_spike_in_control.is_set(),
            complex_reuse: self.complex_reuse.is_set(),
            low_concentrations_allowed: self.low_concentrations_allowed.is_set(),
            binding_computation: self.binding_computation,
            sample_volume_to_use_in_annealing: self.sample_volume_to_use_in_annealing.as_float(),
            number_of_cells_to_use: self.number_of_cells_to_use.as_int(),
            starting_sample_concentration: self.starting_sample_concentration.as_float(),
            custom_non_standard_annealing_concentration: self
                .custom_non_standard_annealing_concentration
                .as_float(),
            custom_non_standard_binding_concentration: self
                .custom_non_standard_binding_concentration
                .as_float(),
            binding_complex_number_of_cells_requested: self
                .binding_complex_number_of_cells_requested
                .as_int(),
            loading_titration_number_of_cells_requested: self
                .loading_titration_number_of_cells_requested
                .as_int(),
            titration_concentrations: [
                self.titration_concentration1.as_float(),
                self.titration_concentration2.as_float(),
                self.titration_concentration3.as_float(),
                self.titration_concentration4.as_float(),
            ],
            available_sample_volume: self.available_sample_volume.as_float(),
            collection_protocol: self.collection_protocol,
            chemistry: self.chemistry.clone(),
            cell: self.cell.clone(),
            annealed_base_pair_length: self.annealed_base_pair_length.as_int(),
            custom_concentration_on_plate: self.custom_concentration_on_plate.as_float(),
            concentration_on_plate_option: self.concentration_on_plate_option,
            non_standard_annealing_concentration_option: self
                .non_standard_annealing_concentration_option,
            spike_in_ratio_option: self.spike_in_ratio_option,
            custom_spike_in_ratio_percent: self.custom_spike_in_ratio_percent.as_float(),
            custom_polymerase_template_ratio: self.custom_polymerase_template_ratio.as_float(),
            polymerase_template_ratio_option: self.polymerase_template_ratio_option,
            number_of_cells_in_binding: self.number_of_cells_in_binding.as_int(),
            binding_polymerase_option: self.binding_polymerase_option,
            storage_complex_option: self.storage_complex_option,
            custom_volume_of_binding_reaction_in_storage_complex: self
                .custom_volume_of_binding_reaction_in_storage_complex
                .as_float(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_follow_prefix_parsing() {
        assert_eq!(Quantity::from("12.5 uL").as_float(), 12.5);
        assert_eq!(Quantity::from("12.5").as_int(), 12.0);
        assert_eq!(Quantity::Number(7.9).as_int(), 7.0);
        assert_eq!(Quantity::Number(-7.9).as_int(), -7.0);
        assert!(Quantity::from("abc").as_float().is_nan());
        assert!(Quantity::from("").as_int().is_nan());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let record = InputRecord::from_json(br#"{"SampleName":"Lambda","StartingSampleConcentration":"150"}"#)
            .unwrap();
        assert_eq!(record.sample_name, "Lambda");
        assert_eq!(record.chemistry, "VersionP4");
        let inputs = record.to_inputs();
        assert_eq!(inputs.starting_sample_concentration, 150.0);
        assert_eq!(inputs.annealed_base_pair_length, 10_000.0);
        assert!(inputs.mag_bead);
        assert!(!inputs.complex_reuse);
    }

    #[test]
    fn new_records_get_distinct_identities() {
        let first = InputRecord::default();
        let second = InputRecord::default();
        assert_ne!(first.sample_guid, second.sample_guid);
        assert_eq!(first.version, "0");
    }
}
