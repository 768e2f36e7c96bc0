//! Typed inputs of one computation.

use prep_core::options::{
    BindingComputation, BindingPolymeraseOption, Choice, CollectionProtocol, ComputeOption,
    PreparationProtocol, ProtocolType,
};

/// Every user-settable quantity and option the engine reads.
///
/// Numbers may be `NaN` when the caller could not parse them; the engine
/// lets that propagate into the derived fields instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleInputs {
    /// What drives the annealing volume.
    pub compute_option: ComputeOption,
    /// Magnetic bead loading.
    pub mag_bead: bool,
    /// Preparation scale.
    pub preparation_protocol: PreparationProtocol,
    /// Long-term storage of the complex.
    pub long_term_storage: bool,
    /// Spike-in control.
    pub use_spike_in_control: bool,
    /// Complex reuse across cycles.
    pub complex_reuse: bool,
    /// Non-standard (low concentration) mode.
    pub low_concentrations_allowed: bool,
    /// Legacy selector, carried through unchanged.
    pub binding_computation: BindingComputation,
    /// Sample volume going into annealing in volume mode.
    pub sample_volume_to_use_in_annealing: f64,
    /// Cells the annealing reaction should serve in cells mode.
    pub number_of_cells_to_use: f64,
    /// Starting sample concentration in ng/uL.
    pub starting_sample_concentration: f64,
    /// Custom annealing concentration in non-standard mode.
    pub custom_non_standard_annealing_concentration: f64,
    /// Custom binding concentration in non-standard mode.
    pub custom_non_standard_binding_concentration: f64,
    /// Cells requested from the binding complex.
    pub binding_complex_number_of_cells_requested: f64,
    /// Cells requested per loading titration point.
    pub loading_titration_number_of_cells_requested: f64,
    /// Plate concentrations of the four titration points.
    pub titration_concentrations: [f64; 4],
    /// Sample volume the customer has available.
    pub available_sample_volume: f64,
    /// Collection protocol when beads are disabled.
    pub collection_protocol: CollectionProtocol,
    /// Chemistry version key.
    pub chemistry: String,
    /// Cell version key.
    pub cell: String,
    /// Insert length in base pairs.
    pub annealed_base_pair_length: f64,
    /// Custom concentration on plate.
    pub custom_concentration_on_plate: f64,
    /// Selects the concentration on plate.
    pub concentration_on_plate_option: Choice,
    /// Selects the non-standard annealing concentration.
    pub non_standard_annealing_concentration_option: Choice,
    /// Selects the spike-in ratio.
    pub spike_in_ratio_option: Choice,
    /// Custom spike-in ratio in percent.
    pub custom_spike_in_ratio_percent: f64,
    /// Custom polymerase to template ratio.
    pub custom_polymerase_template_ratio: f64,
    /// Selects the polymerase to template ratio.
    pub polymerase_template_ratio_option: Choice,
    /// Cells the binding reaction should serve in cells binding mode.
    pub number_of_cells_in_binding: f64,
    /// How much annealed sample goes into binding.
    pub binding_polymerase_option: BindingPolymeraseOption,
    /// Selects the binding volume put into storage complex.
    pub storage_complex_option: Choice,
    /// Custom binding volume put into storage complex.
    pub custom_volume_of_binding_reaction_in_storage_complex: f64,
}

impl Default for SampleInputs {
    fn default() -> Self {
        Self {
            compute_option: ComputeOption::Volume,
            mag_bead: true,
            preparation_protocol: PreparationProtocol::Small,
            long_term_storage: false,
            use_spike_in_control: true,
            complex_reuse: false,
            low_concentrations_allowed: false,
            binding_computation: BindingComputation::Volume,
            sample_volume_to_use_in_annealing: 0.0,
            number_of_cells_to_use: 0.0,
            starting_sample_concentration: 0.0,
            custom_non_standard_annealing_concentration: 0.0,
            custom_non_standard_binding_concentration: 0.0,
            binding_complex_number_of_cells_requested: 0.0,
            loading_titration_number_of_cells_requested: 0.0,
            titration_concentrations: [0.0; 4],
            available_sample_volume: 0.0,
            collection_protocol: CollectionProtocol::Standard,
            chemistry: "VersionP4".to_string(),
            cell: "CellVersion3".to_string(),
            annealed_base_pair_length: 10_000.0,
            custom_concentration_on_plate: 0.0,
            concentration_on_plate_option: Choice::Default,
            non_standard_annealing_concentration_option: Choice::Default,
            spike_in_ratio_option: Choice::Default,
            custom_spike_in_ratio_percent: 0.0,
            custom_polymerase_template_ratio: 0.0,
            polymerase_template_ratio_option: Choice::Default,
            number_of_cells_in_binding: 0.0,
            binding_polymerase_option: BindingPolymeraseOption::Volume,
            storage_complex_option: Choice::Default,
            custom_volume_of_binding_reaction_in_storage_complex: 0.0,
        }
    }
}

impl SampleInputs {
    /// Protocol family used for the bucket lookup.
    pub fn protocol_type(&self) -> ProtocolType {
        ProtocolType::effective(self.mag_bead, self.collection_protocol)
    }

    /// Returns `true` for small scale preparations.
    pub fn is_small_scale(&self) -> bool {
        self.preparation_protocol == PreparationProtocol::Small
    }

    /// Returns `true` when the first chemistry version is selected.
    pub fn is_chemistry_v1(&self) -> bool {
        self.chemistry == "Version1"
    }
}
