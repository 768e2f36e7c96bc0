use serde::{Deserialize, Serialize};

use crate::options::ProtocolType;

/// Immutable set of physical constants for one insert size range.
///
/// A bucket is keyed by protocol type, chemistry, cell version and a
/// half-open insert length range `[min_base_pair_length, max_base_pair_length)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bucket {
    /// Protocol family this bucket applies to.
    pub protocol_type: ProtocolType,
    /// Chemistry version label.
    pub chemistry: String,
    /// Cell version label.
    pub cell: String,
    /// Inclusive lower bound of the insert length range.
    pub min_base_pair_length: f64,
    /// Exclusive upper bound of the insert length range.
    pub max_base_pair_length: f64,
    /// Nominal insert size printed on tube labels.
    pub size: f64,

    /// Sample concentration on the chip for small scale preparations.
    pub sample_concentration_on_chip_small_scale: f64,
    /// Sample concentration on the chip for large scale preparations.
    pub sample_concentration_on_chip_large_scale: f64,
    /// Annealing concentration for small scale preparations.
    pub sample_concentration_in_annealing_small_scale: f64,
    /// Annealing concentration for small scale preparations with storage.
    pub sample_concentration_in_annealing_small_storage: f64,
    /// Annealing concentration for large scale preparations.
    pub sample_concentration_in_annealing_large_scale: f64,
    /// Ratio of binding concentration to annealing concentration.
    pub ratio_of_binding_to_annealing_concentration: f64,
    /// Dilution applied on the instrument.
    pub sample_dilution_factor_on_instrument: f64,
    /// Minimum starting concentration (nM) for small scale preparations.
    pub minimum_sample_concentration_small_scale: f64,
    /// Minimum starting concentration (nM) for large scale preparations.
    pub minimum_sample_concentration_large_scale: f64,

    /// Diluted primer concentration for small scale preparations.
    pub diluted_primer_concentration_small_scale: f64,
    /// Diluted primer concentration for large scale preparations.
    pub diluted_primer_concentration_large_scale: f64,
    /// Primer to template ratio for small scale preparations.
    pub default_primer_to_template_ratio_small_scale: f64,
    /// Primer to template ratio for large scale preparations.
    pub default_primer_to_template_ratio_large_scale: f64,
    /// Smallest diluted primer volume worth preparing.
    pub minimum_volume_of_diluted_primer: f64,
    /// Polymerase to template ratio for small scale preparations.
    pub polymerase_template_ratio_small_scale: f64,
    /// Polymerase to template ratio for large scale preparations.
    pub polymerase_template_ratio_large_scale: f64,

    /// Spike-in control stock concentration.
    pub spike_in_stock_concentration: f64,
    /// Spike-in control fraction of the template concentration.
    pub spike_in_percent_of_template_concentration: f64,
    /// Spike-in concentration in the spike-in dilution.
    pub spike_in_concentration_in_dilution: f64,
    /// Smallest spike-in dilution volume worth preparing.
    pub minimum_spike_in_dilution_volume: f64,

    /// Complex volume consumed per chip without reuse.
    pub volume_per_chip_no_reuse: f64,
    /// Dead volume left in every sample plate well.
    pub dead_volume_per_well: f64,
    /// Cells served by one well without reuse.
    pub max_number_of_cells_per_well_no_reuse: f64,
    /// Cells served by one well with complex reuse.
    pub max_number_of_cells_per_well_with_reuse: f64,
    /// Volume of a full well without reuse.
    pub max_volume_per_well_no_reuse: f64,
    /// Volume of a full well with complex reuse.
    pub max_volume_per_well_with_reuse: f64,
    /// Diluted sample volume consumed by one reuse cycle.
    pub volume_of_diluted_sample_per_reuse_cycle: f64,
    /// Cells served by one reuse cycle.
    pub max_number_of_cells_per_reuse_cycle: f64,

    /// Spike-in control tube name in the kit.
    pub tube_name_spike_in_control: String,
    /// Polymerase tube name in the kit.
    pub tube_name_polymerase: String,
    /// Binding buffer tube name in the kit.
    pub tube_name_binding_buffer: String,
    /// DTT tube name in the kit.
    pub tube_name_dtt: String,
    /// Complex storage buffer tube name in the kit.
    pub tube_name_complex_storage_buffer: String,
    /// Complex dilution buffer tube name in the kit.
    pub tube_name_complex_dilution_buffer: String,
    /// Sequencing primer tube name in the kit.
    pub tube_name_sequencing_primer: String,
    /// Nucleotide tube name in the kit.
    pub tube_name_nucleotides: String,
    /// Label printed on the spike-in tube.
    pub spike_in_tube_label: String,
    /// Label printed on the polymerase tube.
    pub polymerase_tube_label: String,
    /// Blanket warning attached to every computation using this bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
}

impl Bucket {
    /// Returns the placeholder bucket substituted when no real bucket matches.
    ///
    /// Every numeric constant is `NaN` and every label is `"?"`, so all
    /// dependent outputs render as unknown.
    pub fn error_bucket() -> Self {
        let unknown = || "?".to_string();
        Self {
            protocol_type: ProtocolType::Standard,
            chemistry: unknown(),
            cell: unknown(),
            min_base_pair_length: f64::NAN,
            max_base_pair_length: f64::NAN,
            size: f64::NAN,
            sample_concentration_on_chip_small_scale: f64::NAN,
            sample_concentration_on_chip_large_scale: f64::NAN,
            sample_concentration_in_annealing_small_scale: f64::NAN,
            sample_concentration_in_annealing_small_storage: f64::NAN,
            sample_concentration_in_annealing_large_scale: f64::NAN,
            ratio_of_binding_to_annealing_concentration: f64::NAN,
            sample_dilution_factor_on_instrument: f64::NAN,
            minimum_sample_concentration_small_scale: f64::NAN,
            minimum_sample_concentration_large_scale: f64::NAN,
            diluted_primer_concentration_small_scale: f64::NAN,
            diluted_primer_concentration_large_scale: f64::NAN,
            default_primer_to_template_ratio_small_scale: f64::NAN,
            default_primer_to_template_ratio_large_scale: f64::NAN,
            minimum_volume_of_diluted_primer: f64::NAN,
            polymerase_template_ratio_small_scale: f64::NAN,
            polymerase_template_ratio_large_scale: f64::NAN,
            spike_in_stock_concentration: f64::NAN,
            spike_in_percent_of_template_concentration: f64::NAN,
            spike_in_concentration_in_dilution: f64::NAN,
            minimum_spike_in_dilution_volume: f64::NAN,
            volume_per_chip_no_reuse: f64::NAN,
            dead_volume_per_well: f64::NAN,
            max_number_of_cells_per_well_no_reuse: f64::NAN,
            max_number_of_cells_per_well_with_reuse: f64::NAN,
            max_volume_per_well_no_reuse: f64::NAN,
            max_volume_per_well_with_reuse: f64::NAN,
            volume_of_diluted_sample_per_reuse_cycle: f64::NAN,
            max_number_of_cells_per_reuse_cycle: f64::NAN,
            tube_name_spike_in_control: unknown(),
            tube_name_polymerase: unknown(),
            tube_name_binding_buffer: unknown(),
            tube_name_dtt: unknown(),
            tube_name_complex_storage_buffer: unknown(),
            tube_name_complex_dilution_buffer: unknown(),
            tube_name_sequencing_primer: unknown(),
            tube_name_nucleotides: unknown(),
            spike_in_tube_label: unknown(),
            polymerase_tube_label: unknown(),
            warning_message: None,
        }
    }

    /// Returns `true` when `length` falls inside this bucket's range.
    pub fn covers(&self, length: f64) -> bool {
        self.min_base_pair_length <= length && length < self.max_base_pair_length
    }
}

/// Constants shared by every bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Globals {
    /// Smallest volume that can be pipetted reliably.
    pub minimum_pipettable_volume: f64,
    /// Stock concentration of the sequencing primer.
    pub annealing_primer_stock_concentration: f64,
    /// Smallest binding reaction in standard mode.
    pub minimum_volume_of_default_binding_reaction: f64,
    /// First spike-in dilution concentration for small scale.
    pub spike_in_first_dilution_concentration_small_scale: f64,
    /// First spike-in dilution concentration for large scale.
    pub spike_in_first_dilution_concentration_large_scale: f64,
    /// Storage complex concentration for small scale.
    pub storage_complex_concentration_small_scale: f64,
    /// Storage complex concentration for large scale.
    pub storage_complex_concentration_large_scale: f64,
    /// Smallest first spike-in dilution worth preparing.
    pub minimum_volume_of_first_spike_in_dilution: f64,
    /// Smallest polymerase stock volume in the polymerase dilution.
    pub minimum_volume_of_polymerase_stock_in_dilution: f64,
    /// Polymerase stock concentration.
    pub polymerase_stock_concentration: f64,
    /// Overage applied to the bead wash.
    pub magnetic_bead_sluff_factor: f64,
    /// Washed bead volume per unit of complex.
    pub mag_bead_to_complex_ratio: f64,
    /// Whether the cell selector is shown.
    #[serde(default)]
    pub show_cell_option: bool,
    /// Whether the chemistry selector is shown.
    #[serde(default)]
    pub show_chemistry_option: bool,
    /// Whether non-standard concentrations may be solved in reverse.
    #[serde(default)]
    pub allow_non_standard_reverse_calculations: bool,
}
