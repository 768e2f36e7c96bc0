//! Compiled-in constant catalog.

use crate::bucket::{Bucket, Globals};
use crate::catalog::{BucketCatalog, Constants};
use crate::codes::{ErrorCode, ErrorMessage, ErrorRegistry};
use crate::options::ProtocolType;

const CELL: &str = "CellVersion3";

const CHEMISTRIES: [(&str, &str); 4] = [
    ("Version1", "V1"),
    ("Version2", "V2"),
    ("VersionXL", "XL"),
    ("VersionP4", "P4"),
];

const XL_WARNING: &str = "The XL1 binding kit has not been optimized for use without magnetic beads";

/// One insert size range: `(min, max, size, on chip small, on chip large)`.
type SizeRow = (f64, f64, f64, f64, f64);

const STANDARD_SIZES: [SizeRow; 6] = [
    (250.0, 750.0, 500.0, 0.1, 0.1),
    (750.0, 1500.0, 1000.0, 0.075, 0.075),
    (1500.0, 3500.0, 2000.0, 0.05, 0.05),
    (3500.0, 7500.0, 5000.0, 0.05, 0.04),
    (7500.0, 15000.0, 10000.0, 0.025, 0.025),
    (15000.0, 40000.0, 20000.0, 0.02, 0.02),
];

const MAGBEAD_SIZES: [SizeRow; 5] = [
    (750.0, 1500.0, 1000.0, 0.04, 0.04),
    (1500.0, 3500.0, 2000.0, 0.03, 0.03),
    (3500.0, 7500.0, 5000.0, 0.02, 0.02),
    (7500.0, 15000.0, 10000.0, 0.0125, 0.0125),
    (15000.0, 40000.0, 20000.0, 0.01, 0.01),
];

/// Plate geometry: `(per chip, dead, cells no reuse, cells reuse, volume no
/// reuse, volume reuse, cycle volume, cycle cells)`.
type PlateRow = (f64, f64, f64, f64, f64, f64, f64, f64);

const STANDARD_PLATE: PlateRow = (10.0, 5.0, 8.0, 16.0, 85.0, 90.0, 15.0, 3.0);
const MAGBEAD_PLATE: PlateRow = (9.0, 10.0, 8.0, 16.0, 82.0, 89.0, 14.0, 3.0);

pub(crate) fn constants() -> Constants {
    Constants {
        globals: globals(),
        errors: errors(),
        buckets: BucketCatalog::from_trusted(buckets()),
        error_bucket: Bucket::error_bucket(),
    }
}

fn globals() -> Globals {
    Globals {
        minimum_pipettable_volume: 1.0,
        annealing_primer_stock_concentration: 150_000.0,
        minimum_volume_of_default_binding_reaction: 10.0,
        spike_in_first_dilution_concentration_small_scale: 1.0,
        spike_in_first_dilution_concentration_large_scale: 5.0,
        storage_complex_concentration_small_scale: 3.0,
        storage_complex_concentration_large_scale: 3.0,
        minimum_volume_of_first_spike_in_dilution: 10.0,
        minimum_volume_of_polymerase_stock_in_dilution: 1.0,
        polymerase_stock_concentration: 2000.0,
        magnetic_bead_sluff_factor: 1.1,
        mag_bead_to_complex_ratio: 1.0,
        show_cell_option: false,
        show_chemistry_option: true,
        allow_non_standard_reverse_calculations: true,
    }
}

fn buckets() -> Vec<Bucket> {
    let mut buckets = Vec::new();
    for (chemistry, code) in CHEMISTRIES {
        for protocol in [ProtocolType::Standard, ProtocolType::Strobe, ProtocolType::MagBead] {
            let (sizes, plate): (&[SizeRow], PlateRow) = match protocol {
                ProtocolType::MagBead if chemistry == "Version1" => continue,
                ProtocolType::MagBead => (&MAGBEAD_SIZES, MAGBEAD_PLATE),
                _ => (&STANDARD_SIZES, STANDARD_PLATE),
            };
            let warning = (chemistry == "VersionXL" && protocol != ProtocolType::MagBead)
                .then(|| XL_WARNING.to_string());
            for row in sizes {
                buckets.push(bucket(protocol, chemistry, code, *row, plate, warning.clone()));
            }
        }
    }
    buckets
}

fn bucket(
    protocol: ProtocolType,
    chemistry: &str,
    code: &str,
    (min, max, size, on_chip_small, on_chip_large): SizeRow,
    (per_chip, dead, cells_no_reuse, cells_reuse, volume_no_reuse, volume_reuse, cycle_volume, cycle_cells): PlateRow,
    warning_message: Option<String>,
) -> Bucket {
    Bucket {
        protocol_type: protocol,
        chemistry: chemistry.to_string(),
        cell: CELL.to_string(),
        min_base_pair_length: min,
        max_base_pair_length: max,
        size,
        sample_concentration_on_chip_small_scale: on_chip_small,
        sample_concentration_on_chip_large_scale: on_chip_large,
        sample_concentration_in_annealing_small_scale: 10.0,
        sample_concentration_in_annealing_small_storage: 20.0,
        sample_concentration_in_annealing_large_scale: 50.0,
        ratio_of_binding_to_annealing_concentration: 0.6,
        sample_dilution_factor_on_instrument: 1.0,
        minimum_sample_concentration_small_scale: 15.0,
        minimum_sample_concentration_large_scale: 30.0,
        diluted_primer_concentration_small_scale: 2000.0,
        diluted_primer_concentration_large_scale: 20_000.0,
        default_primer_to_template_ratio_small_scale: 20.0,
        default_primer_to_template_ratio_large_scale: 20.0,
        minimum_volume_of_diluted_primer: 10.0,
        polymerase_template_ratio_small_scale: 10.0,
        polymerase_template_ratio_large_scale: 10.0,
        spike_in_stock_concentration: 10.0,
        spike_in_percent_of_template_concentration: 0.01,
        spike_in_concentration_in_dilution: 0.01,
        minimum_spike_in_dilution_volume: 10.0,
        volume_per_chip_no_reuse: per_chip,
        dead_volume_per_well: dead,
        max_number_of_cells_per_well_no_reuse: cells_no_reuse,
        max_number_of_cells_per_well_with_reuse: cells_reuse,
        max_volume_per_well_no_reuse: volume_no_reuse,
        max_volume_per_well_with_reuse: volume_reuse,
        volume_of_diluted_sample_per_reuse_cycle: cycle_volume,
        max_number_of_cells_per_reuse_cycle: cycle_cells,
        tube_name_spike_in_control: format!("DNA Control Complex {code}"),
        tube_name_polymerase: format!("DNA Polymerase {code}"),
        tube_name_binding_buffer: "Binding Buffer".to_string(),
        tube_name_dtt: "DTT".to_string(),
        tube_name_complex_storage_buffer: "Complex Storage Buffer".to_string(),
        tube_name_complex_dilution_buffer: "Complex Dilution Buffer".to_string(),
        tube_name_sequencing_primer: "Sequencing Primer".to_string(),
        tube_name_nucleotides: "dNTP".to_string(),
        spike_in_tube_label: format!("Control {code}"),
        polymerase_tube_label: format!("Polymerase {code}"),
        warning_message,
    }
}

fn errors() -> ErrorRegistry {
    use ErrorCode::*;

    [
        (
            InvalidInsertSizeMagBeadNew,
            ErrorMessage::new(
                "AnnealedBasePairLength",
                "Invalid insert size",
                "Magnetic bead loading requires an insert size of at least 1000 bp.",
            ),
        ),
        (
            InvalidInsertSizeMagBead,
            ErrorMessage::new(
                "AnnealedBasePairLength",
                "Invalid insert size",
                "Magnetic bead loading requires an insert size of at least 7500 bp.",
            ),
        ),
        (
            InvalidInsertSizeStandard,
            ErrorMessage::new(
                "AnnealedBasePairLength",
                "Invalid insert size",
                "The insert size must be between 250 bp and 40000 bp.",
            ),
        ),
        (BucketWarning, ErrorMessage::long_only("")),
        (
            DifficultPipetting,
            ErrorMessage::long_only("Warning: Pipetting some volumes will be difficult."),
        ),
        (
            SampleConcentrationLow,
            ErrorMessage::new(
                "StartingSampleConcentration",
                "Concentration low",
                "The sample concentration is below the minimum recommended for this protocol.",
            ),
        ),
        (
            NonStandardTitration,
            ErrorMessage::new(
                "ComputeOption",
                "Not supported",
                "Titrations cannot be computed for non-standard concentrations.",
            ),
        ),
        (
            NonStandardByCells,
            ErrorMessage::new(
                "ComputeOption",
                "Not supported",
                "Computing by number of SMRT Cells is not supported for non-standard concentrations.",
            ),
        ),
        (
            AnnealingConcentrationSuspect,
            ErrorMessage::long_only(
                "The final annealing concentration does not match the expected concentration.",
            ),
        ),
        (
            TooManyCellsInBinding,
            ErrorMessage::new(
                "NumberOfCellsInBinding",
                "Too many cells",
                "You won't have enough annealed sample for the number of SMRT Cells requested in the binding reaction.",
            ),
        ),
        (
            BindingVolumeLow,
            ErrorMessage::new(
                "SampleVolumeToUseInAnnealing",
                "Volume low",
                "The binding reaction is smaller than the minimum binding reaction volume.",
            ),
        ),
        (
            BindingConcentrationSuspect,
            ErrorMessage::long_only(
                "The final binding concentration does not match the expected concentration.",
            ),
        ),
        (
            NotEnoughCellsForBindingComplex,
            ErrorMessage::new(
                "BindingComplexNumberOfCellsRequested",
                "Not enough complex",
                "The binding reaction does not produce enough complex for the number of SMRT Cells requested.",
            ),
        ),
        (
            BindingConcentrationTooLowForOneChip,
            ErrorMessage::new(
                "SampleVolumeToUseInAnnealing",
                "Concentration low",
                "The binding concentration is too low to load a single SMRT Cell.",
            ),
        ),
        (
            BindingConcentrationTooLowForReverseCalculation,
            ErrorMessage::new(
                "NumberOfCellsToUse",
                "Concentration low",
                "The binding concentration is too low to load a single SMRT Cell at this concentration on plate.",
            ),
        ),
        (
            NonStandardLargeScale,
            ErrorMessage::new(
                "LowConcentrationsAllowed",
                "Not supported",
                "Non-standard concentrations are not supported for large scale preparations.",
            ),
        ),
        (
            NonStandardLargeScaleNew,
            ErrorMessage::new(
                "LowConcentrationsAllowed",
                "Not supported",
                "Non-standard concentrations are only available for small scale preparations.",
            ),
        ),
        (
            NonStandardSmallStorageNotSupported,
            ErrorMessage::new(
                "LongTermStorage",
                "Not supported",
                "Long term storage is not supported for non-standard concentrations.",
            ),
        ),
        (
            UntestedControlWithLongInsertSize,
            ErrorMessage::new(
                "UseSpikeInControl",
                "Untested",
                "The internal control has not been tested with inserts longer than 15000 bp.",
            ),
        ),
        (
            TitrationConcentrationTooHigh,
            ErrorMessage::new(
                "TitrationConcentration1",
                "Concentration high",
                "One or more titration concentrations is higher than the binding complex supports.",
            ),
        ),
        (
            TitrationConcentrationTooHighNonStandard,
            ErrorMessage::new(
                "TitrationConcentration1",
                "Concentration high",
                "One or more titration concentrations is higher than the non-standard binding complex supports.",
            ),
        ),
        (
            NotEnoughAvailableVolume,
            ErrorMessage::new(
                "AvailableSampleVolume",
                "Volume low",
                "The available sample volume does not cover the annealing reaction.",
            ),
        ),
        (
            ConcentrationOnPlateTooHighWithControl,
            ErrorMessage::new(
                "CustomConcentrationOnPlate",
                "Concentration high",
                "The concentration on plate is too high to fit the complex and control into the bead dilution.",
            ),
        ),
        (
            ConcentrationOnPlateTooHighWithoutControl,
            ErrorMessage::new(
                "CustomConcentrationOnPlate",
                "Concentration high",
                "The concentration on plate is too high to fit the complex into the bead dilution.",
            ),
        ),
        (
            General,
            ErrorMessage::long_only(
                "Sorry, an error has occurred. Please reload this page to continue.",
            ),
        ),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_consistent() {
        let constants = constants();
        constants.validate().unwrap();
        for code in ErrorCode::ALL {
            assert!(constants.errors.contains(code), "missing {code}");
        }
    }

    #[test]
    fn plate_geometry_fills_a_whole_well() {
        for (per_chip, dead, cells, _, volume, ..) in [STANDARD_PLATE, MAGBEAD_PLATE] {
            assert_eq!(per_chip * cells + dead, volume);
        }
    }
}
