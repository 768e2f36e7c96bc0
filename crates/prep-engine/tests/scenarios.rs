use prep_core::catalog::Constants;
use prep_core::codes::ErrorCode;
use prep_core::options::{
    BindingPolymeraseOption, Choice, CollectionProtocol, ComputeOption, PreparationProtocol,
    RunMode,
};
use prep_engine::{Calculation, CalculationEngine, Field, MagBeadField, MagBeadVariant, SampleField, SampleInputs, TitrationField};

fn engine(mode: RunMode) -> CalculationEngine {
    CalculationEngine::new(Constants::builtin(), mode).unwrap()
}

fn strict_engine() -> CalculationEngine {
    let mut constants = Constants::builtin();
    constants.globals.allow_non_standard_reverse_calculations = false;
    CalculationEngine::new(constants, RunMode::Production).unwrap()
}

fn number(calculation: &Calculation, field: SampleField) -> f64 {
    calculation.fields.number(Field::Sample(field))
}

fn standard_small() -> SampleInputs {
    SampleInputs {
        mag_bead: false,
        collection_protocol: CollectionProtocol::Standard,
        use_spike_in_control: false,
        starting_sample_concentration: 150.0,
        sample_volume_to_use_in_annealing: 20.0,
        ..SampleInputs::default()
    }
}

const INVALID_INSERT_SIZE: [ErrorCode; 3] = [
    ErrorCode::InvalidInsertSizeMagBeadNew,
    ErrorCode::InvalidInsertSizeMagBead,
    ErrorCode::InvalidInsertSizeStandard,
];

#[test]
fn standard_small_scale_populates_annealing() {
    let calculation = engine(RunMode::Production).calculate(&standard_small()).unwrap();
    assert!(!calculation.fallback);
    for code in INVALID_INSERT_SIZE {
        assert!(!calculation.errors.contains(code));
    }

    // 150 ng/uL of a 10 kb insert is 23.08 nM, annealed at 10 nM.
    let starting = number(&calculation, SampleField::StartingSampleConcentrationInNanoMolar);
    assert!((starting - 1.5e8 / 6.5e6).abs() < 1e-9);
    let total = number(&calculation, SampleField::TotalVolumeOfAnnealingReaction);
    assert!((total - 20.0 * starting / 10.0).abs() < 1e-9);
    assert!((number(&calculation, SampleField::FinalAnnealedConcentration) - 10.0).abs() < 1e-9);
    assert!(number(&calculation, SampleField::VolumeOfWaterInAnnealingReaction) > 0.0);
    assert!((number(&calculation, SampleField::TotalVolumeOfBindingReaction) - total / 0.6).abs() < 1e-9);
    assert!((number(&calculation, SampleField::FinalBindingConcentration) - 6.0).abs() < 1e-9);
    assert!(!calculation.errors.contains(ErrorCode::AnnealingConcentrationSuspect));
    assert!(!calculation.errors.contains(ErrorCode::BindingConcentrationSuspect));
    assert_eq!(
        calculation.fields.text(Field::Sample(SampleField::ShortDescription)),
        Some("P4, Small")
    );
}

#[test]
fn diluted_primer_is_pipettable() {
    let calculation = engine(RunMode::Production).calculate(&standard_small()).unwrap();
    let aliquot = number(&calculation, SampleField::StockPrimerAliquot);
    let total = number(&calculation, SampleField::TotalVolumeOfDilutedPrimer);
    assert!(aliquot >= 1.0 - 1e-9);
    assert!(total >= 10.0);
    assert!((number(&calculation, SampleField::ElutionBuffer) + aliquot - total).abs() < 1e-9);
}

#[test]
fn short_mag_bead_insert_falls_back() {
    let inputs = SampleInputs {
        annealed_base_pair_length: 500.0,
        starting_sample_concentration: 150.0,
        sample_volume_to_use_in_annealing: 20.0,
        ..SampleInputs::default()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(calculation.fallback);
    assert_eq!(
        calculation.errors.codes().first(),
        Some(&ErrorCode::InvalidInsertSizeMagBeadNew)
    );
    assert!(number(&calculation, SampleField::BucketSize).is_nan());
    assert_eq!(
        calculation.fields.text(Field::Sample(SampleField::TubeNamePolymerase)),
        Some("?")
    );

    let reference = engine(RunMode::Reference).calculate(&inputs).unwrap();
    assert!(reference.errors.contains(ErrorCode::InvalidInsertSizeMagBead));
    assert!(!reference.errors.contains(ErrorCode::InvalidInsertSizeMagBeadNew));
}

#[test]
fn reference_mode_rejects_mid_sized_bead_inserts() {
    let inputs = SampleInputs {
        annealed_base_pair_length: 5000.0,
        ..SampleInputs::default()
    };
    let production = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(!production.fallback);
    assert!(!production.errors.contains(ErrorCode::InvalidInsertSizeMagBeadNew));

    let reference = engine(RunMode::Reference).calculate(&inputs).unwrap();
    assert!(!reference.fallback);
    assert!(reference.errors.contains(ErrorCode::InvalidInsertSizeMagBead));
}

#[test]
fn non_standard_large_scale_is_flagged() {
    let inputs = SampleInputs {
        preparation_protocol: PreparationProtocol::Large,
        low_concentrations_allowed: true,
        starting_sample_concentration: 150.0,
        sample_volume_to_use_in_annealing: 20.0,
        ..SampleInputs::default()
    };
    let production = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(production.errors.contains(ErrorCode::NonStandardLargeScaleNew));
    assert!(!production.errors.contains(ErrorCode::NonStandardLargeScale));

    let reference = engine(RunMode::Reference).calculate(&inputs).unwrap();
    assert!(reference.errors.contains(ErrorCode::NonStandardLargeScale));
}

#[test]
fn zero_titrations_produce_no_negative_volumes() {
    let inputs = SampleInputs {
        compute_option: ComputeOption::Titration,
        starting_sample_concentration: 150.0,
        ..SampleInputs::default()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(!calculation.errors.contains(ErrorCode::TitrationConcentrationTooHigh));

    for point in 1..=4u8 {
        let read = |field| calculation.fields.number(Field::Titration(point, field));
        assert_eq!(read(TitrationField::TitrationBindingComplex), 0.0);
        assert_eq!(read(TitrationField::TitrationSpikeInVolume), 0.0);
        for field in TitrationField::ALL.iter().filter(|field| field.is_exported()) {
            assert!(read(*field) >= 0.0, "{}{point}", field.name());
        }
        for field in MagBeadField::ALL.iter().filter(|field| field.is_exported()) {
            let value = calculation
                .fields
                .number(Field::MagBead(MagBeadVariant::Titration(point), *field));
            assert_eq!(value, 0.0, "Titration{point}{}", field.name());
        }
    }
    assert_eq!(
        number(&calculation, SampleField::TitrationTotal),
        calculation
            .fields
            .number(Field::Titration(1, TitrationField::TitrationTotal))
    );
    // Titration mode only prepares beads for the titration points.
    assert!(calculation
        .fields
        .get(Field::MagBead(MagBeadVariant::Standard, MagBeadField::BeadWashVolumeOfBeads))
        .is_none());
}

#[test]
fn spike_in_with_long_insert_is_untested() {
    let inputs = SampleInputs {
        annealed_base_pair_length: 20_000.0,
        starting_sample_concentration: 150.0,
        sample_volume_to_use_in_annealing: 20.0,
        ..SampleInputs::default()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(calculation
        .errors
        .contains(ErrorCode::UntestedControlWithLongInsertSize));
}

#[test]
fn low_starting_concentration_is_flagged() {
    let inputs = SampleInputs {
        starting_sample_concentration: 10.0,
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(calculation.errors.contains(ErrorCode::SampleConcentrationLow));

    let non_standard = SampleInputs {
        low_concentrations_allowed: true,
        ..inputs
    };
    let calculation = engine(RunMode::Production).calculate(&non_standard).unwrap();
    assert!(!calculation.errors.contains(ErrorCode::SampleConcentrationLow));
}

#[test]
fn xl_standard_bucket_carries_its_warning() {
    let inputs = SampleInputs {
        chemistry: "VersionXL".to_string(),
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    let warning = calculation.errors.get(ErrorCode::BucketWarning).unwrap();
    assert!(warning.coefficient.is_empty());
    assert!(warning.short_message.is_empty());
    assert!(!warning.long_message.is_empty());
}

#[test]
fn reference_mode_runs_every_sub_calculation() {
    let calculation = engine(RunMode::Reference).calculate(&standard_small()).unwrap();
    for variant in MagBeadVariant::all() {
        assert!(calculation
            .fields
            .get(Field::MagBead(variant, MagBeadField::MagBeadComplexDilutionVolumeTotal))
            .is_some());
    }
    assert!(calculation
        .fields
        .get(Field::Titration(4, TitrationField::TitrationDtt))
        .is_some());
}

#[test]
fn out_of_range_standard_insert_falls_back() {
    for length in [100.0, 50_000.0] {
        let inputs = SampleInputs {
            annealed_base_pair_length: length,
            ..standard_small()
        };
        let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
        assert!(calculation.fallback, "{length}");
        assert_eq!(
            calculation.errors.codes().first(),
            Some(&ErrorCode::InvalidInsertSizeStandard)
        );
    }
}

#[test]
fn small_annealing_leaves_binding_below_minimum() {
    // 2 uL anneals to 4.6 uL, which only supports a 7.7 uL binding reaction.
    let inputs = SampleInputs {
        sample_volume_to_use_in_annealing: 2.0,
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(calculation.errors.contains(ErrorCode::BindingVolumeLow));
    assert!(number(&calculation, SampleField::TotalVolumeOfBindingReaction).is_nan());
}

#[test]
fn binding_by_cells_cannot_exceed_the_annealing_reaction() {
    let inputs = SampleInputs {
        binding_polymerase_option: BindingPolymeraseOption::Cells,
        number_of_cells_in_binding: 10_000.0,
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(calculation.errors.contains(ErrorCode::TooManyCellsInBinding));
    let available = number(&calculation, SampleField::VolumeAvailableOfAnnealingReactionInBinding);
    assert!(available > number(&calculation, SampleField::TotalVolumeOfAnnealingReaction));
}

#[test]
fn binding_complex_serves_a_limited_number_of_cells() {
    let inputs = SampleInputs {
        binding_complex_number_of_cells_requested: 10_000.0,
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(calculation
        .errors
        .contains(ErrorCode::NotEnoughCellsForBindingComplex));
    let served = number(&calculation, SampleField::NumberOfCellsFromBinding);
    assert!(served > 0.0 && served < 10_000.0);

    let modest = SampleInputs {
        binding_complex_number_of_cells_requested: 8.0,
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&modest).unwrap();
    assert!(!calculation
        .errors
        .contains(ErrorCode::NotEnoughCellsForBindingComplex));
}

#[test]
fn plate_concentration_above_binding_cannot_fill_a_chip() {
    // 10 nM on plate from a 6 nM binding reaction overflows a single chip.
    let forward = SampleInputs {
        concentration_on_plate_option: Choice::Custom,
        custom_concentration_on_plate: 10.0,
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&forward).unwrap();
    assert!(calculation
        .errors
        .contains(ErrorCode::BindingConcentrationTooLowForOneChip));
    assert_eq!(number(&calculation, SampleField::NumberOfCellsFromBinding), 0.0);

    let reverse = SampleInputs {
        compute_option: ComputeOption::Cells,
        number_of_cells_to_use: 8.0,
        ..forward
    };
    let calculation = engine(RunMode::Production).calculate(&reverse).unwrap();
    assert!(calculation
        .errors
        .contains(ErrorCode::BindingConcentrationTooLowForReverseCalculation));
    assert!(!calculation
        .errors
        .contains(ErrorCode::BindingConcentrationTooLowForOneChip));
}

#[test]
fn non_standard_reverse_calculations_can_be_disabled() {
    let titration = SampleInputs {
        compute_option: ComputeOption::Titration,
        low_concentrations_allowed: true,
        titration_concentrations: [0.01, 0.02, 0.0, 0.0],
        available_sample_volume: 20.0,
        ..standard_small()
    };
    let calculation = strict_engine().calculate(&titration).unwrap();
    assert!(calculation.errors.contains(ErrorCode::NonStandardTitration));
    assert!(number(&calculation, SampleField::SampleVolumeInAnnealingReaction).is_nan());

    let by_cells = SampleInputs {
        compute_option: ComputeOption::Cells,
        number_of_cells_to_use: 8.0,
        ..titration
    };
    let calculation = strict_engine().calculate(&by_cells).unwrap();
    assert!(calculation.errors.contains(ErrorCode::NonStandardByCells));
    assert!(!calculation.errors.contains(ErrorCode::NonStandardTitration));

    let calculation = engine(RunMode::Production).calculate(&by_cells).unwrap();
    assert!(!calculation.errors.contains(ErrorCode::NonStandardByCells));
}

#[test]
fn non_standard_reverse_needs_available_volume() {
    let inputs = SampleInputs {
        compute_option: ComputeOption::Cells,
        low_concentrations_allowed: true,
        number_of_cells_to_use: 8.0,
        available_sample_volume: 0.0,
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(calculation.errors.contains(ErrorCode::NotEnoughAvailableVolume));
}

#[test]
fn non_standard_small_scale_storage_is_unsupported() {
    let inputs = SampleInputs {
        long_term_storage: true,
        low_concentrations_allowed: true,
        ..standard_small()
    };
    let calculation = engine(RunMode::Production).calculate(&inputs).unwrap();
    assert!(calculation
        .errors
        .contains(ErrorCode::NonStandardSmallStorageNotSupported));
    assert!(!calculation.errors.contains(ErrorCode::NonStandardLargeScaleNew));
}
