//! The primary sample calculation.
//!
//! A [`CalculationEngine`] owns the validated step graph and the two
//! sub-calculators. Each call to [`CalculationEngine::calculate`] resolves a
//! bucket, evaluates every step against a fresh record and collects the
//! raised domain conditions. Nothing carries over between calls.

use std::sync::Arc;

use prep_core::bucket::{Bucket, Globals};
use prep_core::catalog::Constants;
use prep_core::codes::{ErrorCode, ErrorMessage};
use prep_core::errors::PrepError;
use prep_core::numeric::{format_number, gaussian_round, js_max, trunc_int};
use prep_core::options::{BindingPolymeraseOption, Choice, ComputeOption, ProtocolType, RunMode};
use tracing::{debug, warn};

use crate::errors::ErrorMap;
use crate::fields::SampleField as S;
use crate::fields::{Field, MagBeadField, MagBeadVariant, TitrationField, TITRATION_POINTS};
use crate::helpers::Helpers;
use crate::inputs::SampleInputs;
use crate::magbead::{MagBeadCalc, MagBeadPoint};
use crate::plate::PlateLayout;
use crate::record::{Record, View};
use crate::schedule::{Schedule, Step, StepFn, StepOutput};
use crate::titration::{TitrationCalc, TitrationPoint};

/// Everything a step may consult besides the fields it declares.
#[derive(Debug)]
struct SampleContext {
    inputs: SampleInputs,
    bucket: Bucket,
    globals: Globals,
    mode: RunMode,
    plate: PlateLayout,
    titration: Arc<TitrationCalc>,
    mag_bead: Arc<MagBeadCalc>,
}

impl SampleContext {
    fn non_standard(&self) -> bool {
        self.inputs.low_concentrations_allowed
    }

    fn small(&self) -> bool {
        self.inputs.is_small_scale()
    }

    fn storage(&self) -> bool {
        self.inputs.long_term_storage
    }

    fn spike(&self) -> bool {
        self.inputs.use_spike_in_control
    }

    fn titration_mode(&self) -> bool {
        self.inputs.compute_option == ComputeOption::Titration
    }

    fn reference(&self) -> bool {
        self.mode.is_reference()
    }

    /// Shared formulas bound to this computation's spike-in settings.
    fn helpers(&self, view: &View<'_, Field>) -> Result<Helpers, PrepError> {
        Ok(Helpers {
            use_spike_in_control: self.spike(),
            chemistry_v1: self.inputs.is_chemistry_v1(),
            spike_in_percent_of_template: view.number(S::SpikeInPercentOfTemplateConcentration)?,
            spike_in_concentration_in_dilution: view
                .number(S::SpikeInConcentrationInSpikeInDilution)?,
        })
    }

    /// Binding volume bound for `cells` on the plate, scaled to annealing.
    fn annealing_for_cells(
        &self,
        cells: f64,
        concentration_in_binding: f64,
        view: &View<'_, Field>,
    ) -> Result<f64, PrepError> {
        let max_cells = view.number(S::MaxNumberOfCellsPerWellFromBucket)?;
        let max_volume = view.number(S::MaxVolumePerWellFromBucket)?;
        let minimum = view.number(S::MinimumVolumeOfBindingReaction)?;
        let concentration_on_plate = view.number(S::ConcentrationOnPlate)?;

        let full_wells = trunc_int(cells / max_cells);
        let partial = self.plate.volume_in_partial_wells(cells, full_wells);
        let on_plate = full_wells * max_volume + partial;
        let binding = js_max(
            minimum,
            on_plate * (concentration_on_plate / concentration_in_binding),
        );
        Ok(binding * 0.6)
    }

    /// Primer volume matching `sample_volume` in a non-standard annealing.
    fn non_standard_primer(&self, sample_volume: f64, view: &View<'_, Field>) -> Result<f64, PrepError> {
        let template = sample_volume * view.number(S::StartingSampleConcentrationInNanoMolar)?;
        let primer = view.number(S::PrimerToTemplateRatio)? * template;
        Ok(primer / view.number(S::DilutedPrimerConcentration)?)
    }
}

/// Fields read by [`SampleContext::helpers`].
const HELPER_READS: [S; 2] = [
    S::SpikeInPercentOfTemplateConcentration,
    S::SpikeInConcentrationInSpikeInDilution,
];

/// Result of one computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    /// Every field written, exported or not.
    pub fields: Record<Field>,
    /// Raised domain conditions in raise order.
    pub errors: ErrorMap,
    /// `true` when no bucket matched and the error bucket was used.
    pub fallback: bool,
}

impl Calculation {
    /// Written fields that belong in the output record, in output order.
    pub fn exported(&self) -> impl Iterator<Item = (Field, &crate::record::Value)> {
        Field::exported()
            .into_iter()
            .filter_map(|field| self.fields.get(field).map(|value| (field, value)))
    }
}

/// Derives every output field from one set of inputs.
#[derive(Debug)]
pub struct CalculationEngine {
    constants: Constants,
    mode: RunMode,
    schedule: Schedule<Field, SampleContext>,
    titration: Arc<TitrationCalc>,
    mag_bead: Arc<MagBeadCalc>,
}

impl CalculationEngine {
    /// Validates the step graphs and prepares an engine over `constants`.
    pub fn new(constants: Constants, mode: RunMode) -> Result<Self, PrepError> {
        let schedule = Schedule::build(steps())?;
        debug!(steps = schedule.len(), ?mode, "built calculation schedule");
        Ok(Self {
            constants,
            mode,
            schedule,
            titration: Arc::new(TitrationCalc::new()?),
            mag_bead: Arc::new(MagBeadCalc::new()?),
        })
    }

    /// Constant set the engine reads.
    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// Behaviour variant.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Step names in execution order.
    pub fn step_order(&self) -> Vec<&'static str> {
        self.schedule.order()
    }

    /// Returns `true` when some step writes `field`.
    pub fn produces(&self, field: Field) -> bool {
        self.schedule.produces(field)
    }

    /// Recomputes every derived field for `inputs`.
    ///
    /// Domain conditions are collected in [`Calculation::errors`]. An `Err`
    /// is only returned for defects of the calculator itself, such as a
    /// raised code missing from the message table.
    pub fn calculate(&self, inputs: &SampleInputs) -> Result<Calculation, PrepError> {
        let mut errors = ErrorMap::new();
        let registry = &self.constants.errors;
        let protocol = inputs.protocol_type();
        let length = inputs.annealed_base_pair_length;
        let reference = self.mode.is_reference();

        let found = self
            .constants
            .buckets
            .find(length, protocol, &inputs.chemistry, &inputs.cell);
        let (bucket, fallback) = match found {
            Some(bucket) => {
                debug!(
                    size = bucket.size,
                    protocol = protocol.as_str(),
                    chemistry = %bucket.chemistry,
                    "resolved bucket"
                );
                if let Some(message) = &bucket.warning_message {
                    errors.insert(ErrorCode::BucketWarning, ErrorMessage::new("", "", message.clone()));
                }
                if protocol == ProtocolType::MagBead {
                    if reference && length < 7500.0 {
                        errors.raise(ErrorCode::InvalidInsertSizeMagBead, registry)?;
                    } else if !reference && length < 1000.0 {
                        errors.raise(ErrorCode::InvalidInsertSizeMagBeadNew, registry)?;
                    }
                }
                (bucket.clone(), false)
            }
            None => {
                warn!(
                    length,
                    protocol = protocol.as_str(),
                    chemistry = %inputs.chemistry,
                    cell = %inputs.cell,
                    "no bucket covers the request, using the error bucket"
                );
                let code = match (protocol, reference) {
                    (ProtocolType::MagBead, false) => ErrorCode::InvalidInsertSizeMagBeadNew,
                    (ProtocolType::MagBead, true) => ErrorCode::InvalidInsertSizeMagBead,
                    _ => ErrorCode::InvalidInsertSizeStandard,
                };
                errors.raise(code, registry)?;
                (self.constants.error_bucket.clone(), true)
            }
        };

        let ctx = SampleContext {
            plate: PlateLayout::new(&bucket, inputs.complex_reuse),
            inputs: inputs.clone(),
            bucket,
            globals: self.constants.globals.clone(),
            mode: self.mode,
            titration: Arc::clone(&self.titration),
            mag_bead: Arc::clone(&self.mag_bead),
        };

        let mut fields = Record::new();
        for code in self.schedule.run(&ctx, &mut fields)? {
            errors.raise(code, registry)?;
        }

        debug!(
            fields = fields.len(),
            errors = errors.len(),
            fallback,
            "recomputed sample"
        );
        Ok(Calculation {
            fields,
            errors,
            fallback,
        })
    }
}

type Output = Result<StepOutput<Field>, PrepError>;

fn sample(fields: &[S]) -> Vec<Field> {
    fields.iter().map(|field| Field::Sample(*field)).collect()
}

fn step(
    name: &'static str,
    reads: &[S],
    writes: &[S],
    run: StepFn<Field, SampleContext>,
) -> Step<Field, SampleContext> {
    Step {
        name,
        reads: sample(reads),
        writes: sample(writes),
        run,
    }
}

/// Step that also builds [`Helpers`].
fn helper_step(
    name: &'static str,
    reads: &[S],
    writes: &[S],
    run: StepFn<Field, SampleContext>,
) -> Step<Field, SampleContext> {
    let mut step = step(name, reads, writes, run);
    step.reads.extend(sample(&HELPER_READS));
    step
}

fn titration_fields(field: TitrationField) -> impl Iterator<Item = Field> {
    (1..=TITRATION_POINTS).map(move |point| Field::Titration(point, field))
}

fn steps() -> Vec<Step<Field, SampleContext>> {
    let mut titration_step = helper_step(
        "titrations",
        &[S::SampleConcentrationInBinding, S::VolumePerChipNoReuse, S::DeadVolumePerWell],
        &[S::TitrationTotal],
        titrations,
    );
    for field in TitrationField::ALL.iter().filter(|field| field.is_exported()) {
        titration_step.writes.extend(titration_fields(*field));
    }

    let mut error_step = step(
        "prepare_errors",
        &[S::SampleVolumeInAnnealingReaction],
        &[],
        prepare_errors,
    );
    error_step
        .reads
        .extend(titration_fields(TitrationField::TitrationComplexDilutionBuffer));

    let mut mag_bead_step = step(
        "mag_bead",
        &[
            S::ConcentrationOnPlate,
            S::TotalComplexDilutionCells,
            S::FinalBindingConcentration,
            S::FinalStorageConcentration,
            S::SpikeInPercentOfTemplateConcentration,
        ],
        &[],
        mag_bead,
    );
    for variant in MagBeadVariant::all() {
        mag_bead_step.writes.extend(
            MagBeadField::ALL
                .iter()
                .filter(|field| field.is_exported())
                .map(|field| Field::MagBead(variant, *field)),
        );
    }

    vec![
        step(
            "bucket_constants",
            &[],
            &[
                S::SpikeInStockConcentration,
                S::MaxNumberOfCellsPerWellFromBucket,
                S::MaxVolumePerWellFromBucket,
                S::SampleConcentrationOnCell,
                S::SampleConcentrationInAnnealingReaction,
                S::DilutedPrimerConcentration,
                S::DefaultPolymeraseTemplateRatio,
                S::MinimumSampleConcentration,
                S::DefaultSpikeInRatioToTemplate,
                S::BucketSize,
                S::VolumePerChipNoReuse,
                S::PrimerToTemplateRatio,
                S::StartingSequencingPrimerBufferConcentration,
                S::MinimumVolumeOfDilutedPrimer,
                S::DeadVolumePerWell,
                S::SpikeInFirstDilutionConcentration,
                S::StorageComplexConcentration,
                S::PolymeraseStockConcentration,
                S::SpikeInConcentrationInSpikeInDilution,
                S::MinimumVolumeOfBindingReaction,
            ],
            bucket_constants,
        ),
        step(
            "default_spike_in_percent",
            &[S::DefaultSpikeInRatioToTemplate],
            &[S::DefaultSpikeInRatioToTemplatePercent],
            default_spike_in_percent,
        ),
        step(
            "tube_labels",
            &[S::BucketSize],
            &[
                S::ControlTubeNameInKit,
                S::TubeNameSpikeInControl,
                S::TubeNamePolymerase,
                S::TubeNameBindingBuffer,
                S::TubeNameDtt,
                S::TubeNameComplexStorageBuffer,
                S::TubeNameComplexDilutionBuffer,
                S::TubeNameSequencingPrimer,
                S::TubeNameNucleotides,
                S::SpikeInTubeLabel,
                S::PolymeraseTubeLabel,
                S::SpikeInTubeInsertSize,
                S::PolymeraseTubeInsertSize,
                S::BindingComplexBufferName,
                S::ComplexDilutionBufferName,
                S::ShortDescription,
            ],
            tube_labels,
        ),
        step(
            "plate_wells",
            &[],
            &[
                S::VolumeFromFullWells,
                S::NumberOfCellsFromFullWells,
                S::VolumeFromPartialWells,
                S::NumberOfFullWells,
                S::NumberOfCellsFromPartialWells,
            ],
            plate_wells,
        ),
        step(
            "partial_wells",
            &[
                S::NumberOfCellsFromPartialWells,
                S::NumberOfCellsFromFullWells,
                S::VolumeFromFullWells,
                S::VolumeFromPartialWells,
            ],
            &[
                S::NumberOfPartialWells,
                S::TotalComplexDilutionCells,
                S::TotalComplexDilutionVolume,
            ],
            partial_wells,
        ),
        step(
            "well_capacity",
            &[
                S::NumberOfFullWells,
                S::MaxVolumePerWellFromBucket,
                S::MaxNumberOfCellsPerWellFromBucket,
            ],
            &[S::MaxVolumePerWell, S::MaxNumberOfCellsPerWell],
            well_capacity,
        ),
        step(
            "starting_concentration",
            &[S::MinimumSampleConcentration],
            &[S::StartingSampleConcentrationInNanoMolar],
            starting_concentration,
        ),
        step(
            "default_concentration_on_plate",
            &[S::SampleConcentrationOnCell],
            &[S::DefaultConcentrationOnPlate],
            default_concentration_on_plate,
        ),
        step(
            "concentration_on_plate",
            &[S::DefaultConcentrationOnPlate],
            &[S::ConcentrationOnPlate],
            concentration_on_plate,
        ),
        step(
            "template_ratios",
            &[S::DefaultSpikeInRatioToTemplate, S::DefaultPolymeraseTemplateRatio],
            &[S::SpikeInPercentOfTemplateConcentration, S::PolymeraseTemplateRatio],
            template_ratios,
        ),
        step(
            "max_available_concentration",
            &[
                S::StartingSampleConcentrationInNanoMolar,
                S::PrimerToTemplateRatio,
                S::DilutedPrimerConcentration,
            ],
            &[S::MaxAvailableAnnealingConcentration],
            max_available_concentration,
        ),
        step(
            "non_standard_concentration",
            &[S::MaxAvailableAnnealingConcentration],
            &[
                S::DefaultNonStandardAnnealingConcentration,
                S::NonStandardAnnealingConcentration,
            ],
            non_standard_concentration,
        ),
        step(
            "binding_concentrations",
            &[
                S::NonStandardAnnealingConcentration,
                S::SampleConcentrationInAnnealingReaction,
            ],
            &[
                S::SampleConcentrationInBinding,
                S::MaxAvailableAnnealingConcentrationInBinding,
                S::FinalAnnealedConcentrationNonStandard,
            ],
            binding_concentrations,
        ),
        step(
            "annealing_from_desired_cells",
            &[
                S::MaxNumberOfCellsPerWellFromBucket,
                S::MaxVolumePerWellFromBucket,
                S::MinimumVolumeOfBindingReaction,
                S::ConcentrationOnPlate,
                S::SampleConcentrationInBinding,
            ],
            &[S::VolumeOfAnnealingReactionInBindingFromDesiredCells],
            annealing_from_desired_cells,
        ),
        step(
            "sample_volume_in_annealing",
            &[
                S::SampleConcentrationInAnnealingReaction,
                S::SampleConcentrationInBinding,
                S::NonStandardAnnealingConcentration,
                S::MaxAvailableAnnealingConcentrationInBinding,
                S::MaxNumberOfCellsPerWellFromBucket,
                S::MaxVolumePerWellFromBucket,
                S::MinimumVolumeOfBindingReaction,
                S::ConcentrationOnPlate,
                S::StartingSampleConcentrationInNanoMolar,
                S::VolumePerChipNoReuse,
                S::DeadVolumePerWell,
            ],
            &[S::SampleVolumeInAnnealingReaction],
            sample_volume_in_annealing,
        ),
        step(
            "non_standard_annealing",
            &[
                S::SampleVolumeInAnnealingReaction,
                S::StartingSampleConcentrationInNanoMolar,
                S::PrimerToTemplateRatio,
                S::DilutedPrimerConcentration,
            ],
            &[
                S::PrimerVolumeInAnnealingReactionNonStandard,
                S::TotalVolumeOfAnnealingReactionNonStandard,
            ],
            non_standard_annealing,
        ),
        step(
            "total_annealing",
            &[
                S::TotalVolumeOfAnnealingReactionNonStandard,
                S::SampleVolumeInAnnealingReaction,
                S::StartingSampleConcentrationInNanoMolar,
                S::SampleConcentrationInAnnealingReaction,
            ],
            &[S::TotalVolumeOfAnnealingReaction],
            total_annealing,
        ),
        step(
            "primer_in_annealing",
            &[
                S::PrimerVolumeInAnnealingReactionNonStandard,
                S::TotalVolumeOfAnnealingReaction,
                S::PrimerToTemplateRatio,
                S::SampleConcentrationInAnnealingReaction,
                S::DilutedPrimerConcentration,
            ],
            &[S::PrimerVolumeInAnnealingReaction],
            primer_in_annealing,
        ),
        step(
            "annealing_components",
            &[
                S::TotalVolumeOfAnnealingReaction,
                S::PrimerVolumeInAnnealingReaction,
                S::SampleVolumeInAnnealingReaction,
            ],
            &[S::VolumeOfPbInAnnealingReaction, S::VolumeOfWaterInAnnealingReaction],
            annealing_components,
        ),
        step(
            "final_annealed_concentration",
            &[
                S::FinalAnnealedConcentrationNonStandard,
                S::SampleVolumeInAnnealingReaction,
                S::StartingSampleConcentrationInNanoMolar,
                S::TotalVolumeOfAnnealingReaction,
                S::SampleConcentrationInAnnealingReaction,
            ],
            &[S::FinalAnnealedConcentration],
            final_annealed_concentration,
        ),
        step(
            "diluted_primer",
            &[
                S::PrimerVolumeInAnnealingReaction,
                S::DilutedPrimerConcentration,
                S::StartingSequencingPrimerBufferConcentration,
                S::MinimumVolumeOfDilutedPrimer,
            ],
            &[S::TotalVolumeOfDilutedPrimer, S::StockPrimerAliquot, S::ElutionBuffer],
            diluted_primer,
        ),
        step(
            "spike_in_dilution_concentrations",
            &[
                S::SpikeInPercentOfTemplateConcentration,
                S::SampleConcentrationInBinding,
                S::PolymeraseTemplateRatio,
            ],
            &[S::SpikeInSecondDilutionConcentration, S::PolymeraseDilutionConcentration],
            spike_in_dilution_concentrations,
        ),
        step(
            "available_annealing_in_binding",
            &[
                S::TotalVolumeOfAnnealingReaction,
                S::VolumeOfAnnealingReactionInBindingFromDesiredCells,
            ],
            &[S::VolumeAvailableOfAnnealingReactionInBinding],
            available_annealing_in_binding,
        ),
        step(
            "total_binding",
            &[
                S::VolumeAvailableOfAnnealingReactionInBinding,
                S::MinimumVolumeOfBindingReaction,
            ],
            &[S::TotalVolumeOfBindingReaction],
            total_binding,
        ),
        step(
            "binding_components",
            &[
                S::TotalVolumeOfBindingReaction,
                S::VolumeAvailableOfAnnealingReactionInBinding,
            ],
            &[
                S::VolumeOfSpikeInDilutionInBinding,
                S::VolumeOfAnnealingReactionInBinding,
                S::VolumeOfAnalogsInBinding,
                S::VolumeOfPolymeraseDilutionInBinding,
                S::VolumeOfDttInBinding,
                S::BindingBufferInBinding,
                S::DefaultVolumeOfBindingReactionInStorageComplex,
            ],
            binding_components,
        ),
        step(
            "final_binding_concentration",
            &[
                S::FinalAnnealedConcentration,
                S::VolumeAvailableOfAnnealingReactionInBinding,
                S::TotalVolumeOfBindingReaction,
            ],
            &[S::FinalBindingConcentration],
            final_binding_concentration,
        ),
        helper_step(
            "cells_from_binding",
            &[
                S::TotalVolumeOfBindingReaction,
                S::TotalVolumeOfAnnealingReaction,
                S::FinalBindingConcentration,
                S::ConcentrationOnPlate,
                S::TotalComplexDilutionCells,
                S::MaxVolumePerWellFromBucket,
                S::MaxNumberOfCellsPerWellFromBucket,
            ],
            &[S::NumberOfCellsFromBinding, S::MaxNumberOfCellsFromBinding],
            cells_from_binding,
        ),
        step(
            "spike_in_dilutions",
            &[
                S::SpikeInSecondDilutionConcentration,
                S::VolumeOfSpikeInDilutionInBinding,
                S::SpikeInFirstDilutionConcentration,
                S::SpikeInStockConcentration,
            ],
            &[
                S::DilutedSpikeInVolumeInSecondDilution,
                S::TotalVolumeOfSecondSpikeInDilution,
                S::BindingBufferInSecondDilution,
                S::TotalVolumeOfFirstSpikeInDilution,
                S::SpikeInStockVolumeInFirstDilution,
                S::BindingBufferInFirstDilution,
            ],
            spike_in_dilutions,
        ),
        step(
            "polymerase_dilution",
            &[
                S::PolymeraseDilutionConcentration,
                S::VolumeOfPolymeraseDilutionInBinding,
                S::PolymeraseStockConcentration,
            ],
            &[
                S::PolymeraseStockVolumeInDilution,
                S::TotalVolumeOfPolymeraseDilution,
                S::BindingBufferInPolymeraseDilution,
            ],
            polymerase_dilution,
        ),
        helper_step(
            "spike_in_control",
            &[S::ConcentrationOnPlate, S::TotalComplexDilutionVolume],
            &[
                S::SpikeInControlVolumeInDilution,
                S::SpikeInDilutionVolume,
                S::SpikeInControlContribution,
                S::DttVolumeInSpikeInDilution,
                S::ComplexDilutionBufferVolumeInSpikeInDilution,
                S::VolumeOfSpikeInDilutionInComplexDilution,
            ],
            spike_in_control,
        ),
        helper_step(
            "complex_dilution",
            &[
                S::ConcentrationOnPlate,
                S::TotalComplexDilutionVolume,
                S::StorageComplexConcentration,
                S::FinalBindingConcentration,
                S::SpikeInControlVolumeInDilution,
            ],
            &[
                S::VolumeOfBindingReactionInComplexDilution,
                S::VolumeOfComplexDilutionBufferInComplexDilution,
                S::VolumeOfDttInComplexDilution,
            ],
            complex_dilution,
        ),
        step(
            "storage_complex",
            &[
                S::DefaultVolumeOfBindingReactionInStorageComplex,
                S::SampleConcentrationInBinding,
                S::StorageComplexConcentration,
            ],
            &[
                S::VolumeOfBindingReactionInStorageComplex,
                S::TotalVolumeOfStorageComplex,
                S::VolumeOfDttInStorageComplex,
                S::VolumeOfComplexDilutionBufferInStorageComplex,
                S::FinalStorageConcentration,
            ],
            storage_complex,
        ),
        titration_step,
        error_step,
        mag_bead_step,
    ]
}

fn bucket_constants(ctx: &SampleContext, _: &View<'_, Field>) -> Output {
    let bucket = &ctx.bucket;
    let globals = &ctx.globals;
    let small = ctx.small();
    let (max_cells, max_volume) = if ctx.inputs.complex_reuse {
        (
            bucket.max_number_of_cells_per_well_with_reuse,
            bucket.max_volume_per_well_with_reuse,
        )
    } else {
        (
            bucket.max_number_of_cells_per_well_no_reuse,
            bucket.max_volume_per_well_no_reuse,
        )
    };
    let pick = |small_value: f64, large_value: f64| if small { small_value } else { large_value };

    let annealing = if !small {
        bucket.sample_concentration_in_annealing_large_scale
    } else if ctx.storage() {
        bucket.sample_concentration_in_annealing_small_storage
    } else {
        bucket.sample_concentration_in_annealing_small_scale
    };
    let diluted_primer = if small && !ctx.storage() {
        bucket.diluted_primer_concentration_small_scale
    } else {
        bucket.diluted_primer_concentration_large_scale
    };
    let minimum_binding = if ctx.non_standard() {
        0.0
    } else {
        globals.minimum_volume_of_default_binding_reaction
    };

    Ok(StepOutput::new()
        .set(S::SpikeInStockConcentration, bucket.spike_in_stock_concentration)
        .set(S::MaxNumberOfCellsPerWellFromBucket, trunc_int(max_cells))
        .set(S::MaxVolumePerWellFromBucket, max_volume)
        .set(
            S::SampleConcentrationOnCell,
            pick(
                bucket.sample_concentration_on_chip_small_scale,
                bucket.sample_concentration_on_chip_large_scale,
            ),
        )
        .set(S::SampleConcentrationInAnnealingReaction, annealing)
        .set(S::DilutedPrimerConcentration, diluted_primer)
        .set(
            S::DefaultPolymeraseTemplateRatio,
            pick(
                bucket.polymerase_template_ratio_small_scale,
                bucket.polymerase_template_ratio_large_scale,
            ),
        )
        .set(
            S::MinimumSampleConcentration,
            pick(
                bucket.minimum_sample_concentration_small_scale,
                bucket.minimum_sample_concentration_large_scale,
            ),
        )
        .set(
            S::DefaultSpikeInRatioToTemplate,
            bucket.spike_in_percent_of_template_concentration,
        )
        .set(S::BucketSize, bucket.size)
        .set(S::VolumePerChipNoReuse, bucket.volume_per_chip_no_reuse)
        .set(
            S::PrimerToTemplateRatio,
            pick(
                bucket.default_primer_to_template_ratio_small_scale,
                bucket.default_primer_to_template_ratio_large_scale,
            ),
        )
        .set(
            S::StartingSequencingPrimerBufferConcentration,
            globals.annealing_primer_stock_concentration,
        )
        .set(S::MinimumVolumeOfDilutedPrimer, bucket.minimum_volume_of_diluted_primer)
        .set(S::DeadVolumePerWell, bucket.dead_volume_per_well)
        .set(
            S::SpikeInFirstDilutionConcentration,
            pick(
                globals.spike_in_first_dilution_concentration_small_scale,
                globals.spike_in_first_dilution_concentration_large_scale,
            ),
        )
        .set(
            S::StorageComplexConcentration,
            pick(
                globals.storage_complex_concentration_small_scale,
                globals.storage_complex_concentration_large_scale,
            ),
        )
        .set(S::PolymeraseStockConcentration, globals.polymerase_stock_concentration)
        .set(
            S::SpikeInConcentrationInSpikeInDilution,
            bucket.spike_in_concentration_in_dilution,
        )
        .set(S::MinimumVolumeOfBindingReaction, minimum_binding))
}

fn default_spike_in_percent(_: &SampleContext, view: &View<'_, Field>) -> Output {
    Ok(StepOutput::single(
        S::DefaultSpikeInRatioToTemplatePercent,
        view.number(S::DefaultSpikeInRatioToTemplate)? * 100.0,
    ))
}

fn insert_size_label(size: f64) -> String {
    let size = if size.is_nan() {
        "0".to_string()
    } else {
        format_number(size)
    };
    format!("{size}bp")
}

fn short_description(inputs: &SampleInputs) -> String {
    let mut details = String::new();
    if inputs.compute_option == ComputeOption::Titration {
        details.push_str("Titration, ");
    }
    if inputs.mag_bead {
        details.push_str("Mag bead, ");
    }
    let code = inputs.chemistry.get(7..).unwrap_or("");
    if inputs.chemistry.len() == 8 {
        details.push('C');
    }
    details.push_str(code);
    details.push_str(", ");
    details.push_str(if inputs.is_small_scale() { "Small" } else { "Large" });
    if inputs.long_term_storage || !inputs.is_small_scale() {
        details.push_str(", Storage");
    }
    if inputs.low_concentrations_allowed {
        details.push_str(", Non-standard");
    }
    if inputs.use_spike_in_control {
        details.push_str(", Control");
    }
    if inputs.complex_reuse {
        details.push_str(", Reuse");
    }
    details
}

fn tube_labels(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let bucket = &ctx.bucket;
    let control_tube = match ctx.inputs.protocol_type() {
        ProtocolType::Strobe => "Strobe DNA Control Tube",
        ProtocolType::Standard | ProtocolType::MagBead => "DNA Control Tube",
    };
    let spike_in_label = if ctx.spike() {
        bucket.spike_in_tube_label.clone()
    } else {
        "N/A".to_string()
    };
    let insert_size = insert_size_label(view.number(S::BucketSize)?);
    let buffer_name = if ctx.small() {
        "Binding Complex"
    } else {
        "Long-Term Storage Complex"
    };

    Ok(StepOutput::new()
        .set(S::ControlTubeNameInKit, control_tube)
        .set(S::TubeNameSpikeInControl, bucket.tube_name_spike_in_control.clone())
        .set(S::TubeNamePolymerase, bucket.tube_name_polymerase.clone())
        .set(S::TubeNameBindingBuffer, bucket.tube_name_binding_buffer.clone())
        .set(S::TubeNameDtt, bucket.tube_name_dtt.clone())
        .set(
            S::TubeNameComplexStorageBuffer,
            bucket.tube_name_complex_storage_buffer.clone(),
        )
        .set(
            S::TubeNameComplexDilutionBuffer,
            bucket.tube_name_complex_dilution_buffer.clone(),
        )
        .set(S::TubeNameSequencingPrimer, bucket.tube_name_sequencing_primer.clone())
        .set(S::TubeNameNucleotides, bucket.tube_name_nucleotides.clone())
        .set(S::SpikeInTubeLabel, spike_in_label)
        .set(S::PolymeraseTubeLabel, bucket.polymerase_tube_label.clone())
        .set(S::SpikeInTubeInsertSize, insert_size.clone())
        .set(S::PolymeraseTubeInsertSize, insert_size)
        .set(S::BindingComplexBufferName, buffer_name)
        .set(S::ComplexDilutionBufferName, "Complex Dilution Buffer")
        .set(S::ShortDescription, short_description(&ctx.inputs)))
}

fn plate_wells(ctx: &SampleContext, _: &View<'_, Field>) -> Output {
    let plate = &ctx.plate;
    let cells = ctx.inputs.binding_complex_number_of_cells_requested;
    Ok(StepOutput::new()
        .set(S::VolumeFromFullWells, plate.volume_from_full_wells(cells))
        .set(
            S::NumberOfCellsFromFullWells,
            plate.number_of_cells_from_full_wells(cells),
        )
        .set(S::VolumeFromPartialWells, plate.volume_from_partial_wells(cells))
        .set(S::NumberOfFullWells, trunc_int(plate.number_of_full_wells(cells)))
        .set(
            S::NumberOfCellsFromPartialWells,
            trunc_int(plate.number_of_cells_from_partial_wells(cells)),
        ))
}

fn partial_wells(_: &SampleContext, view: &View<'_, Field>) -> Output {
    let partial_cells = view.number(S::NumberOfCellsFromPartialWells)?;
    let full_cells = view.number(S::NumberOfCellsFromFullWells)?;
    let partial_wells = if partial_cells > 0.0 { 1.0 } else { 0.0 };
    Ok(StepOutput::new()
        .set(S::NumberOfPartialWells, partial_wells)
        .set(S::TotalComplexDilutionCells, partial_cells + full_cells)
        .set(
            S::TotalComplexDilutionVolume,
            view.number(S::VolumeFromFullWells)? + view.number(S::VolumeFromPartialWells)?,
        ))
}

fn well_capacity(_: &SampleContext, view: &View<'_, Field>) -> Output {
    let empty = view.number(S::NumberOfFullWells)? == 0.0;
    let (volume, cells) = if empty {
        (0.0, 0.0)
    } else {
        (
            view.number(S::MaxVolumePerWellFromBucket)?,
            view.number(S::MaxNumberOfCellsPerWellFromBucket)?,
        )
    };
    Ok(StepOutput::new()
        .set(S::MaxVolumePerWell, volume)
        .set(S::MaxNumberOfCellsPerWell, cells))
}

fn starting_concentration(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let inputs = &ctx.inputs;
    // ng/uL to nM for double stranded DNA at 650 g/mol per base pair.
    let nano_molar = 1e9 * (inputs.starting_sample_concentration / 1000.0)
        / (inputs.annealed_base_pair_length * 650.0);
    let checked = !ctx.small() || !ctx.non_standard();
    Ok(StepOutput::single(S::StartingSampleConcentrationInNanoMolar, nano_molar).raise_if(
        checked && nano_molar < view.number(S::MinimumSampleConcentration)?,
        ErrorCode::SampleConcentrationLow,
    ))
}

fn default_concentration_on_plate(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    Ok(StepOutput::single(
        S::DefaultConcentrationOnPlate,
        view.number(S::SampleConcentrationOnCell)? / ctx.bucket.sample_dilution_factor_on_instrument,
    ))
}

fn concentration_on_plate(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let value = match ctx.inputs.concentration_on_plate_option {
        Choice::Default => view.number(S::DefaultConcentrationOnPlate)?,
        Choice::Custom => ctx.inputs.custom_concentration_on_plate,
    };
    Ok(StepOutput::single(S::ConcentrationOnPlate, value))
}

fn template_ratios(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let inputs = &ctx.inputs;
    let spike_in = match inputs.spike_in_ratio_option {
        Choice::Default => view.number(S::DefaultSpikeInRatioToTemplate)?,
        Choice::Custom => inputs.custom_spike_in_ratio_percent / 100.0,
    };
    let polymerase = match inputs.polymerase_template_ratio_option {
        Choice::Default => view.number(S::DefaultPolymeraseTemplateRatio)?,
        Choice::Custom => inputs.custom_polymerase_template_ratio,
    };
    Ok(StepOutput::new()
        .set(S::SpikeInPercentOfTemplateConcentration, spike_in)
        .set(S::PolymeraseTemplateRatio, polymerase))
}

fn max_available_concentration(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let inputs = &ctx.inputs;
    let available = if inputs.compute_option == ComputeOption::Volume {
        inputs.sample_volume_to_use_in_annealing
    } else {
        inputs.available_sample_volume
    };
    let primer = ctx.non_standard_primer(available, view)?;
    // Primer and sample make up 90% of the annealing reaction.
    let total = (available + primer) / 0.9;
    let concentration = available * view.number(S::StartingSampleConcentrationInNanoMolar)? / total;
    Ok(StepOutput::single(S::MaxAvailableAnnealingConcentration, concentration))
}

fn non_standard_concentration(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let default = view.number(S::MaxAvailableAnnealingConcentration)?;
    let value = match ctx.inputs.non_standard_annealing_concentration_option {
        Choice::Default => default,
        Choice::Custom => ctx.inputs.custom_non_standard_annealing_concentration,
    };
    Ok(StepOutput::new()
        .set(S::DefaultNonStandardAnnealingConcentration, default)
        .set(S::NonStandardAnnealingConcentration, value))
}

fn binding_concentrations(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let ratio = ctx.bucket.ratio_of_binding_to_annealing_concentration;
    let non_standard = view.number(S::NonStandardAnnealingConcentration)?;
    let annealing = if ctx.non_standard() {
        non_standard
    } else {
        view.number(S::SampleConcentrationInAnnealingReaction)?
    };
    Ok(StepOutput::new()
        .set(S::SampleConcentrationInBinding, ratio * annealing)
        .set(S::MaxAvailableAnnealingConcentrationInBinding, non_standard * ratio)
        .set(S::FinalAnnealedConcentrationNonStandard, non_standard))
}

fn annealing_from_desired_cells(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let volume = ctx.annealing_for_cells(
        ctx.inputs.number_of_cells_in_binding,
        view.number(S::SampleConcentrationInBinding)?,
        view,
    )?;
    Ok(StepOutput::single(
        S::VolumeOfAnnealingReactionInBindingFromDesiredCells,
        volume,
    ))
}

fn sample_volume_in_annealing(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let inputs = &ctx.inputs;
    if inputs.compute_option == ComputeOption::Volume {
        return Ok(StepOutput::single(
            S::SampleVolumeInAnnealingReaction,
            inputs.sample_volume_to_use_in_annealing,
        ));
    }

    let mut in_annealing = view.number(S::SampleConcentrationInAnnealingReaction)?;
    let mut in_binding = view.number(S::SampleConcentrationInBinding)?;
    if ctx.non_standard() {
        if !ctx.globals.allow_non_standard_reverse_calculations {
            let code = if ctx.titration_mode() {
                ErrorCode::NonStandardTitration
            } else {
                ErrorCode::NonStandardByCells
            };
            return Ok(StepOutput::single(S::SampleVolumeInAnnealingReaction, f64::NAN).raise(code));
        }
        in_annealing = view.number(S::NonStandardAnnealingConcentration)?;
        in_binding = view.number(S::MaxAvailableAnnealingConcentrationInBinding)?;
    }
    let starting = view.number(S::StartingSampleConcentrationInNanoMolar)?;

    let volume = match inputs.compute_option {
        ComputeOption::Volume => inputs.sample_volume_to_use_in_annealing,
        ComputeOption::Cells => {
            let binding =
                ctx.annealing_for_cells(trunc_int(inputs.number_of_cells_to_use), in_binding, view)?;
            binding * (in_annealing / starting)
        }
        ComputeOption::Titration => {
            // Every titration point with a concentration loads one chip.
            let per_chip = view.number(S::VolumePerChipNoReuse)? + view.number(S::DeadVolumePerWell)?;
            let binding: f64 = inputs
                .titration_concentrations
                .iter()
                .filter(|concentration| **concentration > 0.0)
                .map(|concentration| per_chip * (concentration / in_binding))
                .sum();
            let total = js_max(view.number(S::MinimumVolumeOfBindingReaction)?, 1.1 * binding);
            0.6 * total * (in_annealing / starting)
        }
    };
    Ok(StepOutput::single(S::SampleVolumeInAnnealingReaction, volume))
}

fn non_standard_annealing(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let sample = view.number(S::SampleVolumeInAnnealingReaction)?;
    let primer = ctx.non_standard_primer(sample, view)?;
    Ok(StepOutput::new()
        .set(S::PrimerVolumeInAnnealingReactionNonStandard, primer)
        .set(S::TotalVolumeOfAnnealingReactionNonStandard, (sample + primer) / 0.9))
}

fn total_annealing(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let total = if ctx.non_standard() {
        view.number(S::TotalVolumeOfAnnealingReactionNonStandard)?
    } else {
        view.number(S::SampleVolumeInAnnealingReaction)?
            * view.number(S::StartingSampleConcentrationInNanoMolar)?
            / view.number(S::SampleConcentrationInAnnealingReaction)?
    };
    Ok(StepOutput::single(S::TotalVolumeOfAnnealingReaction, total))
}

fn primer_in_annealing(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let primer = if ctx.non_standard() {
        view.number(S::PrimerVolumeInAnnealingReactionNonStandard)?
    } else {
        view.number(S::TotalVolumeOfAnnealingReaction)?
            * view.number(S::PrimerToTemplateRatio)?
            * view.number(S::SampleConcentrationInAnnealingReaction)?
            / view.number(S::DilutedPrimerConcentration)?
    };
    Ok(StepOutput::single(S::PrimerVolumeInAnnealingReaction, primer))
}

fn annealing_components(_: &SampleContext, view: &View<'_, Field>) -> Output {
    let total = view.number(S::TotalVolumeOfAnnealingReaction)?;
    let pb = 0.1 * total;
    let water = total
        - view.number(S::PrimerVolumeInAnnealingReaction)?
        - pb
        - view.number(S::SampleVolumeInAnnealingReaction)?;
    Ok(StepOutput::new()
        .set(S::VolumeOfPbInAnnealingReaction, pb)
        .set(S::VolumeOfWaterInAnnealingReaction, water))
}

fn final_annealed_concentration(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    if ctx.non_standard() {
        return Ok(StepOutput::single(
            S::FinalAnnealedConcentration,
            view.number(S::FinalAnnealedConcentrationNonStandard)?,
        ));
    }
    let result = view.number(S::SampleVolumeInAnnealingReaction)?
        * view.number(S::StartingSampleConcentrationInNanoMolar)?
        / view.number(S::TotalVolumeOfAnnealingReaction)?;
    let expected = view.number(S::SampleConcentrationInAnnealingReaction)?;
    Ok(StepOutput::single(S::FinalAnnealedConcentration, result).raise_if(
        !result.is_nan() && gaussian_round(result, 1) != gaussian_round(expected, 1),
        ErrorCode::AnnealingConcentrationSuspect,
    ))
}

fn diluted_primer(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let diluted = view.number(S::DilutedPrimerConcentration)?;
    let stock = view.number(S::StartingSequencingPrimerBufferConcentration)?;
    let minimum_pipettable = ctx.globals.minimum_pipettable_volume;

    let mut volume = view.number(S::PrimerVolumeInAnnealingReaction)?;
    if volume * diluted / stock < minimum_pipettable {
        // Solve for the smallest dilution whose stock aliquot is pipettable.
        volume = minimum_pipettable * stock / diluted;
    }
    let total = gaussian_round(js_max(view.number(S::MinimumVolumeOfDilutedPrimer)?, volume), 1);
    let aliquot = diluted * total / stock;
    Ok(StepOutput::new()
        .set(S::TotalVolumeOfDilutedPrimer, total)
        .set(S::StockPrimerAliquot, aliquot)
        .set(S::ElutionBuffer, total - aliquot))
}

fn spike_in_dilution_concentrations(_: &SampleContext, view: &View<'_, Field>) -> Output {
    let in_binding = view.number(S::SampleConcentrationInBinding)?;
    Ok(StepOutput::new()
        .set(
            S::SpikeInSecondDilutionConcentration,
            view.number(S::SpikeInPercentOfTemplateConcentration)? * in_binding * 10.0,
        )
        .set(
            S::PolymeraseDilutionConcentration,
            in_binding * view.number(S::PolymeraseTemplateRatio)? * 10.0,
        ))
}

fn available_annealing_in_binding(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let total = view.number(S::TotalVolumeOfAnnealingReaction)?;
    if ctx.inputs.binding_polymerase_option == BindingPolymeraseOption::Volume {
        return Ok(StepOutput::single(
            S::VolumeAvailableOfAnnealingReactionInBinding,
            total,
        ));
    }
    let computed = view.number(S::VolumeOfAnnealingReactionInBindingFromDesiredCells)?;
    Ok(
        StepOutput::single(S::VolumeAvailableOfAnnealingReactionInBinding, computed).raise_if(
            computed > gaussian_round(total, 2),
            ErrorCode::TooManyCellsInBinding,
        ),
    )
}

fn total_binding(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let available = view.number(S::VolumeAvailableOfAnnealingReactionInBinding)?;
    if available == 0.0 {
        return Ok(StepOutput::single(S::TotalVolumeOfBindingReaction, 0.0));
    }
    let minimum = view.number(S::MinimumVolumeOfBindingReaction)?;
    let result = available / 0.6;
    if !ctx.non_standard() && gaussian_round(result, 3) < minimum {
        // Downstream volumes become NaN rather than silently scaling up.
        return Ok(StepOutput::single(S::TotalVolumeOfBindingReaction, f64::NAN)
            .raise(ErrorCode::BindingVolumeLow));
    }
    Ok(StepOutput::single(
        S::TotalVolumeOfBindingReaction,
        js_max(minimum, result),
    ))
}

fn binding_components(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let total = view.number(S::TotalVolumeOfBindingReaction)?;
    let v1 = ctx.inputs.is_chemistry_v1();
    let spike_in = if !v1 {
        f64::NAN
    } else if !ctx.spike() {
        0.0
    } else {
        0.1 * total
    };
    let analogs = total * 0.1;
    let polymerase = total * 0.1;
    let dtt = total * 0.1;
    let mut buffer = total
        - dtt
        - polymerase
        - analogs
        - view.number(S::VolumeAvailableOfAnnealingReactionInBinding)?;
    if v1 {
        buffer -= spike_in;
    }
    Ok(StepOutput::new()
        .set(S::VolumeOfSpikeInDilutionInBinding, spike_in)
        .set(S::VolumeOfAnnealingReactionInBinding, total * 0.6)
        .set(S::VolumeOfAnalogsInBinding, analogs)
        .set(S::VolumeOfPolymeraseDilutionInBinding, polymerase)
        .set(S::VolumeOfDttInBinding, dtt)
        .set(S::BindingBufferInBinding, buffer)
        .set(S::DefaultVolumeOfBindingReactionInStorageComplex, total))
}

fn final_binding_concentration(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let annealed = view.number(S::FinalAnnealedConcentration)?;
    let result = annealed * ctx.bucket.ratio_of_binding_to_annealing_concentration;
    let mut output = StepOutput::single(S::FinalBindingConcentration, result);
    if !ctx.non_standard() {
        let compare = view.number(S::VolumeAvailableOfAnnealingReactionInBinding)? * annealed
            / view.number(S::TotalVolumeOfBindingReaction)?;
        output = output.raise_if(
            !result.is_nan() && gaussian_round(result, 1) != gaussian_round(compare, 1),
            ErrorCode::BindingConcentrationSuspect,
        );
    }
    Ok(output)
}

/// Cells a binding reaction of `volume` can serve once diluted to the
/// plate concentration.
fn cells_for_binding_volume(
    ctx: &SampleContext,
    view: &View<'_, Field>,
    helpers: &Helpers,
    volume: f64,
    raised: &mut Vec<ErrorCode>,
) -> Result<f64, PrepError> {
    let inputs = &ctx.inputs;
    let final_binding = view.number(S::FinalBindingConcentration)?;
    let concentration_on_plate = view.number(S::ConcentrationOnPlate)?;
    let requested = view.number(S::TotalComplexDilutionCells)?;

    let max_volume = volume * final_binding / concentration_on_plate;
    if max_volume.is_nan() {
        if requested > 0.0 {
            raised.push(ErrorCode::NotEnoughCellsForBindingComplex);
        }
        return Ok(0.0);
    }

    let target = if ctx.titration_mode() {
        let [first, second, third, fourth] = inputs.titration_concentrations;
        js_max(js_max(first, second), js_max(third, fourth))
    } else {
        concentration_on_plate
    };
    // Test against one chip: bound template plus spike-in must fit in it.
    let one_chip = ctx.plate.volume_in_partial_wells(1.0, 0.0);
    let mut bound = one_chip * target / final_binding;
    if !inputs.is_chemistry_v1() {
        bound += helpers.spike_in_volume_in_dilution(target, one_chip);
    }
    let too_low = bound > one_chip;
    if too_low {
        raised.push(if inputs.compute_option == ComputeOption::Volume {
            ErrorCode::BindingConcentrationTooLowForOneChip
        } else {
            ErrorCode::BindingConcentrationTooLowForReverseCalculation
        });
    }

    let max_well_volume = view.number(S::MaxVolumePerWellFromBucket)?;
    let full_wells = trunc_int(max_volume / max_well_volume);
    let cells = full_wells * view.number(S::MaxNumberOfCellsPerWellFromBucket)?
        + ctx
            .plate
            .cells_from_partial_volume(max_volume - full_wells * max_well_volume);
    let result = if too_low { 0.0 } else { cells };

    if !ctx.titration_mode() && requested > result {
        raised.push(ErrorCode::NotEnoughCellsForBindingComplex);
    }
    Ok(result)
}

fn cells_from_binding(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let helpers = ctx.helpers(view)?;
    let mut raised = Vec::new();
    let cells = cells_for_binding_volume(
        ctx,
        view,
        &helpers,
        view.number(S::TotalVolumeOfBindingReaction)?,
        &mut raised,
    )?;
    let max_cells = cells_for_binding_volume(
        ctx,
        view,
        &helpers,
        view.number(S::TotalVolumeOfAnnealingReaction)? / 0.6,
        &mut raised,
    )?;
    let mut output = StepOutput::new()
        .set(S::NumberOfCellsFromBinding, cells)
        .set(S::MaxNumberOfCellsFromBinding, max_cells);
    output.errors = raised;
    Ok(output)
}

fn spike_in_dilutions(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let second_concentration = view.number(S::SpikeInSecondDilutionConcentration)?;
    let first_concentration = view.number(S::SpikeInFirstDilutionConcentration)?;

    let diluted = js_max(
        1.0,
        gaussian_round(
            second_concentration * view.number(S::VolumeOfSpikeInDilutionInBinding)? * 1.2
                / first_concentration,
            1,
        ),
    );
    let second_total = diluted * first_concentration / second_concentration;
    let first_total = if ctx.spike() {
        js_max(ctx.globals.minimum_volume_of_first_spike_in_dilution, diluted * 1.2)
    } else {
        0.0
    };
    let stock = first_concentration * first_total / view.number(S::SpikeInStockConcentration)?;

    Ok(StepOutput::new()
        .set(S::DilutedSpikeInVolumeInSecondDilution, diluted)
        .set(S::TotalVolumeOfSecondSpikeInDilution, second_total)
        .set(S::BindingBufferInSecondDilution, second_total - diluted)
        .set(S::TotalVolumeOfFirstSpikeInDilution, first_total)
        .set(S::SpikeInStockVolumeInFirstDilution, stock)
        .set(S::BindingBufferInFirstDilution, first_total - stock))
}

fn polymerase_dilution(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let dilution = view.number(S::PolymeraseDilutionConcentration)?;
    let stock_concentration = view.number(S::PolymeraseStockConcentration)?;
    let stock = js_max(
        ctx.globals.minimum_volume_of_polymerase_stock_in_dilution,
        gaussian_round(
            dilution * view.number(S::VolumeOfPolymeraseDilutionInBinding)? * 1.2 / stock_concentration,
            1,
        ),
    );
    let total = stock * stock_concentration / dilution;
    Ok(StepOutput::new()
        .set(S::PolymeraseStockVolumeInDilution, stock)
        .set(S::TotalVolumeOfPolymeraseDilution, total)
        .set(S::BindingBufferInPolymeraseDilution, total - stock))
}

fn spike_in_control(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let helpers = ctx.helpers(view)?;
    let bucket = &ctx.bucket;
    let mag_bead = ctx.inputs.mag_bead;

    let control_volume = if mag_bead {
        f64::NAN
    } else {
        helpers.spike_in_volume_in_dilution(
            view.number(S::ConcentrationOnPlate)?,
            view.number(S::TotalComplexDilutionVolume)?,
        )
    };
    let dilution_volume = if !ctx.spike() {
        0.0
    } else if mag_bead {
        f64::NAN
    } else {
        let basic = 1.1 * control_volume;
        let minimum = bucket.minimum_spike_in_dilution_volume;
        if basic > minimum {
            basic
        } else {
            minimum
        }
    };
    let contribution = if ctx.spike() {
        dilution_volume * bucket.spike_in_concentration_in_dilution / bucket.spike_in_stock_concentration
    } else {
        0.0
    };
    let in_complex_dilution = if ctx.inputs.is_chemistry_v1() || !ctx.spike() {
        0.0
    } else {
        control_volume
    };
    let remainder = dilution_volume - contribution;

    Ok(StepOutput::new()
        .set(S::SpikeInControlVolumeInDilution, control_volume)
        .set(S::SpikeInDilutionVolume, dilution_volume)
        .set(S::SpikeInControlContribution, contribution)
        .set(S::DttVolumeInSpikeInDilution, remainder * 0.1)
        .set(S::ComplexDilutionBufferVolumeInSpikeInDilution, remainder * 0.9)
        .set(S::VolumeOfSpikeInDilutionInComplexDilution, in_complex_dilution))
}

fn complex_dilution(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let helpers = ctx.helpers(view)?;
    let total = view.number(S::TotalComplexDilutionVolume)?;
    let binding = if ctx.inputs.mag_bead {
        f64::NAN
    } else {
        let source = if ctx.small() {
            view.number(S::FinalBindingConcentration)?
        } else {
            view.number(S::StorageComplexConcentration)?
        };
        view.number(S::ConcentrationOnPlate)? * total / source
    };
    let buffer = helpers.buffer_needed(total, binding, view.number(S::SpikeInControlVolumeInDilution)?);
    Ok(StepOutput::new()
        .set(S::VolumeOfBindingReactionInComplexDilution, binding)
        .set(S::VolumeOfComplexDilutionBufferInComplexDilution, buffer * 0.9)
        .set(S::VolumeOfDttInComplexDilution, buffer * 0.1))
}

fn storage_complex(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let binding = if ctx.small() && !ctx.storage() {
        0.0
    } else {
        match ctx.inputs.storage_complex_option {
            Choice::Default => view.number(S::DefaultVolumeOfBindingReactionInStorageComplex)?,
            Choice::Custom => ctx.inputs.custom_volume_of_binding_reaction_in_storage_complex,
        }
    };
    let in_binding = view.number(S::SampleConcentrationInBinding)?;
    let total = binding * in_binding / view.number(S::StorageComplexConcentration)?;
    let remainder = total - binding;
    Ok(StepOutput::new()
        .set(S::VolumeOfBindingReactionInStorageComplex, binding)
        .set(S::TotalVolumeOfStorageComplex, total)
        .set(S::VolumeOfDttInStorageComplex, remainder * 0.1)
        .set(S::VolumeOfComplexDilutionBufferInStorageComplex, remainder * 0.9)
        .set(S::FinalStorageConcentration, binding * in_binding / total))
}

fn titrations(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    if !ctx.reference() && !ctx.titration_mode() {
        return Ok(StepOutput::new());
    }
    let helpers = ctx.helpers(view)?;
    let in_binding = view.number(S::SampleConcentrationInBinding)?;
    let volume_per_chip = view.number(S::VolumePerChipNoReuse)?;
    let dead_volume = view.number(S::DeadVolumePerWell)?;

    let mut output = StepOutput::new();
    for (idx, concentration) in ctx.inputs.titration_concentrations.iter().enumerate() {
        let point = TitrationPoint {
            concentration: *concentration,
            sample_concentration_in_binding: in_binding,
            volume_per_chip,
            dead_volume,
            helpers,
        };
        let record = ctx.titration.compute(&point)?;
        let number = idx as u8 + 1;
        if number == 1 {
            output = output.set(S::TitrationTotal, record.number(TitrationField::TitrationTotal));
        }
        for (field, value) in record.iter().filter(|(field, _)| field.is_exported()) {
            output = output.set(Field::Titration(number, field), value.clone());
        }
    }
    Ok(output)
}

fn prepare_errors(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    let inputs = &ctx.inputs;
    let non_standard = ctx.non_standard();
    let mut output = StepOutput::new();

    if !ctx.small() && non_standard {
        output = output.raise(if ctx.reference() {
            ErrorCode::NonStandardLargeScale
        } else {
            ErrorCode::NonStandardLargeScaleNew
        });
    }
    output = output
        .raise_if(
            ctx.small() && ctx.storage() && non_standard,
            ErrorCode::NonStandardSmallStorageNotSupported,
        )
        .raise_if(
            ctx.spike() && inputs.annealed_base_pair_length > 15_000.0,
            ErrorCode::UntestedControlWithLongInsertSize,
        );

    if ctx.titration_mode() {
        let mut negative = false;
        for field in titration_fields(TitrationField::TitrationComplexDilutionBuffer) {
            negative |= view.number(field)? < 0.0;
        }
        if negative {
            output = output.raise(if non_standard {
                ErrorCode::TitrationConcentrationTooHighNonStandard
            } else {
                ErrorCode::TitrationConcentrationTooHigh
            });
        }
    }

    if non_standard && inputs.compute_option != ComputeOption::Volume {
        let available = inputs.available_sample_volume;
        output = output.raise_if(
            available == 0.0 || available < view.number(S::SampleVolumeInAnnealingReaction)?,
            ErrorCode::NotEnoughAvailableVolume,
        );
    }
    Ok(output)
}

fn mag_bead(ctx: &SampleContext, view: &View<'_, Field>) -> Output {
    if !ctx.reference() && !ctx.inputs.mag_bead {
        return Ok(StepOutput::new());
    }
    let base = MagBeadPoint {
        protocol: ctx.inputs.preparation_protocol,
        long_term_storage: ctx.storage(),
        use_spike_in_control: ctx.spike(),
        low_concentrations_allowed: ctx.non_standard(),
        concentration_on_plate: view.number(S::ConcentrationOnPlate)?,
        cells: view.number(S::TotalComplexDilutionCells)?,
        final_binding_concentration: view.number(S::FinalBindingConcentration)?,
        final_storage_concentration: view.number(S::FinalStorageConcentration)?,
        spike_in_percent_of_template: view.number(S::SpikeInPercentOfTemplateConcentration)?,
        plate: ctx.plate,
        sluff_factor: ctx.globals.magnetic_bead_sluff_factor,
        bead_to_complex_ratio: ctx.globals.mag_bead_to_complex_ratio,
    };

    let mut variants = Vec::new();
    if ctx.reference() || ctx.titration_mode() {
        for (idx, concentration) in ctx.inputs.titration_concentrations.iter().enumerate() {
            let point = MagBeadPoint {
                concentration_on_plate: *concentration,
                cells: 1.0,
                ..base
            };
            variants.push((MagBeadVariant::Titration(idx as u8 + 1), point));
        }
    }
    if ctx.reference() || !ctx.titration_mode() {
        variants.insert(0, (MagBeadVariant::Standard, base));
    }

    let mut output = StepOutput::new();
    for (variant, point) in variants {
        let evaluation = ctx.mag_bead.compute(&point)?;
        for (field, value) in evaluation.record.iter().filter(|(field, _)| field.is_exported()) {
            output = output.set(Field::MagBead(variant, field), value.clone());
        }
        output.errors.extend(evaluation.errors);
    }
    Ok(output)
}
