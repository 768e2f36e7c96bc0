//! Magnetic bead purification of the binding complex.
//!
//! The complex is diluted down to the plate concentration, incubated with
//! washed beads and then washed. A zero plate concentration zeroes every
//! volume. The salt adjustment is proposed first and settled together with
//! the second binding buffer, which may fall back to diverting the whole
//! remaining volume into the wash buffer.

use prep_core::codes::ErrorCode;
use prep_core::errors::PrepError;
use prep_core::options::PreparationProtocol;

use crate::fields::MagBeadField;
use crate::fields::MagBeadField as M;
use crate::plate::PlateLayout;
use crate::record::View;
use crate::schedule::{Evaluation, Schedule, Step, StepOutput};

/// Stock spike-in concentration before the two bead dilutions.
const STOCK_SPIKE_IN_CONCENTRATION: f64 = 10.0;
/// Spike-in concentration after the first dilution.
const INTERMEDIATE_SPIKE_IN_CONCENTRATION: f64 = 0.5;
/// Spike-in concentration used in the complex dilution.
const FINAL_SPIKE_IN_CONCENTRATION: f64 = 0.01;
/// Default intermediate complex dilution concentration.
const INTERMEDIATE_DILUTION_CONCENTRATION: f64 = 0.5;

const BEAD_BINDING_BUFFER_SALT: f64 = 100.0;
const BEAD_WASH_BUFFER_SALT: f64 = 400.0;
const BINDING_SALT: f64 = 10.0;
/// Salt after a small scale storage dilution with bead binding buffer.
const DILUTED_STORAGE_BINDING_SALT: f64 = 55.0;

/// Inputs of one bead preparation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagBeadPoint {
    /// Preparation scale.
    pub protocol: PreparationProtocol,
    /// Whether the complex goes through long-term storage.
    pub long_term_storage: bool,
    /// Whether a spike-in control is used.
    pub use_spike_in_control: bool,
    /// Non-standard (low concentration) mode.
    pub low_concentrations_allowed: bool,
    /// Target concentration on plate.
    pub concentration_on_plate: f64,
    /// Cells loaded from this preparation.
    pub cells: f64,
    /// Final binding concentration of the primary calculation.
    pub final_binding_concentration: f64,
    /// Final storage concentration of the primary calculation.
    pub final_storage_concentration: f64,
    /// Spike-in fraction of the template concentration.
    pub spike_in_percent_of_template: f64,
    /// Sample plate geometry.
    pub plate: PlateLayout,
    /// Overage applied to the bead wash.
    pub sluff_factor: f64,
    /// Washed bead volume per unit of complex.
    pub bead_to_complex_ratio: f64,
}

impl MagBeadPoint {
    fn is_empty(&self) -> bool {
        self.concentration_on_plate == 0.0
    }

    fn no_cells(&self) -> bool {
        self.cells == 0.0
    }

    fn skips_storage_dilution(&self) -> bool {
        self.protocol == PreparationProtocol::Small && !self.long_term_storage
    }
}

/// Calculator evaluated once per plate concentration.
#[derive(Debug)]
pub struct MagBeadCalc {
    schedule: Schedule<MagBeadField, MagBeadPoint>,
}

impl MagBeadCalc {
    /// Builds and validates the bead step graph.
    pub fn new() -> Result<Self, PrepError> {
        let schedule = Schedule::build(vec![
            Step::new(
                "bead_concentrations",
                &[],
                &[
                    M::MagBeadOriginalBoundSampleConcentration,
                    M::MagBeadIntermediateDilutionConcentration,
                    M::FinalBeadedSampleConcentration,
                ],
                concentrations,
            ),
            Step::new(
                "spike_in_stock",
                &[],
                &[
                    M::MagBeadSpikeInDilutionVolumeOfFirstStockSpikeIn,
                    M::MagBeadSpikeInDilutionVolumeOfFirstBindingBuffer,
                ],
                spike_in_stock,
            ),
            Step::new(
                "incubation_complex",
                &[],
                &[M::ComplexBeadIncubationVolumeOfComplex],
                incubation_complex,
            ),
            Step::new(
                "complex_wash",
                &[M::ComplexBeadIncubationVolumeOfComplex],
                &[
                    M::MagBeadComplexDilutionVolumeTotal,
                    M::ComplexBeadWashVolumeOfFirstBindingBuffer,
                    M::ComplexBeadWashVolumeOfBeadWashBuffer,
                    M::ComplexBeadWashVolumeOfSecondBindingBuffer,
                ],
                complex_wash,
            ),
            Step::new(
                "washed_beads",
                &[M::ComplexBeadIncubationVolumeOfComplex],
                &[M::ComplexBeadIncubationVolumeOfWashedBeads],
                washed_beads,
            ),
            Step::new(
                "bead_wash",
                &[M::ComplexBeadIncubationVolumeOfWashedBeads],
                &[
                    M::BeadWashVolumeOfBeads,
                    M::BeadWashVolumeOfBeadWashBuffer,
                    M::BeadWashVolumeOfBeadBindingBuffer,
                ],
                bead_wash,
            ),
            Step::new(
                "complex_dilution_spike_in",
                &[M::FinalBeadedSampleConcentration, M::MagBeadComplexDilutionVolumeTotal],
                &[M::MagBeadComplexDilutionVolumeOfSpikeInDilution],
                complex_dilution_spike_in,
            ),
            Step::new(
                "second_complex",
                &[
                    M::FinalBeadedSampleConcentration,
                    M::MagBeadIntermediateDilutionConcentration,
                    M::MagBeadComplexDilutionVolumeTotal,
                ],
                &[M::MagBeadComplexDilutionVolumeOfSecondComplex],
                second_complex,
            ),
            Step::new(
                "salt_proposal",
                &[M::MagBeadComplexDilutionVolumeOfSecondComplex],
                &[M::MagBeadSaltProposal],
                salt_proposal,
            ),
            Step::new(
                "spike_in_dilution",
                &[M::MagBeadComplexDilutionVolumeOfSpikeInDilution],
                &[
                    M::MagBeadSpikeInDilutionVolumeOfSecondBindingBuffer,
                    M::MagBeadSpikeInDilutionVolumeOfFirstDilution,
                ],
                spike_in_dilution,
            ),
            Step::new(
                "first_complex_dilution",
                &[
                    M::MagBeadIntermediateDilutionConcentration,
                    M::MagBeadOriginalBoundSampleConcentration,
                    M::MagBeadComplexDilutionVolumeOfSecondComplex,
                ],
                &[
                    M::MagBeadComplexDilutionVolumeOfFirstBindingBuffer,
                    M::MagBeadComplexDilutionVolumeOfFirstComplex,
                ],
                first_complex_dilution,
            ),
            Step::new(
                "salt_and_binding_buffer",
                &[
                    M::MagBeadComplexDilutionVolumeTotal,
                    M::MagBeadComplexDilutionVolumeOfSpikeInDilution,
                    M::MagBeadComplexDilutionVolumeOfSecondComplex,
                    M::MagBeadSaltProposal,
                ],
                &[
                    M::MagBeadComplexDilutionVolumeOfSaltBuffer,
                    M::MagBeadComplexDilutionVolumeOfSecondBindingBuffer,
                ],
                salt_and_binding_buffer,
            ),
        ])?;
        Ok(Self { schedule })
    }

    /// Computes every field of one preparation.
    pub fn compute(&self, point: &MagBeadPoint) -> Result<Evaluation<MagBeadField>, PrepError> {
        self.schedule.evaluate(point)
    }
}

type Output = Result<StepOutput<M>, PrepError>;

fn concentrations(point: &MagBeadPoint, _: &View<'_, M>) -> Output {
    let intermediate = if point.low_concentrations_allowed {
        point.final_binding_concentration
    } else {
        INTERMEDIATE_DILUTION_CONCENTRATION
    };
    Ok(StepOutput::new()
        .set(
            M::MagBeadOriginalBoundSampleConcentration,
            point.final_storage_concentration,
        )
        .set(M::MagBeadIntermediateDilutionConcentration, intermediate)
        .set(M::FinalBeadedSampleConcentration, point.concentration_on_plate))
}

fn spike_in_stock(point: &MagBeadPoint, _: &View<'_, M>) -> Output {
    if point.is_empty() {
        return Ok(StepOutput::new()
            .set(M::MagBeadSpikeInDilutionVolumeOfFirstStockSpikeIn, 0.0)
            .set(M::MagBeadSpikeInDilutionVolumeOfFirstBindingBuffer, 0.0));
    }
    let ratio = STOCK_SPIKE_IN_CONCENTRATION / INTERMEDIATE_SPIKE_IN_CONCENTRATION;
    let buffer = if ratio * 0.01 >= 1.0 {
        ratio * 0.99
    } else {
        ratio - 1.0
    };
    Ok(StepOutput::new()
        .set(M::MagBeadSpikeInDilutionVolumeOfFirstStockSpikeIn, 1.0)
        .set(M::MagBeadSpikeInDilutionVolumeOfFirstBindingBuffer, buffer))
}

fn incubation_complex(point: &MagBeadPoint, _: &View<'_, M>) -> Output {
    let volume = if point.is_empty() || point.no_cells() {
        0.0
    } else {
        point.plate.volume_from_full_wells(point.cells)
            + point.plate.volume_from_partial_wells(point.cells)
    };
    Ok(StepOutput::single(M::ComplexBeadIncubationVolumeOfComplex, volume))
}

fn complex_wash(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    let volume = if point.is_empty() {
        0.0
    } else {
        view.number(M::ComplexBeadIncubationVolumeOfComplex)?
    };
    Ok(StepOutput::new()
        .set(M::MagBeadComplexDilutionVolumeTotal, volume)
        .set(M::ComplexBeadWashVolumeOfFirstBindingBuffer, volume)
        .set(M::ComplexBeadWashVolumeOfBeadWashBuffer, volume)
        .set(M::ComplexBeadWashVolumeOfSecondBindingBuffer, volume))
}

fn washed_beads(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    let volume = if point.is_empty() || point.no_cells() {
        0.0
    } else {
        view.number(M::ComplexBeadIncubationVolumeOfComplex)? * point.bead_to_complex_ratio
    };
    Ok(StepOutput::single(M::ComplexBeadIncubationVolumeOfWashedBeads, volume))
}

fn bead_wash(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    let beads = if point.is_empty() {
        0.0
    } else {
        view.number(M::ComplexBeadIncubationVolumeOfWashedBeads)? * point.sluff_factor
    };
    Ok(StepOutput::new()
        .set(M::BeadWashVolumeOfBeads, beads)
        .set(M::BeadWashVolumeOfBeadWashBuffer, beads)
        .set(M::BeadWashVolumeOfBeadBindingBuffer, beads))
}

fn complex_dilution_spike_in(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    let volume = if point.is_empty() || !point.use_spike_in_control {
        0.0
    } else {
        point.spike_in_percent_of_template
            * (view.number(M::FinalBeadedSampleConcentration)? / FINAL_SPIKE_IN_CONCENTRATION)
            * view.number(M::MagBeadComplexDilutionVolumeTotal)?
    };
    Ok(StepOutput::single(
        M::MagBeadComplexDilutionVolumeOfSpikeInDilution,
        volume,
    ))
}

fn second_complex(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    let volume = if point.is_empty() {
        0.0
    } else {
        view.number(M::FinalBeadedSampleConcentration)?
            / view.number(M::MagBeadIntermediateDilutionConcentration)?
            * view.number(M::MagBeadComplexDilutionVolumeTotal)?
    };
    Ok(StepOutput::single(
        M::MagBeadComplexDilutionVolumeOfSecondComplex,
        volume,
    ))
}

fn salt_proposal(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    let binding_salt = if point.protocol == PreparationProtocol::Small && point.long_term_storage {
        DILUTED_STORAGE_BINDING_SALT
    } else {
        BINDING_SALT
    };
    let amount = if point.is_empty() {
        0.0
    } else {
        view.number(M::MagBeadComplexDilutionVolumeOfSecondComplex)?
            * (BEAD_BINDING_BUFFER_SALT - binding_salt)
            / (BEAD_WASH_BUFFER_SALT - BEAD_BINDING_BUFFER_SALT)
    };
    // Additions under 1 uL are skipped.
    let proposal = if amount < 1.0 { 0.0 } else { amount };
    Ok(StepOutput::single(M::MagBeadSaltProposal, proposal))
}

fn spike_in_dilution(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    if point.is_empty() {
        return Ok(StepOutput::new()
            .set(M::MagBeadSpikeInDilutionVolumeOfSecondBindingBuffer, 0.0)
            .set(M::MagBeadSpikeInDilutionVolumeOfFirstDilution, 0.0));
    }
    let spike_in = view.number(M::MagBeadComplexDilutionVolumeOfSpikeInDilution)?;
    let step_down = FINAL_SPIKE_IN_CONCENTRATION / INTERMEDIATE_SPIKE_IN_CONCENTRATION;
    let (buffer, first_dilution) = if spike_in * 0.01 >= 1.0 {
        (spike_in * (1.0 - step_down), spike_in * step_down)
    } else {
        (
            INTERMEDIATE_SPIKE_IN_CONCENTRATION / FINAL_SPIKE_IN_CONCENTRATION - 1.0,
            1.0,
        )
    };
    Ok(StepOutput::new()
        .set(M::MagBeadSpikeInDilutionVolumeOfSecondBindingBuffer, buffer)
        .set(M::MagBeadSpikeInDilutionVolumeOfFirstDilution, first_dilution))
}

fn first_complex_dilution(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    if point.is_empty() || point.no_cells() {
        return Ok(StepOutput::new()
            .set(M::MagBeadComplexDilutionVolumeOfFirstBindingBuffer, 0.0)
            .set(M::MagBeadComplexDilutionVolumeOfFirstComplex, 0.0));
    }
    if point.skips_storage_dilution() {
        return Ok(StepOutput::new()
            .set(M::MagBeadComplexDilutionVolumeOfFirstBindingBuffer, 0.0)
            .set(M::MagBeadComplexDilutionVolumeOfFirstComplex, 1.0));
    }

    let intermediate = view.number(M::MagBeadIntermediateDilutionConcentration)?;
    let original = view.number(M::MagBeadOriginalBoundSampleConcentration)?;
    let second_complex = view.number(M::MagBeadComplexDilutionVolumeOfSecondComplex)?;
    let ratio = intermediate / original;

    let buffer = if ratio * second_complex >= 1.0 {
        second_complex * (1.0 - ratio)
    } else {
        original / intermediate - 1.0
    };
    let complex = second_complex * ratio;
    let complex = if complex >= 1.0 { complex } else { 1.0 };
    Ok(StepOutput::new()
        .set(M::MagBeadComplexDilutionVolumeOfFirstBindingBuffer, buffer)
        .set(M::MagBeadComplexDilutionVolumeOfFirstComplex, complex))
}

fn salt_and_binding_buffer(point: &MagBeadPoint, view: &View<'_, M>) -> Output {
    let total = view.number(M::MagBeadComplexDilutionVolumeTotal)?;
    let spike_in = view.number(M::MagBeadComplexDilutionVolumeOfSpikeInDilution)?;
    let second_complex = view.number(M::MagBeadComplexDilutionVolumeOfSecondComplex)?;
    let mut salt = view.number(M::MagBeadSaltProposal)?;

    let remaining = total - spike_in - second_complex;
    let mut binding_buffer = if point.is_empty() { 0.0 } else { remaining - salt };
    let mut output = StepOutput::new();

    if remaining < 0.0 {
        salt = f64::NAN;
        binding_buffer = f64::NAN;
        output = output.raise(if spike_in > 0.0 {
            ErrorCode::ConcentrationOnPlateTooHighWithControl
        } else {
            ErrorCode::ConcentrationOnPlateTooHighWithoutControl
        });
    }
    // Not enough room for the salt adjustment or a pipettable binding
    // buffer: everything left goes in as wash buffer.
    if remaining - salt - 1.0 < 0.0 {
        salt = remaining;
        binding_buffer = 0.0;
    }

    Ok(output
        .set(M::MagBeadComplexDilutionVolumeOfSaltBuffer, salt)
        .set(M::MagBeadComplexDilutionVolumeOfSecondBindingBuffer, binding_buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::catalog::Constants;
    use prep_core::options::ProtocolType;

    fn point(concentration_on_plate: f64, cells: f64) -> MagBeadPoint {
        let constants = Constants::builtin();
        let bucket = constants
            .buckets
            .find(10_000.0, ProtocolType::MagBead, "VersionP4", "CellVersion3")
            .unwrap();
        MagBeadPoint {
            protocol: PreparationProtocol::Small,
            long_term_storage: false,
            use_spike_in_control: true,
            low_concentrations_allowed: false,
            concentration_on_plate,
            cells,
            final_binding_concentration: 6.0,
            final_storage_concentration: 3.0,
            spike_in_percent_of_template: 0.01,
            plate: PlateLayout::new(bucket, false),
            sluff_factor: 1.1,
            bead_to_complex_ratio: 1.0,
        }
    }

    #[test]
    fn zero_concentration_zeroes_every_volume() {
        let calc = MagBeadCalc::new().unwrap();
        let evaluation = calc.compute(&point(0.0, 1.0)).unwrap();
        assert!(evaluation.errors.is_empty());
        for field in MagBeadField::ALL.iter().filter(|field| field.is_exported()) {
            assert_eq!(evaluation.record.number(*field), 0.0, "{}", field.name());
        }
    }

    #[test]
    fn spike_in_first_dilution_constants() {
        let calc = MagBeadCalc::new().unwrap();
        let record = calc.compute(&point(0.025, 1.0)).unwrap().record;
        assert_eq!(record.number(M::MagBeadSpikeInDilutionVolumeOfFirstStockSpikeIn), 1.0);
        assert_eq!(record.number(M::MagBeadSpikeInDilutionVolumeOfFirstBindingBuffer), 19.0);
        assert_eq!(record.number(M::MagBeadSpikeInDilutionVolumeOfFirstDilution), 1.0);
        assert_eq!(
            record.number(M::MagBeadSpikeInDilutionVolumeOfSecondBindingBuffer),
            49.0
        );
    }

    #[test]
    fn small_scale_skips_storage_dilution() {
        let calc = MagBeadCalc::new().unwrap();
        let record = calc.compute(&point(0.025, 1.0)).unwrap().record;
        assert_eq!(record.number(M::MagBeadComplexDilutionVolumeOfFirstBindingBuffer), 0.0);
        assert_eq!(record.number(M::MagBeadComplexDilutionVolumeOfFirstComplex), 1.0);
        let incubation = record.number(M::ComplexBeadIncubationVolumeOfComplex);
        assert!(incubation > 0.0);
        assert_eq!(record.number(M::MagBeadComplexDilutionVolumeTotal), incubation);
        assert!(
            (record.number(M::BeadWashVolumeOfBeads) - incubation * 1.1).abs() < 1e-9
        );
    }

    #[test]
    fn overflowing_dilution_is_flagged() {
        let calc = MagBeadCalc::new().unwrap();
        let evaluation = calc.compute(&point(5.0, 1.0)).unwrap();
        assert_eq!(
            evaluation.errors,
            vec![ErrorCode::ConcentrationOnPlateTooHighWithControl]
        );
        assert!(evaluation
            .record
            .number(M::MagBeadComplexDilutionVolumeOfSaltBuffer)
            .is_nan());
        assert!(evaluation
            .record
            .number(M::MagBeadComplexDilutionVolumeOfSecondBindingBuffer)
            .is_nan());
    }

    #[test]
    fn salt_buffer_falls_back_to_remaining_volume() {
        let calc = MagBeadCalc::new().unwrap();
        let mut low = point(0.025, 1.0);
        low.use_spike_in_control = false;
        let record = calc.compute(&low).unwrap().record;
        let total = record.number(M::MagBeadComplexDilutionVolumeTotal);
        let complex = record.number(M::MagBeadComplexDilutionVolumeOfSecondComplex);
        let salt = record.number(M::MagBeadComplexDilutionVolumeOfSaltBuffer);
        let binding = record.number(M::MagBeadComplexDilutionVolumeOfSecondBindingBuffer);
        assert!((salt + binding + complex - total).abs() < 1e-9);
        assert!(salt >= 0.0 && binding >= 0.0);
    }
}
