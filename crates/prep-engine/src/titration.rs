//! Complex dilution for a single loading titration point.
//!
//! Every point loads exactly one chip, so the total is one chip volume plus
//! the well's dead volume regardless of complex reuse.

use prep_core::errors::PrepError;

use crate::fields::TitrationField;
use crate::fields::TitrationField as T;
use crate::helpers::Helpers;
use crate::record::{Record, View};
use crate::schedule::{Schedule, Step, StepOutput};

/// Inputs of one titration point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitrationPoint {
    /// Requested concentration on plate for this point.
    pub concentration: f64,
    /// Sample concentration in the binding reaction.
    pub sample_concentration_in_binding: f64,
    /// Complex volume consumed by one chip.
    pub volume_per_chip: f64,
    /// Dead volume left in the well.
    pub dead_volume: f64,
    /// Shared spike-in and buffer formulas.
    pub helpers: Helpers,
}

/// Calculator evaluated once per titration point.
#[derive(Debug)]
pub struct TitrationCalc {
    schedule: Schedule<TitrationField, TitrationPoint>,
}

impl TitrationCalc {
    /// Builds and validates the titration step graph.
    pub fn new() -> Result<Self, PrepError> {
        let schedule = Schedule::build(vec![
            Step::new("titration_total", &[], &[T::TitrationTotal], total),
            Step::new(
                "titration_binding_complex",
                &[T::TitrationTotal],
                &[T::TitrationBindingComplex],
                binding_complex,
            ),
            Step::new(
                "titration_spike_in",
                &[T::TitrationTotal],
                &[T::TitrationSpikeInVolume],
                spike_in,
            ),
            Step::new(
                "titration_buffer",
                &[
                    T::TitrationTotal,
                    T::TitrationBindingComplex,
                    T::TitrationSpikeInVolume,
                ],
                &[T::TitrationBufferNeeded],
                buffer,
            ),
            Step::new(
                "titration_buffer_split",
                &[T::TitrationBufferNeeded],
                &[T::TitrationDtt, T::TitrationComplexDilutionBuffer],
                buffer_split,
            ),
        ])?;
        Ok(Self { schedule })
    }

    /// Computes every field of one point.
    pub fn compute(&self, point: &TitrationPoint) -> Result<Record<TitrationField>, PrepError> {
        Ok(self.schedule.evaluate(point)?.record)
    }
}

fn total(point: &TitrationPoint, _: &View<'_, T>) -> Result<StepOutput<T>, PrepError> {
    Ok(StepOutput::single(
        T::TitrationTotal,
        point.volume_per_chip + point.dead_volume,
    ))
}

fn binding_complex(point: &TitrationPoint, view: &View<'_, T>) -> Result<StepOutput<T>, PrepError> {
    let volume = point.helpers.binding_reaction_volume(
        point.concentration,
        view.number(T::TitrationTotal)?,
        point.sample_concentration_in_binding,
    );
    Ok(StepOutput::single(T::TitrationBindingComplex, volume))
}

fn spike_in(point: &TitrationPoint, view: &View<'_, T>) -> Result<StepOutput<T>, PrepError> {
    let volume = point
        .helpers
        .spike_in_volume_in_dilution(point.concentration, view.number(T::TitrationTotal)?);
    Ok(StepOutput::single(T::TitrationSpikeInVolume, volume))
}

fn buffer(point: &TitrationPoint, view: &View<'_, T>) -> Result<StepOutput<T>, PrepError> {
    let needed = point.helpers.buffer_needed(
        view.number(T::TitrationTotal)?,
        view.number(T::TitrationBindingComplex)?,
        view.number(T::TitrationSpikeInVolume)?,
    );
    Ok(StepOutput::single(T::TitrationBufferNeeded, needed))
}

fn buffer_split(_: &TitrationPoint, view: &View<'_, T>) -> Result<StepOutput<T>, PrepError> {
    let needed = view.number(T::TitrationBufferNeeded)?;
    Ok(StepOutput::new()
        .set(T::TitrationDtt, needed * 0.1)
        .set(T::TitrationComplexDilutionBuffer, needed * 0.9))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(concentration: f64, spike: bool) -> TitrationPoint {
        TitrationPoint {
            concentration,
            sample_concentration_in_binding: 6.0,
            volume_per_chip: 10.0,
            dead_volume: 5.0,
            helpers: Helpers {
                use_spike_in_control: spike,
                chemistry_v1: false,
                spike_in_percent_of_template: 0.01,
                spike_in_concentration_in_dilution: 0.01,
            },
        }
    }

    #[test]
    fn zero_concentration_keeps_the_whole_chip_as_buffer() {
        let calc = TitrationCalc::new().unwrap();
        let record = calc.compute(&point(0.0, true)).unwrap();
        assert_eq!(record.number(T::TitrationTotal), 15.0);
        assert_eq!(record.number(T::TitrationBindingComplex), 0.0);
        assert_eq!(record.number(T::TitrationSpikeInVolume), 0.0);
        assert!((record.number(T::TitrationDtt) - 1.5).abs() < 1e-12);
        assert!((record.number(T::TitrationComplexDilutionBuffer) - 13.5).abs() < 1e-12);
    }

    #[test]
    fn spike_in_reduces_buffer() {
        let calc = TitrationCalc::new().unwrap();
        let record = calc.compute(&point(0.025, true)).unwrap();
        let binding = record.number(T::TitrationBindingComplex);
        let spike = record.number(T::TitrationSpikeInVolume);
        assert!((binding - 0.0625).abs() < 1e-12);
        assert!((spike - 0.375).abs() < 1e-12);
        let needed = record.number(T::TitrationBufferNeeded);
        assert!((needed - (15.0 - binding - spike)).abs() < 1e-12);
    }

    #[test]
    fn step_order_is_stable() {
        let calc = TitrationCalc::new().unwrap();
        assert_eq!(
            calc.schedule.order(),
            vec![
                "titration_total",
                "titration_binding_complex",
                "titration_spike_in",
                "titration_buffer",
                "titration_buffer_split",
            ]
        );
    }
}
