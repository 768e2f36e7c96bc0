//! Explicit dependency scheduling for computation steps.
//!
//! Every step names the fields it reads and the fields it writes. The
//! schedule is a topological order of that graph; ties are broken by
//! declaration order so the execution sequence is stable across runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use prep_core::codes::ErrorCode;
use prep_core::errors::{ErrorInfo, PrepError};
use tracing::trace;

use crate::record::{Record, Value, View};

/// Signature shared by every step: a read-only context plus the declared
/// reads, returning the values it produced.
pub type StepFn<F, C> = fn(&C, &View<'_, F>) -> Result<StepOutput<F>, PrepError>;

/// Values and domain error codes produced by one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput<F> {
    /// Field values written by the step.
    pub values: Vec<(F, Value)>,
    /// Domain conditions raised by the step, in raise order.
    pub errors: Vec<ErrorCode>,
}

impl<F> Default for StepOutput<F> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<F> StepOutput<F> {
    /// Output with nothing written.
    pub fn new() -> Self {
        Self::default()
    }

    /// Output writing a single field.
    pub fn single(field: impl Into<F>, value: impl Into<Value>) -> Self {
        Self::new().set(field, value)
    }

    /// Adds a written field.
    pub fn set(mut self, field: impl Into<F>, value: impl Into<Value>) -> Self {
        self.values.push((field.into(), value.into()));
        self
    }

    /// Records a domain condition.
    pub fn raise(mut self, code: ErrorCode) -> Self {
        self.errors.push(code);
        self
    }

    /// Records a domain condition when `condition` holds.
    pub fn raise_if(self, condition: bool, code: ErrorCode) -> Self {
        if condition {
            self.raise(code)
        } else {
            self
        }
    }
}

/// Record and raised codes of one complete schedule run.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<F> {
    /// Every field written during the run.
    pub record: Record<F>,
    /// Domain conditions in raise order.
    pub errors: Vec<ErrorCode>,
}

/// A named computation with its declared dependencies.
pub struct Step<F, C> {
    /// Stable step name used in diagnostics.
    pub name: &'static str,
    /// Fields read through the [`View`].
    pub reads: Vec<F>,
    /// Fields the step may write.
    pub writes: Vec<F>,
    /// The computation itself.
    pub run: StepFn<F, C>,
}

impl<F: Copy, C> Step<F, C> {
    /// Declares a step.
    pub fn new(name: &'static str, reads: &[F], writes: &[F], run: StepFn<F, C>) -> Self {
        Self {
            name,
            reads: reads.to_vec(),
            writes: writes.to_vec(),
            run,
        }
    }
}

/// Steps in a verified execution order.
pub struct Schedule<F, C> {
    steps: Vec<Step<F, C>>,
    order: Vec<usize>,
}

impl<F, C> Schedule<F, C>
where
    F: Copy + Ord + Debug,
{
    /// Validates the step graph and computes its execution order.
    ///
    /// Fails when two steps write the same field, when a read has no
    /// producing step, or when the dependencies form a cycle.
    pub fn build(steps: Vec<Step<F, C>>) -> Result<Self, PrepError> {
        let mut producer: BTreeMap<F, usize> = BTreeMap::new();
        for (idx, step) in steps.iter().enumerate() {
            for field in &step.writes {
                if let Some(previous) = producer.insert(*field, idx) {
                    return Err(PrepError::Schedule(
                        ErrorInfo::new("duplicate-writer", "field is written by two steps")
                            .on_field(format!("{field:?}"))
                            .with_context("first", steps[previous].name)
                            .with_context("second", step.name),
                    ));
                }
            }
        }

        let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); steps.len()];
        let mut pending: Vec<usize> = vec![0; steps.len()];
        for (idx, step) in steps.iter().enumerate() {
            let mut upstream = BTreeSet::new();
            for field in &step.reads {
                let Some(&source) = producer.get(field) else {
                    return Err(PrepError::Schedule(
                        ErrorInfo::new("missing-producer", "no step writes a field that is read")
                            .on_field(format!("{field:?}"))
                            .at_step(step.name),
                    ));
                };
                if source == idx {
                    return Err(PrepError::Schedule(
                        ErrorInfo::new("dependency-cycle", "step reads its own output")
                            .at_step(step.name)
                            .on_field(format!("{field:?}")),
                    ));
                }
                upstream.insert(source);
            }
            pending[idx] = upstream.len();
            for source in upstream {
                dependents[source].insert(idx);
            }
        }

        let mut ready: BTreeSet<usize> = (0..steps.len()).filter(|idx| pending[*idx] == 0).collect();
        let mut order = Vec::with_capacity(steps.len());
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for dependent in &dependents[next] {
                pending[*dependent] -= 1;
                if pending[*dependent] == 0 {
                    ready.insert(*dependent);
                }
            }
        }

        if order.len() != steps.len() {
            let stuck: Vec<&str> = (0..steps.len())
                .filter(|idx| pending[*idx] > 0)
                .map(|idx| steps[idx].name)
                .collect();
            return Err(PrepError::Schedule(
                ErrorInfo::new("dependency-cycle", "step dependencies form a cycle")
                    .with_context("steps", stuck.join(","))
                    .with_hint("break the cycle by splitting one of the listed steps"),
            ));
        }

        Ok(Self { steps, order })
    }

    /// Step names in execution order.
    pub fn order(&self) -> Vec<&'static str> {
        self.order.iter().map(|idx| self.steps[*idx].name).collect()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` when the schedule holds no step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns `true` when some step writes `field`.
    pub fn produces(&self, field: F) -> bool {
        self.steps.iter().any(|step| step.writes.contains(&field))
    }

    /// Executes every step once, writing results into `record`.
    ///
    /// Domain error codes are returned in raise order. A step reading or
    /// writing a field outside its declaration aborts the run.
    pub fn run(&self, ctx: &C, record: &mut Record<F>) -> Result<Vec<ErrorCode>, PrepError> {
        let mut raised = Vec::new();
        for idx in &self.order {
            let step = &self.steps[*idx];
            let output = {
                let view = View::new(record, &step.reads, step.name);
                (step.run)(ctx, &view)?
            };
            trace!(
                step = step.name,
                writes = output.values.len(),
                errors = output.errors.len(),
                "ran step"
            );
            for (field, value) in output.values {
                if !step.writes.contains(&field) {
                    return Err(PrepError::Schedule(
                        ErrorInfo::new("undeclared-write", "step wrote a field it does not declare")
                            .at_step(step.name)
                            .on_field(format!("{field:?}")),
                    ));
                }
                record.insert(field, value);
            }
            raised.extend(output.errors);
        }
        Ok(raised)
    }

    /// Runs every step against a fresh record.
    pub fn evaluate(&self, ctx: &C) -> Result<Evaluation<F>, PrepError> {
        let mut record = Record::new();
        let errors = self.run(ctx, &mut record)?;
        Ok(Evaluation { record, errors })
    }
}

impl<F, C> std::fmt::Debug for Schedule<F, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("steps", &self.steps.len())
            .finish()
    }
}
