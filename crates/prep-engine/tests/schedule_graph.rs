use prep_core::errors::PrepError;
use prep_engine::record::{Record, View};
use prep_engine::schedule::{Schedule, Step, StepOutput};
use proptest::prelude::*;

const NAMES: [&str; 8] = ["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7"];

fn noop(_: &(), _: &View<'_, u8>) -> Result<StepOutput<u8>, PrepError> {
    Ok(StepOutput::new())
}

fn double_first(_: &(), view: &View<'_, u8>) -> Result<StepOutput<u8>, PrepError> {
    Ok(StepOutput::single(1u8, view.number(0u8)? * 2.0))
}

fn seed(_: &(), _: &View<'_, u8>) -> Result<StepOutput<u8>, PrepError> {
    Ok(StepOutput::single(0u8, 21.0))
}

fn rogue(_: &(), _: &View<'_, u8>) -> Result<StepOutput<u8>, PrepError> {
    Ok(StepOutput::single(9u8, 1.0))
}

fn sneaky(_: &(), view: &View<'_, u8>) -> Result<StepOutput<u8>, PrepError> {
    Ok(StepOutput::single(2u8, view.number(0u8)?))
}

#[test]
fn dependencies_run_before_consumers() {
    let schedule = Schedule::build(vec![
        Step::new("double", &[0], &[1], double_first),
        Step::new("seed", &[], &[0], seed),
    ])
    .unwrap();
    assert_eq!(schedule.order(), vec!["seed", "double"]);

    let mut record = Record::new();
    let errors = schedule.run(&(), &mut record).unwrap();
    assert!(errors.is_empty());
    assert_eq!(record.number(1), 42.0);
}

#[test]
fn independent_steps_keep_declaration_order() {
    let schedule = Schedule::build(vec![
        Step::new("c", &[], &[2], noop),
        Step::new("a", &[], &[0], noop),
        Step::new("b", &[], &[1], noop),
    ])
    .unwrap();
    assert_eq!(schedule.order(), vec!["c", "a", "b"]);
}

#[test]
fn duplicate_writers_are_rejected() {
    let err = Schedule::build(vec![
        Step::new("first", &[], &[0], noop),
        Step::new("second", &[], &[0], noop),
    ])
    .unwrap_err();
    assert!(matches!(err, PrepError::Schedule(_)));
    assert_eq!(err.info().code, "duplicate-writer");
}

#[test]
fn reads_without_producer_are_rejected() {
    let err = Schedule::build(vec![Step::new("orphan", &[5], &[0], noop)]).unwrap_err();
    assert_eq!(err.info().code, "missing-producer");
    assert_eq!(err.info().context.get("step").map(String::as_str), Some("orphan"));
}

#[test]
fn cycles_are_rejected() {
    let err = Schedule::build(vec![
        Step::new("left", &[1], &[0], noop),
        Step::new("right", &[0], &[1], noop),
    ])
    .unwrap_err();
    assert_eq!(err.info().code, "dependency-cycle");
    assert!(err.info().hint.is_some());
}

#[test]
fn undeclared_writes_abort_the_run() {
    let schedule = Schedule::build(vec![Step::new("rogue", &[], &[0], rogue)]).unwrap();
    let mut record = Record::new();
    let err = schedule.run(&(), &mut record).unwrap_err();
    assert_eq!(err.info().code, "undeclared-write");
}

#[test]
fn undeclared_reads_abort_the_run() {
    let schedule = Schedule::build(vec![
        Step::new("seed", &[], &[0], seed),
        Step::new("sneaky", &[], &[2], sneaky),
    ])
    .unwrap();
    let err = schedule.evaluate(&()).unwrap_err();
    assert_eq!(err.info().code, "undeclared-read");
}

proptest! {
    #[test]
    fn order_respects_every_edge(
        edges in proptest::collection::vec(proptest::collection::vec(any::<bool>(), 8), 8),
        rotation in 0usize..8,
    ) {
        // Step i writes field i and may read any field j < i, so the graph
        // is acyclic; rotating the declaration order hides that from the
        // scheduler.
        let mut reads: Vec<Vec<u8>> = Vec::new();
        for (i, row) in edges.iter().enumerate() {
            reads.push((0..i).filter(|j| row[*j]).map(|j| j as u8).collect());
        }
        let mut declared: Vec<usize> = (0..8).collect();
        declared.rotate_left(rotation);

        let steps = declared
            .iter()
            .map(|i| Step::new(NAMES[*i], reads[*i].as_slice(), &[*i as u8], noop))
            .collect();
        let schedule = Schedule::build(steps).unwrap();
        let order = schedule.order();
        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
        for (i, fields) in reads.iter().enumerate() {
            for field in fields {
                prop_assert!(position(NAMES[*field as usize]) < position(NAMES[i]));
            }
        }
    }
}
