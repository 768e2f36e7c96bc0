use prep_core::catalog::Constants;
use prep_core::options::{ComputeOption, RunMode};
use prep_engine::{CalculationEngine, SampleInputs};

fn snapshot(engine: &CalculationEngine, inputs: &SampleInputs) -> String {
    let calculation = engine.calculate(inputs).unwrap();
    // Debug output renders NaN, which equality comparisons cannot.
    format!("{:?}|{:?}", calculation.fields, calculation.errors.codes())
}

#[test]
fn recompute_is_repeatable() {
    let engine = CalculationEngine::new(Constants::builtin(), RunMode::Reference).unwrap();
    let cases = [
        SampleInputs::default(),
        SampleInputs {
            starting_sample_concentration: 150.0,
            sample_volume_to_use_in_annealing: 20.0,
            binding_complex_number_of_cells_requested: 12.0,
            ..SampleInputs::default()
        },
        SampleInputs {
            compute_option: ComputeOption::Titration,
            starting_sample_concentration: 80.0,
            titration_concentrations: [0.01, 0.02, 0.03, 0.04],
            ..SampleInputs::default()
        },
    ];
    for inputs in &cases {
        assert_eq!(snapshot(&engine, inputs), snapshot(&engine, inputs));
    }
}

#[test]
fn engines_agree() {
    let inputs = SampleInputs {
        compute_option: ComputeOption::Cells,
        number_of_cells_to_use: 5.0,
        starting_sample_concentration: 120.0,
        ..SampleInputs::default()
    };
    let first = CalculationEngine::new(Constants::builtin(), RunMode::Production).unwrap();
    let second = CalculationEngine::new(Constants::builtin(), RunMode::Production).unwrap();
    assert_eq!(first.step_order(), second.step_order());
    assert_eq!(snapshot(&first, &inputs), snapshot(&second, &inputs));
}
