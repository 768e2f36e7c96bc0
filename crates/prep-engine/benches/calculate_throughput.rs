use criterion::{criterion_group, criterion_main, Criterion};
use prep_core::catalog::Constants;
use prep_core::options::{ComputeOption, RunMode};
use prep_engine::{CalculationEngine, SampleInputs};

fn bench_calculate(c: &mut Criterion) {
    let engine = CalculationEngine::new(Constants::builtin(), RunMode::Production).unwrap();
    let volume = SampleInputs {
        starting_sample_concentration: 150.0,
        sample_volume_to_use_in_annealing: 20.0,
        binding_complex_number_of_cells_requested: 8.0,
        ..SampleInputs::default()
    };
    let titration = SampleInputs {
        compute_option: ComputeOption::Titration,
        starting_sample_concentration: 150.0,
        titration_concentrations: [0.005, 0.01, 0.015, 0.02],
        ..SampleInputs::default()
    };

    let mut group = c.benchmark_group("calculate_throughput");
    group.bench_function("volume_mag_bead", |b| {
        b.iter(|| {
            let _ = engine.calculate(&volume).unwrap();
        })
    });
    group.bench_function("titration_mag_bead", |b| {
        b.iter(|| {
            let _ = engine.calculate(&titration).unwrap();
        })
    });
    group.finish();
}

criterion_group!(benches, bench_calculate);
criterion_main!(benches);
