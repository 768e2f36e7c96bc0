use prep_core::catalog::Constants;
use prep_core::codes::ErrorCode;
use prep_core::options::RunMode;
use prep_engine::CalculationEngine;
use prep_record::hash::output_fingerprint;
use prep_record::sanitize::{category_for, Category};
use prep_record::SampleRecord;
use proptest::prelude::*;

fn engine(mode: RunMode) -> CalculationEngine {
    CalculationEngine::new(Constants::builtin(), mode).unwrap()
}

const STANDARD_SMALL: &str = r#"{
    "SampleName": "Lambda 10k",
    "MagBead": "False",
    "UseSpikeInControl": "False",
    "StartingSampleConcentration": "150",
    "SampleVolumeToUseInAnnealing": 20
}"#;

#[test]
fn standard_small_scale_output() {
    let mut record = SampleRecord::from_json(STANDARD_SMALL).unwrap();
    record.calculate(&engine(RunMode::Production));
    let json = record.output_json().unwrap();

    assert_eq!(json["Success"], true);
    assert_eq!(json["SampleName"], "Lambda 10k");
    assert_eq!(json["MagBead"], "False");
    assert_eq!(json["TotalVolumeOfAnnealingReaction"], 46.2);
    assert_eq!(json["StartingSampleConcentrationInNanoMolar"], 23.1);
    assert_eq!(json["StartingSampleConcentration"], 150.0);
    assert_eq!(json["ShowStrobeOption"], false);
    let errors = json["Errors"].as_object().unwrap();
    assert!(!errors.keys().any(|code| code.starts_with("InvalidInsertSize")));
}

#[test]
fn short_bead_insert_uses_the_error_bucket() {
    let mut record = SampleRecord::from_json(r#"{"AnnealedBasePairLength": "500"}"#).unwrap();
    let output = record.calculate(&engine(RunMode::Production));
    assert!(output.success);
    assert!(output.errors.contains(ErrorCode::InvalidInsertSizeMagBeadNew));
    assert_eq!(output.text("BucketSize"), Some("?"));
    assert_eq!(output.text("TubeNamePolymerase"), Some("?"));
    assert_eq!(output.number("AnnealedBasePairLength"), 500.0);

    let json = record.output_json().unwrap();
    let message = &json["Errors"]["InvalidInsertSizeMagBeadNew"];
    assert!(message["LongMessage"].as_str().is_some());
}

#[test]
fn unparseable_numbers_render_as_unknown() {
    let mut record = SampleRecord::from_json(
        r#"{"MagBead": "False", "StartingSampleConcentration": "lots", "SampleVolumeToUseInAnnealing": 20}"#,
    )
    .unwrap();
    let output = record.calculate(&engine(RunMode::Production));
    assert!(output.success);
    assert_eq!(output.text("StartingSampleConcentration"), Some("?"));
    assert_eq!(output.text("TotalVolumeOfAnnealingReaction"), Some("?"));
}

#[test]
fn identity_does_not_change_the_fingerprint() {
    let engine = engine(RunMode::Reference);
    let mut first = SampleRecord::from_json(STANDARD_SMALL).unwrap();
    let mut second = SampleRecord::from_json(STANDARD_SMALL).unwrap();
    second.input_mut().sample_name = "Another name".to_string();
    let first = output_fingerprint(first.calculate(&engine)).unwrap();
    let second = output_fingerprint(second.calculate(&engine)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
}

#[test]
fn reference_mode_keeps_more_volume_digits() {
    let mut production = SampleRecord::from_json(STANDARD_SMALL).unwrap();
    let mut reference = production.clone();
    let production = production.calculate(&engine(RunMode::Production)).clone();
    let reference = reference.calculate(&engine(RunMode::Reference)).clone();
    // 4.615 uL of primer sits between the two thresholds.
    assert_eq!(production.number("PrimerVolumeInAnnealingReaction"), 4.6);
    assert_eq!(reference.number("PrimerVolumeInAnnealingReaction"), 4.62);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn small_volumes_always_warn(
        concentration in 1.0f64..400.0,
        volume in 0.5f64..60.0,
        length in prop_oneof![Just(2000u32), Just(5000), Just(10000), Just(20000)],
        mag_bead in any::<bool>(),
        spike in any::<bool>(),
        large in any::<bool>(),
    ) {
        let json = format!(
            r#"{{"StartingSampleConcentration": {concentration}, "SampleVolumeToUseInAnnealing": {volume},
                "AnnealedBasePairLength": {length}, "MagBead": "{}", "UseSpikeInControl": "{}",
                "PreparationProtocol": "{}", "BindingComplexNumberOfCellsRequested": 4}}"#,
            if mag_bead { "True" } else { "False" },
            if spike { "True" } else { "False" },
            if large { "Large" } else { "Small" },
        );
        let mut record = SampleRecord::from_json(&json).unwrap();
        let output = record.calculate(&engine(RunMode::Production)).clone();
        prop_assert!(output.success);

        let minimum = Constants::builtin().globals.minimum_pipettable_volume;
        let difficult = output.values.iter().any(|(name, value)| {
            category_for(name, value) == Category::Volume
                && value.as_number() != 0.0
                && value.as_number() < minimum
        });
        if difficult {
            prop_assert!(output.errors.contains(ErrorCode::DifficultPipetting));
        }
    }
}
