use std::fs;

use prep_core::catalog::{load_constants, BucketCatalog, Constants};
use prep_core::codes::ErrorCode;
use prep_core::errors::PrepError;
use prep_core::options::ProtocolType;

#[test]
fn builtin_catalog_survives_yaml_roundtrip() {
    let constants = Constants::builtin();
    let yaml = constants.to_yaml_string().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("constants.yaml");
    fs::write(&path, &yaml).unwrap();

    let loaded = load_constants(&path).unwrap();
    assert_eq!(loaded.globals, constants.globals);
    assert_eq!(loaded.errors, constants.errors);
    assert_eq!(loaded.buckets, constants.buckets);
    assert!(loaded.error_bucket.size.is_nan());
    assert_eq!(loaded.error_bucket.chemistry, "?");
}

#[test]
fn lookup_uses_half_open_ranges() {
    let constants = Constants::builtin();
    let catalog = &constants.buckets;
    let at_edge = catalog
        .find(7500.0, ProtocolType::Standard, "VersionP4", "CellVersion3")
        .unwrap();
    assert_eq!(at_edge.size, 10000.0);
    let below = catalog
        .find(7499.0, ProtocolType::Standard, "VersionP4", "CellVersion3")
        .unwrap();
    assert_eq!(below.size, 5000.0);
    assert!(catalog
        .find(40000.0, ProtocolType::Standard, "VersionP4", "CellVersion3")
        .is_none());
    assert!(catalog
        .find(f64::NAN, ProtocolType::Standard, "VersionP4", "CellVersion3")
        .is_none());
}

#[test]
fn lookup_never_partially_matches() {
    let constants = Constants::builtin();
    let catalog = &constants.buckets;
    assert!(catalog
        .find(500.0, ProtocolType::MagBead, "VersionP4", "CellVersion3")
        .is_none());
    assert!(catalog
        .find(10000.0, ProtocolType::MagBead, "Version1", "CellVersion3")
        .is_none());
    assert!(catalog
        .find(10000.0, ProtocolType::Standard, "VersionP4", "CellVersion2")
        .is_none());
}

#[test]
fn xl_standard_buckets_carry_warning() {
    let constants = Constants::builtin();
    let standard = constants
        .buckets
        .find(10000.0, ProtocolType::Standard, "VersionXL", "CellVersion3")
        .unwrap();
    assert!(standard.warning_message.is_some());
    let beads = constants
        .buckets
        .find(10000.0, ProtocolType::MagBead, "VersionXL", "CellVersion3")
        .unwrap();
    assert!(beads.warning_message.is_none());
}

#[test]
fn overlapping_ranges_are_rejected() {
    let constants = Constants::builtin();
    let mut buckets: Vec<_> = constants.buckets.iter().cloned().collect();
    let mut duplicate = buckets[0].clone();
    duplicate.min_base_pair_length += 100.0;
    buckets.push(duplicate);
    let err = BucketCatalog::new(buckets).unwrap_err();
    assert!(matches!(err, PrepError::Catalog(ref info) if info.code == "bucket-overlap"));
}

#[test]
fn registry_covers_every_code() {
    let constants = Constants::builtin();
    for code in ErrorCode::ALL {
        assert!(constants.errors.lookup(code).is_ok(), "{code} missing");
    }
    let pipetting = constants.errors.lookup(ErrorCode::DifficultPipetting).unwrap();
    assert_eq!(
        pipetting.long_message,
        "Warning: Pipetting some volumes will be difficult."
    );
}

#[test]
fn missing_catalog_file_is_a_catalog_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_constants(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, PrepError::Catalog(_)));
}
