use std::fs;

use prep_core::catalog::Constants;
use prep_core::errors::PrepError;
use prep_core::options::RunMode;
use prep_record::config::{load_config, CalculatorConfig};

#[test]
fn defaults_use_the_builtin_catalog() {
    let config = CalculatorConfig::default();
    assert_eq!(config.mode, RunMode::Production);
    let constants = config.constants().unwrap();
    assert_eq!(constants.globals, Constants::builtin().globals);
    assert_eq!(constants.buckets, Constants::builtin().buckets);
}

#[test]
fn overrides_and_relative_catalog_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("constants.yaml"),
        Constants::builtin().to_yaml_string().unwrap(),
    )
    .unwrap();
    let config_path = dir.path().join("calculator.yaml");
    fs::write(
        &config_path,
        "mode: reference\ncatalog: constants.yaml\nglobals:\n  minimum_pipettable_volume: 2.0\n  show_cell_option: true\n",
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    assert_eq!(config.mode, RunMode::Reference);
    assert_eq!(config.catalog, Some(dir.path().join("constants.yaml")));

    let constants = config.constants().unwrap();
    assert_eq!(constants.globals.minimum_pipettable_volume, 2.0);
    assert!(constants.globals.show_cell_option);
    assert_eq!(
        constants.globals.annealing_primer_stock_concentration,
        Constants::builtin().globals.annealing_primer_stock_concentration
    );

    let engine = config.engine().unwrap();
    assert_eq!(engine.mode(), RunMode::Reference);
}

#[test]
fn missing_files_are_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, PrepError::Config(_)));
    assert_eq!(err.info().code, "config-read");
    assert!(err.info().context.contains_key("path"));
}

#[test]
fn missing_catalogs_are_catalog_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("calculator.yaml");
    fs::write(&config_path, "catalog: nowhere.yaml\n").unwrap();
    let config = load_config(&config_path).unwrap();
    let err = config.constants().unwrap_err();
    assert!(matches!(err, PrepError::Catalog(_)));
}
