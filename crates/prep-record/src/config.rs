use std::fs;
use std::path::{Path, PathBuf};

use prep_core::bucket::Globals;
use prep_core::catalog::{load_constants, Constants};
use prep_core::errors::{ErrorInfo, PrepError};
use prep_core::options::RunMode;
use prep_core::serde::from_yaml_slice;
use prep_engine::CalculationEngine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// YAML-configurable settings of a calculator instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Behaviour variant.
    #[serde(default)]
    pub mode: RunMode,
    /// Constant catalog to load instead of the built-in one.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Individual global constants to override.
    #[serde(default)]
    pub globals: GlobalOverrides,
}

/// Optional replacements for global constants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalOverrides {
    /// Smallest volume that can be pipetted reliably.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_pipettable_volume: Option<f64>,
    /// Stock concentration of the sequencing primer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annealing_primer_stock_concentration: Option<f64>,
    /// Smallest binding reaction in standard mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_volume_of_default_binding_reaction: Option<f64>,
    /// Polymerase stock concentration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polymerase_stock_concentration: Option<f64>,
    /// Overage applied to the bead wash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic_bead_sluff_factor: Option<f64>,
    /// Washed bead volume per unit of complex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag_bead_to_complex_ratio: Option<f64>,
    /// Whether the cell selector is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_cell_option: Option<bool>,
    /// Whether the chemistry selector is shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_chemistry_option: Option<bool>,
    /// Whether non-standard concentrations may be solved in reverse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_non_standard_reverse_calculations: Option<bool>,
}

impl GlobalOverrides {
    /// Writes every present override into `globals`.
    pub fn apply(&self, globals: &mut Globals) {
        fn set<T: Copy>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }
        set(&mut globals.minimum_pipettable_volume, self.minimum_pipettable_volume);
        set(
            &mut globals.annealing_primer_stock_concentration,
            self.annealing_primer_stock_concentration,
        );
        set(
            &mut globals.minimum_volume_of_default_binding_reaction,
            self.minimum_volume_of_default_binding_reaction,
        );
        set(&mut globals.polymerase_stock_concentration, self.polymerase_stock_concentration);
        set(&mut globals.magnetic_bead_sluff_factor, self.magnetic_bead_sluff_factor);
        set(&mut globals.mag_bead_to_complex_ratio, self.mag_bead_to_complex_ratio);
        set(&mut globals.show_cell_option, self.show_cell_option);
        set(&mut globals.show_chemistry_option, self.show_chemistry_option);
        set(
            &mut globals.allow_non_standard_reverse_calculations,
            self.allow_non_standard_reverse_calculations,
        );
    }
}

impl CalculatorConfig {
    /// Resolves the constant set: the configured catalog or the built-in
    /// one, with global overrides applied.
    pub fn constants(&self) -> Result<Constants, PrepError> {
        let mut constants = match &self.catalog {
            Some(path) => load_constants(path)?,
            None => Constants::builtin(),
        };
        self.globals.apply(&mut constants.globals);
        Ok(constants)
    }

    /// Builds an engine for this configuration.
    pub fn engine(&self) -> Result<CalculationEngine, PrepError> {
        CalculationEngine::new(self.constants()?, self.mode)
    }
}

/// Loads a calculator configuration from a YAML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<CalculatorConfig, PrepError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        PrepError::Config(
            ErrorInfo::new("config-read", err.to_string())
                .at_path(path.display().to_string()),
        )
    })?;
    let mut config: CalculatorConfig = from_yaml_slice(&bytes)?;
    // Catalog paths are relative to the configuration file.
    if let (Some(catalog), Some(parent)) = (&config.catalog, path.parent()) {
        if catalog.is_relative() {
            config.catalog = Some(parent.join(catalog));
        }
    }
    debug!(path = %path.display(), mode = ?config.mode, "loaded calculator config");
    Ok(config)
}
