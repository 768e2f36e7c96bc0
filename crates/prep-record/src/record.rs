//! One sample: its persisted inputs and, once calculated, its outputs.
//!
//! Every calculation starts from the stored inputs and rebuilds the whole
//! output. Domain conditions land in the output's error map; only a failure
//! of the calculator itself marks the output unsuccessful.

use std::collections::BTreeMap;

use prep_core::codes::{ErrorCode, ErrorMessage};
use prep_core::errors::{ErrorInfo, PrepError};
use prep_core::serde::to_canonical_json_bytes;
use prep_engine::{CalculationEngine, ErrorMap, SampleInputs, Value};
use tracing::{debug, warn};

use crate::input::InputRecord;
use crate::sanitize::{category_for, is_difficult_volume, sanitize};
use crate::schema::{numeric_inputs, text_inputs, SampleOutput, UiFlags};

/// Facade over the inputs and last computed outputs of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    input: InputRecord,
    output: Option<SampleOutput>,
}

impl Default for SampleRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleRecord {
    /// A blank record with default inputs and a fresh identifier.
    pub fn new() -> Self {
        Self::from_input(InputRecord::default())
    }

    /// Wraps existing inputs.
    pub fn from_input(input: InputRecord) -> Self {
        Self {
            input,
            output: None,
        }
    }

    /// Loads a persisted record.
    pub fn from_json(data: &str) -> Result<Self, PrepError> {
        Ok(Self::from_input(InputRecord::from_json(data.as_bytes())?))
    }

    /// Persisted form: the inputs and identity only, never derived fields.
    pub fn to_json(&self) -> Result<String, PrepError> {
        let bytes = to_canonical_json_bytes(&self.input)?;
        String::from_utf8(bytes).map_err(|err| {
            PrepError::Serde(ErrorInfo::new("json-utf8", err.to_string()))
        })
    }

    /// Stored inputs.
    pub fn input(&self) -> &InputRecord {
        &self.input
    }

    /// Mutable inputs; the previous output is discarded.
    pub fn input_mut(&mut self) -> &mut InputRecord {
        self.output = None;
        &mut self.input
    }

    /// Output of the last calculation, if any.
    pub fn output(&self) -> Option<&SampleOutput> {
        self.output.as_ref()
    }

    /// Recomputes every output field with `engine`.
    pub fn calculate(&mut self, engine: &CalculationEngine) -> &SampleOutput {
        let inputs = self.input.to_inputs();
        let output = match self.compute(engine, &inputs) {
            Ok(output) => output,
            Err(err) => {
                warn!(
                    sample = %self.input.sample_guid,
                    code = %err.info().code,
                    "calculation failed"
                );
                self.failure(engine, &inputs, &err)
            }
        };
        self.output.insert(output)
    }

    /// Output boundary JSON of the last calculation.
    pub fn output_json(&self) -> Result<serde_json::Value, PrepError> {
        let output = self.output.as_ref().ok_or_else(|| {
            PrepError::Input(
                ErrorInfo::new("not-calculated", "record has not been calculated")
                    .with_context("sample", self.input.sample_guid.to_string())
                    .with_hint("call calculate before requesting the output"),
            )
        })?;
        serde_json::to_value(output)
            .map_err(|err| PrepError::Serde(ErrorInfo::new("json-serialize", err.to_string())))
    }

    fn compute(
        &self,
        engine: &CalculationEngine,
        inputs: &SampleInputs,
    ) -> Result<SampleOutput, PrepError> {
        let constants = engine.constants();
        let mode = engine.mode();
        let minimum_pipettable = constants.globals.minimum_pipettable_volume;
        let calculation = engine.calculate(inputs)?;

        let mut values = self.echoed_inputs(engine, inputs);
        let mut difficult = false;
        for (field, value) in calculation.exported() {
            let name = field.name();
            let category = category_for(&name, value);
            let sanitized = sanitize(value, category, mode);
            difficult |= is_difficult_volume(category, &sanitized, minimum_pipettable);
            values.insert(name, sanitized);
        }

        let mut errors = calculation.errors;
        if difficult {
            errors.raise(ErrorCode::DifficultPipetting, &constants.errors)?;
        }
        debug!(
            sample = %self.input.sample_guid,
            values = values.len(),
            errors = errors.len(),
            fallback = calculation.fallback,
            "calculated sample"
        );
        Ok(SampleOutput {
            values,
            flags: UiFlags::from_globals(&constants.globals),
            errors,
            success: true,
        })
    }

    fn echoed_inputs(&self, engine: &CalculationEngine, inputs: &SampleInputs) -> BTreeMap<String, Value> {
        let mut values = BTreeMap::new();
        for (name, text) in text_inputs(&self.input) {
            values.insert(name.to_string(), Value::Text(text));
        }
        for (name, number) in numeric_inputs(inputs) {
            let value = Value::Number(number);
            let category = category_for(name, &value);
            values.insert(name.to_string(), sanitize(&value, category, engine.mode()));
        }
        values
    }

    fn failure(&self, engine: &CalculationEngine, inputs: &SampleInputs, err: &PrepError) -> SampleOutput {
        let constants = engine.constants();
        let message = constants
            .errors
            .lookup(ErrorCode::General)
            .cloned()
            .unwrap_or_else(|_| ErrorMessage::long_only(err.to_string()));
        let mut errors = ErrorMap::new();
        errors.insert(ErrorCode::General, message);
        SampleOutput {
            values: self.echoed_inputs(engine, inputs),
            flags: UiFlags::from_globals(&constants.globals),
            errors,
            success: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::catalog::Constants;
    use prep_core::options::RunMode;

    #[test]
    fn persisted_form_holds_inputs_only() {
        let mut record = SampleRecord::new();
        let engine = CalculationEngine::new(Constants::builtin(), RunMode::Production).unwrap();
        record.calculate(&engine);
        let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("SampleGuid"));
        assert!(object.contains_key("TitrationConcentration4"));
        assert!(!object.contains_key("TotalVolumeOfAnnealingReaction"));
        assert!(!object.contains_key("Errors"));
    }

    #[test]
    fn editing_inputs_drops_the_output() {
        let mut record = SampleRecord::new();
        let engine = CalculationEngine::new(Constants::builtin(), RunMode::Production).unwrap();
        record.calculate(&engine);
        assert!(record.output().is_some());
        record.input_mut().sample_name = "Renamed".to_string();
        assert!(record.output().is_none());
        assert!(record.output_json().is_err());
    }

    #[test]
    fn missing_registry_entry_fails_softly() {
        let mut constants = Constants::builtin();
        let mut registry = prep_core::codes::ErrorRegistry::new();
        for (code, message) in constants.errors.iter() {
            if *code != ErrorCode::InvalidInsertSizeMagBeadNew {
                registry.insert(*code, message.clone());
            }
        }
        constants.errors = registry;
        let engine = CalculationEngine::new(constants, RunMode::Production).unwrap();

        let mut record = SampleRecord::new();
        record.input_mut().annealed_base_pair_length = crate::input::Quantity::Number(500.0);
        let output = record.calculate(&engine);
        assert!(!output.success);
        assert_eq!(output.errors.codes(), vec![ErrorCode::General]);
        assert_eq!(output.text("SampleName"), Some("Untitled"));
    }
}
