//! Working state shared by the steps of one computation.

use std::collections::BTreeMap;
use std::fmt::Debug;

use prep_core::errors::{ErrorInfo, PrepError};
use serde::{Deserialize, Serialize};

/// A derived quantity: numbers may be `NaN`, labels are plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric quantity.
    Number(f64),
    /// Label or name.
    Text(String),
}

impl Value {
    /// Numeric view of the value; text reads as `NaN`.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Number(value) => *value,
            Value::Text(_) => f64::NAN,
        }
    }

    /// Text view of the value, if it is a label.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text.as_str()),
            Value::Number(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Flat map of derived fields, rebuilt from scratch on every computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<F> {
    values: BTreeMap<F, Value>,
}

impl<F> Default for Record<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<F: Ord + Copy> Record<F> {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value, if any.
    pub fn get(&self, field: F) -> Option<&Value> {
        self.values.get(&field)
    }

    /// Numeric value of `field`; missing fields read as `NaN`.
    pub fn number(&self, field: F) -> f64 {
        self.values
            .get(&field)
            .map(Value::as_number)
            .unwrap_or(f64::NAN)
    }

    /// Text value of `field`, if it holds a label.
    pub fn text(&self, field: F) -> Option<&str> {
        self.values.get(&field).and_then(Value::as_text)
    }

    /// Stores `value` under `field`, replacing any previous value.
    pub fn insert(&mut self, field: F, value: impl Into<Value>) {
        self.values.insert(field, value.into());
    }

    /// Returns `true` when `field` has been written.
    pub fn contains(&self, field: F) -> bool {
        self.values.contains_key(&field)
    }

    /// Iterates over the written fields in field order.
    pub fn iter(&self) -> impl Iterator<Item = (F, &Value)> {
        self.values.iter().map(|(field, value)| (*field, value))
    }

    /// Number of written fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read access granted to a single step: only the fields it declared.
pub struct View<'a, F> {
    record: &'a Record<F>,
    reads: &'a [F],
    step: &'static str,
}

impl<'a, F: Ord + Copy + Debug> View<'a, F> {
    pub(crate) fn new(record: &'a Record<F>, reads: &'a [F], step: &'static str) -> Self {
        Self {
            record,
            reads,
            step,
        }
    }

    fn check(&self, field: F) -> Result<(), PrepError> {
        if self.reads.contains(&field) {
            return Ok(());
        }
        Err(PrepError::Schedule(
            ErrorInfo::new("undeclared-read", "step read a field it does not declare")
                .at_step(self.step)
                .on_field(format!("{field:?}")),
        ))
    }

    /// Numeric value of a declared input field.
    pub fn number(&self, field: impl Into<F>) -> Result<f64, PrepError> {
        let field = field.into();
        self.check(field)?;
        Ok(self.record.number(field))
    }

    /// Text value of a declared input field.
    pub fn text(&self, field: impl Into<F>) -> Result<Option<&'a str>, PrepError> {
        let field = field.into();
        self.check(field)?;
        Ok(self.record.text(field))
    }

    /// Name of the step this view was issued to.
    pub fn step(&self) -> &'static str {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_text_fields_read_as_nan() {
        let mut record: Record<u8> = Record::new();
        record.insert(1, "label");
        record.insert(2, 4.5);
        assert!(record.number(0).is_nan());
        assert!(record.number(1).is_nan());
        assert_eq!(record.number(2), 4.5);
        assert_eq!(record.text(1), Some("label"));
    }

    #[test]
    fn view_rejects_undeclared_reads() {
        let mut record: Record<u8> = Record::new();
        record.insert(1, 2.0);
        record.insert(2, 3.0);
        let reads = [1u8];
        let view = View::new(&record, &reads, "probe");
        assert_eq!(view.number(1u8).unwrap(), 2.0);
        let err = view.number(2u8).unwrap_err();
        assert_eq!(err.info().code, "undeclared-read");
        assert_eq!(err.info().context.get("step").map(String::as_str), Some("probe"));
    }
}
