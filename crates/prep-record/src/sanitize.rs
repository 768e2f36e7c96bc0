//! Display precision for computed values.
//!
//! The category of a value is chosen from its field name, checked in a
//! fixed priority order: raw inputs, non-finite values, whole-number
//! fields, concentrations, ratios and finally volumes.

use prep_core::numeric::{gaussian_round, trunc_int};
use prep_core::options::RunMode;
use prep_engine::Value;

use crate::schema::{INPUT_NUMBER_FIELDS, INTEGER_FIELDS};

/// Sentinel shown for values that could not be computed.
pub const UNKNOWN: &str = "?";

/// Precision rule applied to one output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Raw input echoed back with five decimals.
    Input,
    /// Text passed through unchanged.
    Text,
    /// Truncated to a whole number.
    Integer,
    /// One decimal, four below 1.
    Concentration,
    /// One decimal.
    Ratio,
    /// One decimal, two below the mode's small volume threshold.
    Volume,
}

/// Picks the precision rule for `value` stored under `name`.
pub fn category_for(name: &str, value: &Value) -> Category {
    if INPUT_NUMBER_FIELDS.contains(&name) {
        return Category::Input;
    }
    let number = match value {
        Value::Number(number) => *number,
        Value::Text(_) => return Category::Text,
    };
    if number.is_nan() {
        return Category::Volume;
    }
    if number.is_infinite() {
        return Category::Text;
    }
    if INTEGER_FIELDS.contains(&name) {
        Category::Integer
    } else if name.contains("Concentration") {
        Category::Concentration
    } else if name.contains("Ratio") {
        Category::Ratio
    } else {
        Category::Volume
    }
}

/// Volumes below this keep two decimals.
pub fn small_volume_threshold(mode: RunMode) -> f64 {
    if mode.is_reference() {
        10.0
    } else {
        1.0
    }
}

/// Rounds `value` according to `category`.
///
/// `NaN`, infinities and the text `"NaN"` all render as [`UNKNOWN`].
pub fn sanitize(value: &Value, category: Category, mode: RunMode) -> Value {
    let number = match value {
        Value::Text(text) if text == "NaN" => return Value::from(UNKNOWN),
        Value::Text(text) => return Value::Text(text.clone()),
        Value::Number(number) => *number,
    };
    if !number.is_finite() {
        return Value::from(UNKNOWN);
    }
    let rounded = match category {
        Category::Text => number,
        Category::Input => gaussian_round(number, 5),
        Category::Integer => trunc_int(number),
        Category::Concentration => gaussian_round(number, if number < 1.0 { 4 } else { 1 }),
        Category::Ratio => gaussian_round(number, 1),
        Category::Volume => {
            let digits = if number < small_volume_threshold(mode) { 2 } else { 1 };
            gaussian_round(number, digits)
        }
    };
    Value::Number(rounded)
}

/// Returns `true` when a sanitized volume is nonzero yet below what can be
/// pipetted.
pub fn is_difficult_volume(category: Category, sanitized: &Value, minimum_pipettable: f64) -> bool {
    match (category, sanitized) {
        (Category::Volume, Value::Number(volume)) => *volume != 0.0 && *volume < minimum_pipettable,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: f64) -> Value {
        Value::Number(value)
    }

    #[test]
    fn inputs_win_over_name_rules() {
        assert_eq!(
            category_for("StartingSampleConcentration", &number(1.0)),
            Category::Input
        );
        assert_eq!(
            category_for("StartingSampleConcentration", &number(f64::NAN)),
            Category::Input
        );
        assert_eq!(category_for("AnnealedBasePairLength", &number(10.0)), Category::Integer);
        assert_eq!(category_for("ConcentrationOnPlate", &number(0.5)), Category::Concentration);
        assert_eq!(category_for("PolymeraseTemplateRatio", &number(0.5)), Category::Ratio);
        assert_eq!(category_for("ElutionBuffer", &number(0.5)), Category::Volume);
        assert_eq!(category_for("ElutionBuffer", &number(f64::NAN)), Category::Volume);
        assert_eq!(category_for("ElutionBuffer", &number(f64::INFINITY)), Category::Text);
        assert_eq!(category_for("ShortDescription", &Value::from("P4")), Category::Text);
    }

    #[test]
    fn precision_by_category() {
        let mode = RunMode::Production;
        assert_eq!(sanitize(&number(0.123456), Category::Concentration, mode), number(0.1235));
        assert_eq!(sanitize(&number(12.345), Category::Concentration, mode), number(12.3));
        assert_eq!(sanitize(&number(2.25), Category::Ratio, mode), number(2.2));
        assert_eq!(sanitize(&number(7.9), Category::Integer, mode), number(7.0));
        assert_eq!(sanitize(&number(1.234567), Category::Input, mode), number(1.23457));
        assert_eq!(sanitize(&number(f64::NAN), Category::Volume, mode), Value::from("?"));
        assert_eq!(sanitize(&Value::from("NaN"), Category::Text, mode), Value::from("?"));
    }

    #[test]
    fn volume_threshold_depends_on_mode() {
        assert_eq!(
            sanitize(&number(0.125), Category::Volume, RunMode::Production),
            number(0.12)
        );
        assert_eq!(
            sanitize(&number(5.125), Category::Volume, RunMode::Production),
            number(5.1)
        );
        assert_eq!(
            sanitize(&number(5.125), Category::Volume, RunMode::Reference),
            number(5.12)
        );
    }

    #[test]
    fn difficult_volumes() {
        assert!(is_difficult_volume(Category::Volume, &number(0.5), 1.0));
        assert!(!is_difficult_volume(Category::Volume, &number(0.0), 1.0));
        assert!(!is_difficult_volume(Category::Volume, &number(1.0), 1.0));
        assert!(!is_difficult_volume(Category::Concentration, &number(0.5), 1.0));
        assert!(!is_difficult_volume(Category::Volume, &Value::from("?"), 1.0));
    }
}
