//! Domain error codes and the message table that describes them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, PrepError};

/// Non-fatal condition flagged during a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Bead insert size outside the supported range (production rules).
    InvalidInsertSizeMagBeadNew,
    /// Bead insert size outside the supported range (reference rules).
    InvalidInsertSizeMagBead,
    /// No standard bucket covers the insert size.
    InvalidInsertSizeStandard,
    /// The selected bucket carries a blanket warning.
    BucketWarning,
    /// At least one volume is below the minimum pipettable volume.
    DifficultPipetting,
    /// Starting concentration below the protocol minimum.
    SampleConcentrationLow,
    /// Titration cannot be solved in non-standard mode.
    NonStandardTitration,
    /// Cell driven annealing cannot be solved in non-standard mode.
    NonStandardByCells,
    /// Forward and re-derived annealing concentrations disagree.
    AnnealingConcentrationSuspect,
    /// Requested cells need more annealed sample than is available.
    TooManyCellsInBinding,
    /// Binding reaction smaller than the minimum reaction volume.
    BindingVolumeLow,
    /// Forward and re-derived binding concentrations disagree.
    BindingConcentrationSuspect,
    /// Binding complex cannot serve the requested cells.
    NotEnoughCellsForBindingComplex,
    /// Binding concentration cannot fill a single chip.
    BindingConcentrationTooLowForOneChip,
    /// Binding concentration cannot fill a single chip when solved in reverse.
    BindingConcentrationTooLowForReverseCalculation,
    /// Non-standard mode requested for a large scale preparation (reference rules).
    NonStandardLargeScale,
    /// Non-standard mode requested for a large scale preparation.
    NonStandardLargeScaleNew,
    /// Non-standard mode requested together with small scale storage.
    NonStandardSmallStorageNotSupported,
    /// Spike-in control used with an untested long insert.
    UntestedControlWithLongInsertSize,
    /// A titration point exceeds what the binding complex supports.
    TitrationConcentrationTooHigh,
    /// A titration point exceeds what the non-standard binding complex supports.
    TitrationConcentrationTooHighNonStandard,
    /// Available sample volume does not cover the annealing reaction.
    NotEnoughAvailableVolume,
    /// Bead complex dilution overflows with a spike-in control.
    ConcentrationOnPlateTooHighWithControl,
    /// Bead complex dilution overflows without a spike-in control.
    ConcentrationOnPlateTooHighWithoutControl,
    /// Unexpected failure of the calculator itself.
    General,
}

impl ErrorCode {
    /// Every code in declaration order.
    pub const ALL: [ErrorCode; 25] = [
        ErrorCode::InvalidInsertSizeMagBeadNew,
        ErrorCode::InvalidInsertSizeMagBead,
        ErrorCode::InvalidInsertSizeStandard,
        ErrorCode::BucketWarning,
        ErrorCode::DifficultPipetting,
        ErrorCode::SampleConcentrationLow,
        ErrorCode::NonStandardTitration,
        ErrorCode::NonStandardByCells,
        ErrorCode::AnnealingConcentrationSuspect,
        ErrorCode::TooManyCellsInBinding,
        ErrorCode::BindingVolumeLow,
        ErrorCode::BindingConcentrationSuspect,
        ErrorCode::NotEnoughCellsForBindingComplex,
        ErrorCode::BindingConcentrationTooLowForOneChip,
        ErrorCode::BindingConcentrationTooLowForReverseCalculation,
        ErrorCode::NonStandardLargeScale,
        ErrorCode::NonStandardLargeScaleNew,
        ErrorCode::NonStandardSmallStorageNotSupported,
        ErrorCode::UntestedControlWithLongInsertSize,
        ErrorCode::TitrationConcentrationTooHigh,
        ErrorCode::TitrationConcentrationTooHighNonStandard,
        ErrorCode::NotEnoughAvailableVolume,
        ErrorCode::ConcentrationOnPlateTooHighWithControl,
        ErrorCode::ConcentrationOnPlateTooHighWithoutControl,
        ErrorCode::General,
    ];

    /// Returns the serialized spelling of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidInsertSizeMagBeadNew => "InvalidInsertSizeMagBeadNew",
            ErrorCode::InvalidInsertSizeMagBead => "InvalidInsertSizeMagBead",
            ErrorCode::InvalidInsertSizeStandard => "InvalidInsertSizeStandard",
            ErrorCode::BucketWarning => "BucketWarning",
            ErrorCode::DifficultPipetting => "DifficultPipetting",
            ErrorCode::SampleConcentrationLow => "SampleConcentrationLow",
            ErrorCode::NonStandardTitration => "NonStandardTitration",
            ErrorCode::NonStandardByCells => "NonStandardByCells",
            ErrorCode::AnnealingConcentrationSuspect => "AnnealingConcentrationSuspect",
            ErrorCode::TooManyCellsInBinding => "TooManyCellsInBinding",
            ErrorCode::BindingVolumeLow => "BindingVolumeLow",
            ErrorCode::BindingConcentrationSuspect => "BindingConcentrationSuspect",
            ErrorCode::NotEnoughCellsForBindingComplex => "NotEnoughCellsForBindingComplex",
            ErrorCode::BindingConcentrationTooLowForOneChip => {
                "BindingConcentrationTooLowForOneChip"
            }
            ErrorCode::BindingConcentrationTooLowForReverseCalculation => {
                "BindingConcentrationTooLowForReverseCalculation"
            }
            ErrorCode::NonStandardLargeScale => "NonStandardLargeScale",
            ErrorCode::NonStandardLargeScaleNew => "NonStandardLargeScaleNew",
            ErrorCode::NonStandardSmallStorageNotSupported => {
                "NonStandardSmallStorageNotSupported"
            }
            ErrorCode::UntestedControlWithLongInsertSize => "UntestedControlWithLongInsertSize",
            ErrorCode::TitrationConcentrationTooHigh => "TitrationConcentrationTooHigh",
            ErrorCode::TitrationConcentrationTooHighNonStandard => {
                "TitrationConcentrationTooHighNonStandard"
            }
            ErrorCode::NotEnoughAvailableVolume => "NotEnoughAvailableVolume",
            ErrorCode::ConcentrationOnPlateTooHighWithControl => {
                "ConcentrationOnPlateTooHighWithControl"
            }
            ErrorCode::ConcentrationOnPlateTooHighWithoutControl => {
                "ConcentrationOnPlateTooHighWithoutControl"
            }
            ErrorCode::General => "General",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message shown for a raised [`ErrorCode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorMessage {
    /// Name of the input field the error should be attached to, or empty.
    #[serde(default)]
    pub coefficient: String,
    /// Short label.
    #[serde(default)]
    pub short_message: String,
    /// Full explanation.
    pub long_message: String,
}

impl ErrorMessage {
    /// Creates a message with the provided parts.
    pub fn new(
        coefficient: impl Into<String>,
        short_message: impl Into<String>,
        long_message: impl Into<String>,
    ) -> Self {
        Self {
            coefficient: coefficient.into(),
            short_message: short_message.into(),
            long_message: long_message.into(),
        }
    }

    /// Message carrying only a long explanation.
    pub fn long_only(long_message: impl Into<String>) -> Self {
        Self::new("", "", long_message)
    }
}

/// Static table of known error codes and their messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorRegistry {
    messages: BTreeMap<ErrorCode, ErrorMessage>,
}

impl ErrorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the message for `code`.
    pub fn insert(&mut self, code: ErrorCode, message: ErrorMessage) {
        self.messages.insert(code, message);
    }

    /// Returns `true` when `code` has a registered message.
    pub fn contains(&self, code: ErrorCode) -> bool {
        self.messages.contains_key(&code)
    }

    /// Looks up the message for `code`.
    ///
    /// A missing entry is a defect in the catalog, reported as
    /// [`PrepError::Registry`].
    pub fn lookup(&self, code: ErrorCode) -> Result<&ErrorMessage, PrepError> {
        self.messages.get(&code).ok_or_else(|| {
            PrepError::Registry(
                ErrorInfo::new("unknown-error-code", "error code is not registered")
                    .with_context("code", code.as_str())
                    .with_hint("add the code to the catalog error table"),
            )
        })
    }

    /// Iterates over the registered codes in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&ErrorCode, &ErrorMessage)> {
        self.messages.iter()
    }

    /// Number of registered codes.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl FromIterator<(ErrorCode, ErrorMessage)> for ErrorRegistry {
    fn from_iter<I: IntoIterator<Item = (ErrorCode, ErrorMessage)>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serialized_name() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }

    #[test]
    fn lookup_reports_missing_code() {
        let registry = ErrorRegistry::new();
        let err = registry.lookup(ErrorCode::BindingVolumeLow).unwrap_err();
        assert!(matches!(err, PrepError::Registry(_)));
        assert_eq!(
            err.info().context.get("code").map(String::as_str),
            Some("BindingVolumeLow")
        );
    }
}
