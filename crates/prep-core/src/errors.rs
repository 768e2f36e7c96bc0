//! Failures of the calculator machinery.
//!
//! A [`PrepError`] means the engine could not run at all: an unreadable
//! bucket catalog, a dependency graph with a cycle, a domain code missing
//! from the message registry. Sample conditions such as a low
//! concentration never surface here; they become
//! [`crate::codes::ErrorCode`] entries on the sample and computation
//! carries on.
//!
//! Most failures point at one place in the calculation: a scheduled step,
//! the field it touched, or the file a catalog or config was read from.
//! Those locations have dedicated builders ([`ErrorInfo::at_step`],
//! [`ErrorInfo::on_field`], [`ErrorInfo::at_path`]) and lead the rendered
//! message, so a step writing a field it never declared reads as
//!
//! ```text
//! schedule error: [undeclared-write] step prepare_errors, field Sample(TotalVolumeOfBindingReaction): step wrote a field it does not declare
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context key naming the scheduled step that failed.
pub const STEP: &str = "step";
/// Context key naming the record field involved.
pub const FIELD: &str = "field";
/// Context key holding a catalog or config file path.
pub const PATH: &str = "path";

const LOCATION_KEYS: [&str; 3] = [STEP, FIELD, PATH];

/// Code, message and location of a machinery failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Kebab-case code such as `bucket-overlap` or `schedule-cycle`.
    pub code: String,
    /// What went wrong, without the location.
    pub message: String,
    /// Location keys ([`STEP`], [`FIELD`], [`PATH`]) plus any extra detail,
    /// e.g. the overlapping bucket names or the number of selected samples.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// How the caller might fix it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no location yet.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Names the scheduled step that failed.
    pub fn at_step(self, step: impl Into<String>) -> Self {
        self.with_context(STEP, step)
    }

    /// Names the record field the failure concerns.
    pub fn on_field(self, field: impl Into<String>) -> Self {
        self.with_context(FIELD, field)
    }

    /// Records the file a catalog or config was read from.
    pub fn at_path(self, path: impl Into<String>) -> Self {
        self.with_context(PATH, path)
    }

    /// Adds free-form detail. Location keys are better set through
    /// [`Self::at_step`], [`Self::on_field`] and [`Self::at_path`].
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets the remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Step recorded by [`Self::at_step`].
    pub fn step(&self) -> Option<&str> {
        self.context.get(STEP).map(String::as_str)
    }

    /// Field recorded by [`Self::on_field`].
    pub fn field(&self) -> Option<&str> {
        self.context.get(FIELD).map(String::as_str)
    }

    /// Path recorded by [`Self::at_path`].
    pub fn path(&self) -> Option<&str> {
        self.context.get(PATH).map(String::as_str)
    }
}

/// Canonical error type for the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum PrepError {
    /// Bucket catalog loading and validation.
    #[error("catalog error: {0}")]
    Catalog(ErrorInfo),
    /// Building or running a step schedule.
    #[error("schedule error: {0}")]
    Schedule(ErrorInfo),
    /// A domain code was raised without a registered message.
    #[error("registry error: {0}")]
    Registry(ErrorInfo),
    /// Caller input that cannot be used, such as an empty master-mix selection.
    #[error("input error: {0}")]
    Input(ErrorInfo),
    /// Unreadable or invalid calculator config.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// JSON or YAML encoding failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

/// Renders `[code] step s, field f, path p: message (extra=detail) hint: h`,
/// leaving out whatever is unset.
impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code)?;
        let located: Vec<String> = LOCATION_KEYS
            .iter()
            .filter_map(|key| self.context.get(*key).map(|value| format!("{key} {value}")))
            .collect();
        if !located.is_empty() {
            write!(f, " {}", located.join(", "))?;
        }
        write!(f, ": {}", self.message)?;
        let extra: Vec<String> = self
            .context
            .iter()
            .filter(|(key, _)| !LOCATION_KEYS.contains(&key.as_str()))
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        if !extra.is_empty() {
            write!(f, " ({})", extra.join(", "))?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " hint: {hint}")?;
        }
        Ok(())
    }
}

impl PrepError {
    /// Payload shared by every family.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            PrepError::Catalog(info)
            | PrepError::Schedule(info)
            | PrepError::Registry(info)
            | PrepError::Input(info)
            | PrepError::Config(info)
            | PrepError::Serde(info) => info,
        }
    }
}
