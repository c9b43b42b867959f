//! Field-level validation errors.
//!
//! Forms in the admin UI highlight individual inputs, so validation never stops
//! at the first failure: checks push into a [`ValidationErrors`] collector and
//! the caller converts it into a result once every rule has run.

use serde::Serialize;

/// One failed rule, attached to the (dotted) path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulated validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record a failure when `ok` is false.
    pub fn check(&mut self, ok: bool, field: impl Into<String>, message: impl Into<String>) {
        if !ok {
            self.push(field, message);
        }
    }

    /// Append another collector, prefixing each field path.
    pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        for e in other.errors {
            self.errors.push(FieldError {
                field: format!("{prefix}.{}", e.field),
                message: e.message,
            });
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing failed, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collector_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn display_joins_all_failures() {
        let mut errs = ValidationErrors::new();
        errs.push("name", "cannot be empty");
        errs.check(false, "capacity", "must be positive");
        errs.check(true, "ignored", "never recorded");
        assert_eq!(errs.to_string(), "name: cannot be empty; capacity: must be positive");
        assert!(errs.has_field("capacity"));
        assert!(!errs.has_field("ignored"));
    }

    #[test]
    fn merge_prefixed_nests_paths() {
        let mut outer = ValidationErrors::new();
        outer.merge_prefixed("sessions[0]", ValidationErrors::single("start_time", "bad"));
        assert_eq!(outer.errors()[0].field, "sessions[0].start_time");
    }
}
