//! Domain errors.

use thiserror::Error;

/// Validation and invariant failures raised by domain types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A field failed validation.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// What was wrong.
        message: String,
    },

    /// An aggregate ended up in a state it must never reach.
    #[error("Invariant violation in {aggregate}: {invariant} (state: {state})")]
    InvariantViolation {
        /// Aggregate type.
        aggregate: String,
        /// Invariant that failed.
        invariant: String,
        /// Offending state.
        state: String,
    },
}

impl DomainError {
    /// Shorthand for an invalid field value.
    #[must_use]
    pub fn invalid_value(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_names_the_field() {
        let err = DomainError::invalid_value("quantity", "must be at least 1");
        assert_eq!(err.to_string(), "Invalid value for 'quantity': must be at least 1");
    }

    #[test]
    fn invariant_violation_shows_state() {
        let err = DomainError::InvariantViolation {
            aggregate: "Position".to_string(),
            invariant: "filled_qty > 0".to_string(),
            state: "filled_qty=0".to_string(),
        };
        assert!(err.to_string().contains("Position"));
        assert!(err.to_string().contains("filled_qty=0"));
    }
}
