// ⚠️ Error Taxonomy
// One error type for the whole library, raised synchronously to the caller

use thiserror::Error;

use crate::schema::ValidationError;

/// Result type alias for calculation operations
pub type CalculationResult<T> = Result<T, CalculationError>;

#[derive(Error, Debug)]
pub enum CalculationError {
    /// Payload is not a proper numeric sequence, or is too short for the operation
    #[error("{0}")]
    InvalidInput(String),

    /// A divisor after the first element was exactly zero
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    /// Factory (or a stored row) named a type outside the known set
    #[error("Unsupported calculation type: {0}")]
    UnsupportedType(String),

    /// Boundary schema rejected one or more request fields
    #[error("{}", join_validation_errors(.0))]
    Validation(Vec<ValidationError>),

    /// Store rejected a record lacking a valid user reference
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl CalculationError {
    /// Translate a rusqlite failure, surfacing constraint failures as integrity violations
    pub(crate) fn from_store(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                CalculationError::IntegrityViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            other => CalculationError::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unsupported_type() {
        let err = CalculationError::UnsupportedType("INVALID".to_string());
        assert_eq!(err.to_string(), "Unsupported calculation type: INVALID");
    }

    #[test]
    fn test_error_display_validation_joins_fields() {
        let err = CalculationError::Validation(vec![
            ValidationError::new("type", "Calculation type cannot be empty"),
            ValidationError::new("inputs", "Field required"),
        ]);
        assert_eq!(
            err.to_string(),
            "type: Calculation type cannot be empty; inputs: Field required"
        );
    }

    #[test]
    fn test_constraint_failure_maps_to_integrity_violation() {
        let failure = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::ConstraintViolation,
                extended_code: 787,
            },
            Some("FOREIGN KEY constraint failed".to_string()),
        );

        match CalculationError::from_store(failure) {
            CalculationError::IntegrityViolation(msg) => {
                assert_eq!(msg, "FOREIGN KEY constraint failed")
            }
            other => panic!("expected IntegrityViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_other_store_errors_stay_database() {
        let err = CalculationError::from_store(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, CalculationError::Database(_)));
    }
}
