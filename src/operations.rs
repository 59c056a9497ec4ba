// 🧮 Numeric Operation Set
// The four arithmetic reductions behind Calculation::get_result()
//
// Each operation receives the raw `inputs` payload exactly as stored, so the
// shape check happens here at computation time and never at construction time.
// A scalar or a string is INVALID; an empty list is a proper (empty) sequence.

use serde_json::Value;
use tracing::debug;

use crate::error::{CalculationError, CalculationResult};

const ADDITION_SHAPE: &str = "Inputs must be a list of numbers";
const SUBTRACTION_SHAPE: &str = "Inputs must be a list of at least two numbers";
const MULTIPLICATION_SHAPE: &str = "Multiplication inputs must be a list of numbers";
const DIVISION_SHAPE: &str = "Division inputs must be a list of at least two numbers";

// ============================================================================
// SHAPE VALIDATION
// ============================================================================

/// Read a payload as an ordered sequence of real numbers.
///
/// Fails with `InvalidInput(message)` when the payload is not an array or any
/// element is not a number.
fn numeric_sequence(inputs: &Value, message: &str) -> CalculationResult<Vec<f64>> {
    let items = inputs
        .as_array()
        .ok_or_else(|| CalculationError::InvalidInput(message.to_string()))?;

    items
        .iter()
        .map(|item| {
            item.as_f64()
                .ok_or_else(|| CalculationError::InvalidInput(message.to_string()))
        })
        .collect()
}

/// Same as `numeric_sequence`, but also demands at least two elements
fn binary_sequence(inputs: &Value, message: &str) -> CalculationResult<Vec<f64>> {
    let numbers = numeric_sequence(inputs, message)?;
    if numbers.len() < 2 {
        return Err(CalculationError::InvalidInput(message.to_string()));
    }
    Ok(numbers)
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Sum of all elements. The empty sequence sums to 0.
pub fn addition(inputs: &Value) -> CalculationResult<f64> {
    let numbers = numeric_sequence(inputs, ADDITION_SHAPE)?;
    let result = numbers.iter().fold(0.0, |acc, x| acc + x);
    debug!(count = numbers.len(), result, "addition computed");
    Ok(result)
}

/// Left-fold minus: `((a0 - a1) - a2) - ...`
pub fn subtraction(inputs: &Value) -> CalculationResult<f64> {
    let numbers = binary_sequence(inputs, SUBTRACTION_SHAPE)?;
    let result = numbers[1..].iter().fold(numbers[0], |acc, x| acc - x);
    debug!(count = numbers.len(), result, "subtraction computed");
    Ok(result)
}

/// Product of all elements, starting from 1. The empty sequence yields 1.
pub fn multiplication(inputs: &Value) -> CalculationResult<f64> {
    let numbers = numeric_sequence(inputs, MULTIPLICATION_SHAPE)?;
    let result = numbers.iter().fold(1.0, |acc, x| acc * x);
    debug!(count = numbers.len(), result, "multiplication computed");
    Ok(result)
}

/// Left-fold divide: `((a0 / a1) / a2) / ...`
///
/// Every divisor is checked before any division happens, so a zero anywhere
/// after the first element fails with `DivisionByZero`.
pub fn division(inputs: &Value) -> CalculationResult<f64> {
    let numbers = binary_sequence(inputs, DIVISION_SHAPE)?;

    if numbers[1..].iter().any(|divisor| *divisor == 0.0) {
        return Err(CalculationError::DivisionByZero);
    }

    let result = numbers[1..].iter().fold(numbers[0], |acc, x| acc / x);
    debug!(count = numbers.len(), result, "division computed");
    Ok(result)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid_message(result: CalculationResult<f64>) -> String {
        match result {
            Err(CalculationError::InvalidInput(msg)) => msg,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_addition_basic() {
        assert_eq!(addition(&json!([1.0, 2.0, 3.0])).unwrap(), 6.0);
        assert_eq!(addition(&json!([5.0])).unwrap(), 5.0);
        assert_eq!(addition(&json!([-1.0, -2.0, 3.0])).unwrap(), 0.0);
    }

    #[test]
    fn test_addition_empty_sums_to_zero() {
        assert_eq!(addition(&json!([])).unwrap(), 0.0);
    }

    #[test]
    fn test_addition_accepts_integer_json_numbers() {
        assert_eq!(addition(&json!([1, 2, 3])).unwrap(), 6.0);
    }

    #[test]
    fn test_addition_rejects_non_sequence() {
        assert_eq!(
            invalid_message(addition(&json!("not-a-list"))),
            "Inputs must be a list of numbers"
        );
        assert!(addition(&json!(4.0)).is_err());
        assert!(addition(&json!([1.0, "two"])).is_err());
        assert!(addition(&Value::Null).is_err());
    }

    #[test]
    fn test_subtraction_left_fold() {
        assert_eq!(subtraction(&json!([10.0, 3.0, 2.0])).unwrap(), 5.0);
        assert_eq!(subtraction(&json!([8.0, 3.0])).unwrap(), 5.0);
        assert_eq!(subtraction(&json!([5.0, 10.0])).unwrap(), -5.0);
    }

    #[test]
    fn test_subtraction_requires_two_elements() {
        assert_eq!(
            invalid_message(subtraction(&json!([5.0]))),
            "Inputs must be a list of at least two numbers"
        );
        assert!(subtraction(&json!([])).is_err());
        assert_eq!(
            invalid_message(subtraction(&json!("not-a-list"))),
            "Inputs must be a list of at least two numbers"
        );
    }

    #[test]
    fn test_multiplication_product() {
        assert_eq!(multiplication(&json!([2.0, 3.0, 4.0])).unwrap(), 24.0);
        assert_eq!(multiplication(&json!([5.0, 0.0, 3.0])).unwrap(), 0.0);
        assert_eq!(multiplication(&json!([-2.0, 3.0, -4.0])).unwrap(), 24.0);
        assert_eq!(multiplication(&json!([7.0])).unwrap(), 7.0);
    }

    #[test]
    fn test_multiplication_empty_is_one() {
        assert_eq!(multiplication(&json!([])).unwrap(), 1.0);
    }

    #[test]
    fn test_multiplication_rejects_non_sequence() {
        assert_eq!(
            invalid_message(multiplication(&json!("not-a-list"))),
            "Multiplication inputs must be a list of numbers"
        );
    }

    #[test]
    fn test_division_left_fold() {
        assert_eq!(division(&json!([24.0, 4.0, 2.0])).unwrap(), 3.0);
        assert_eq!(division(&json!([10.0, 2.0])).unwrap(), 5.0);
        assert_eq!(division(&json!([10.0, 4.0])).unwrap(), 2.5);
        assert_eq!(division(&json!([-24.0, 4.0, -2.0])).unwrap(), 3.0);
    }

    #[test]
    fn test_division_by_zero_any_position() {
        assert!(matches!(
            division(&json!([10.0, 0.0])),
            Err(CalculationError::DivisionByZero)
        ));
        assert!(matches!(
            division(&json!([10.0, 2.0, 0.0])),
            Err(CalculationError::DivisionByZero)
        ));
        assert!(matches!(
            division(&json!([10.0, -0.0, 5.0])),
            Err(CalculationError::DivisionByZero)
        ));
    }

    #[test]
    fn test_division_zero_dividend_is_fine() {
        assert_eq!(division(&json!([0.0, 5.0])).unwrap(), 0.0);
    }

    #[test]
    fn test_division_requires_two_elements() {
        assert_eq!(
            invalid_message(division(&json!([5.0]))),
            "Division inputs must be a list of at least two numbers"
        );
        assert_eq!(
            invalid_message(division(&json!("not-a-list"))),
            "Division inputs must be a list of at least two numbers"
        );
    }

    #[test]
    fn test_shape_error_wins_over_zero_divisor() {
        // [0.0] is too short; the zero is never treated as a divisor
        assert!(matches!(
            division(&json!([0.0])),
            Err(CalculationError::InvalidInput(_))
        ));
    }
}
