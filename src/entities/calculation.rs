// 🧾 Calculation Entity - closed set of arithmetic variants
//
// Identity: UUID (never changes)
// Tag: calculation_type (never changes, decides get_result behavior)
// Value: input_data (the only thing that may be replaced after creation)
//
// The result is NOT stored. It is derived fresh from the payload on every call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::CalculationResult;
use crate::operations;
use crate::schema::validate_inputs;

// ============================================================================
// CALCULATION TYPE (the tag)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    /// Sum of all inputs
    Addition,

    /// Left-fold minus, needs at least two inputs
    Subtraction,

    /// Product of all inputs
    Multiplication,

    /// Left-fold divide, needs at least two inputs and no zero divisor
    Division,
}

impl CalculationType {
    pub const ALL: [CalculationType; 4] = [
        CalculationType::Addition,
        CalculationType::Subtraction,
        CalculationType::Multiplication,
        CalculationType::Division,
    ];

    /// Canonical lowercase name, also the value stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationType::Addition => "addition",
            CalculationType::Subtraction => "subtraction",
            CalculationType::Multiplication => "multiplication",
            CalculationType::Division => "division",
        }
    }

    /// Case-insensitive lookup ("ADDITION" and "addition" are the same variant)
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == lower)
    }

    /// Dispatch the raw `inputs` payload to the matching numeric operation
    pub fn compute(&self, inputs: &Value) -> CalculationResult<f64> {
        match self {
            CalculationType::Addition => operations::addition(inputs),
            CalculationType::Subtraction => operations::subtraction(inputs),
            CalculationType::Multiplication => operations::multiplication(inputs),
            CalculationType::Division => operations::division(inputs),
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CALCULATION ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    id: Uuid,

    /// Owning user. The store enforces that it references an existing user.
    user_id: Uuid,

    calculation_type: CalculationType,

    /// Semi-structured payload of the form `{"inputs": [..]}`.
    /// May be absent or malformed; readers must never fail because of it.
    input_data: Option<Value>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Calculation {
    /// Create a new calculation of the given variant with a fresh UUID
    pub fn new(calculation_type: CalculationType, user_id: Uuid, input_data: Option<Value>) -> Self {
        let now = Utc::now();

        Calculation {
            id: Uuid::new_v4(),
            user_id,
            calculation_type,
            input_data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a calculation whose payload is `{"inputs": inputs}`.
    ///
    /// JSON has no NaN or infinity, so non-finite inputs are rejected here
    /// instead of being stored as `null`.
    pub fn with_inputs(
        calculation_type: CalculationType,
        user_id: Uuid,
        inputs: Vec<f64>,
    ) -> CalculationResult<Self> {
        validate_inputs(&inputs)?;
        Ok(Self::new(calculation_type, user_id, Some(json!({ "inputs": inputs }))))
    }

    pub fn addition(user_id: Uuid, input_data: Option<Value>) -> Self {
        Self::new(CalculationType::Addition, user_id, input_data)
    }

    pub fn subtraction(user_id: Uuid, input_data: Option<Value>) -> Self {
        Self::new(CalculationType::Subtraction, user_id, input_data)
    }

    pub fn multiplication(user_id: Uuid, input_data: Option<Value>) -> Self {
        Self::new(CalculationType::Multiplication, user_id, input_data)
    }

    pub fn division(user_id: Uuid, input_data: Option<Value>) -> Self {
        Self::new(CalculationType::Division, user_id, input_data)
    }

    /// Rebuild a calculation from stored columns
    pub(crate) fn from_parts(
        id: Uuid,
        user_id: Uuid,
        calculation_type: CalculationType,
        input_data: Option<Value>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Calculation {
            id,
            user_id,
            calculation_type,
            input_data,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn calculation_type(&self) -> CalculationType {
        self.calculation_type
    }

    pub fn input_data(&self) -> Option<&Value> {
        self.input_data.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The `inputs` list from the payload.
    ///
    /// Never fails: an absent payload, a missing `inputs` key, a non-list value,
    /// or a list holding anything other than numbers all read as `[]`.
    pub fn inputs(&self) -> Vec<f64> {
        self.raw_inputs()
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<f64>>>())
            .unwrap_or_default()
    }

    /// Compute the result for this variant from the current payload.
    ///
    /// A missing `inputs` key counts as an empty sequence; anything present is
    /// handed to the operation unchanged so that it can reject a bad shape.
    pub fn get_result(&self) -> CalculationResult<f64> {
        match self.raw_inputs() {
            Some(raw) => self.calculation_type.compute(raw),
            None => self.calculation_type.compute(&Value::Array(Vec::new())),
        }
    }

    /// Replace the payload with `{"inputs": inputs}` and refresh `updated_at`.
    /// Non-finite inputs leave the calculation untouched.
    pub fn set_inputs(&mut self, inputs: Vec<f64>) -> CalculationResult<()> {
        validate_inputs(&inputs)?;
        self.input_data = Some(json!({ "inputs": inputs }));
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `input_data.inputs`, with an explicit JSON null treated as missing
    fn raw_inputs(&self) -> Option<&Value> {
        self.input_data
            .as_ref()
            .and_then(|data| data.get("inputs"))
            .filter(|raw| !raw.is_null())
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Calculation(type={}, inputs={:?})>",
            self.calculation_type,
            self.inputs()
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalculationError;

    fn user() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn test_calculation_creation() {
        let owner = user();
        let calc = Calculation::addition(owner, Some(json!({ "inputs": [1.0, 2.0, 3.0] })));

        assert!(!calc.id().is_nil());
        assert_eq!(calc.user_id(), owner);
        assert_eq!(calc.calculation_type(), CalculationType::Addition);
        assert_eq!(calc.inputs(), vec![1.0, 2.0, 3.0]);
        assert_eq!(calc.created_at(), calc.updated_at());
        assert_eq!(calc.get_result().unwrap(), 6.0);
    }

    #[test]
    fn test_each_variant_dispatches_to_its_operation() {
        let data = || Some(json!({ "inputs": [24.0, 4.0, 2.0] }));

        assert_eq!(Calculation::addition(user(), data()).get_result().unwrap(), 30.0);
        assert_eq!(Calculation::subtraction(user(), data()).get_result().unwrap(), 18.0);
        assert_eq!(Calculation::multiplication(user(), data()).get_result().unwrap(), 192.0);
        assert_eq!(Calculation::division(user(), data()).get_result().unwrap(), 3.0);
    }

    #[test]
    fn test_inputs_none_data() {
        let calc = Calculation::addition(user(), None);
        assert_eq!(calc.inputs(), Vec::<f64>::new());
        assert_eq!(calc.get_result().unwrap(), 0.0);
    }

    #[test]
    fn test_inputs_empty_data() {
        let calc = Calculation::addition(user(), Some(json!({})));
        assert!(calc.inputs().is_empty());
    }

    #[test]
    fn test_inputs_malformed_payload_reads_empty() {
        let calc = Calculation::addition(user(), Some(json!({ "inputs": "not-a-list" })));
        assert!(calc.inputs().is_empty());

        let calc = Calculation::addition(user(), Some(json!({ "inputs": [1.0, "x"] })));
        assert!(calc.inputs().is_empty());

        let calc = Calculation::addition(user(), Some(json!({ "inputs": null })));
        assert!(calc.inputs().is_empty());

        let calc = Calculation::addition(user(), Some(json!([1.0, 2.0])));
        assert!(calc.inputs().is_empty());
    }

    #[test]
    fn test_get_result_rejects_malformed_payload() {
        let calc = Calculation::addition(user(), Some(json!({ "inputs": "not-a-list" })));
        match calc.get_result() {
            Err(CalculationError::InvalidInput(msg)) => {
                assert_eq!(msg, "Inputs must be a list of numbers")
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_inputs_is_too_short_for_subtraction() {
        let calc = Calculation::subtraction(user(), None);
        assert!(matches!(calc.get_result(), Err(CalculationError::InvalidInput(_))));
    }

    #[test]
    fn test_set_inputs_refreshes_updated_at_only() {
        let mut calc =
            Calculation::with_inputs(CalculationType::Division, user(), vec![10.0, 2.0]).unwrap();
        let id = calc.id();
        let created = calc.created_at();

        calc.set_inputs(vec![9.0, 3.0]).unwrap();

        assert_eq!(calc.id(), id);
        assert_eq!(calc.created_at(), created);
        assert!(calc.updated_at() >= created);
        assert_eq!(calc.calculation_type(), CalculationType::Division);
        assert_eq!(calc.get_result().unwrap(), 3.0);
    }

    #[test]
    fn test_with_inputs_rejects_non_finite() {
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            match Calculation::with_inputs(CalculationType::Addition, user(), vec![1.0, bad]) {
                Err(CalculationError::Validation(errors)) => {
                    assert_eq!(errors.len(), 1);
                    assert_eq!(errors[0].field, "inputs.1");
                }
                other => panic!("expected Validation, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_set_inputs_rejects_non_finite_and_keeps_payload() {
        let mut calc =
            Calculation::with_inputs(CalculationType::Multiplication, user(), vec![2.0, 3.0]).unwrap();
        let before = calc.clone();

        assert!(matches!(
            calc.set_inputs(vec![2.0, f64::NAN]),
            Err(CalculationError::Validation(_))
        ));
        assert_eq!(calc, before);
        assert_eq!(calc.inputs(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_calculation_display() {
        let calc = Calculation::addition(user(), Some(json!({ "inputs": [1.0, 2.0] })));
        let repr = calc.to_string();

        assert!(repr.contains("addition"));
        assert!(repr.contains("[1.0, 2.0]"));
    }

    #[test]
    fn test_type_from_name_is_case_insensitive() {
        assert_eq!(CalculationType::from_name("ADDITION"), Some(CalculationType::Addition));
        assert_eq!(CalculationType::from_name("Division"), Some(CalculationType::Division));
        assert_eq!(CalculationType::from_name("modulo"), None);
        assert_eq!(CalculationType::from_name(""), None);
    }

    #[test]
    fn test_type_serializes_lowercase() {
        let value = serde_json::to_value(CalculationType::Multiplication).unwrap();
        assert_eq!(value, json!("multiplication"));
    }
}
