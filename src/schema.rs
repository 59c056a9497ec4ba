// 📐 Shape Layer - Boundary Schemas
// Request/response shapes for calculations, decoupled from the stored entity
//
// Every field is checked and all failures are reported together, each naming
// the offending field. Note the type check here is an EXACT match on the
// canonical lowercase names, unlike the factory's case-insensitive lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::entities::{Calculation, CalculationType};
use crate::error::{CalculationError, CalculationResult};
use crate::factory;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn finish<T>(value: Option<T>, errors: Vec<ValidationError>) -> CalculationResult<T> {
    match value {
        Some(value) if errors.is_empty() => Ok(value),
        _ => Err(CalculationError::Validation(errors)),
    }
}

// ============================================================================
// FIELD VALIDATORS
// ============================================================================

/// The canonical type names accepted at the boundary
pub fn valid_types() -> Vec<&'static str> {
    CalculationType::ALL.iter().map(|kind| kind.as_str()).collect()
}

/// Check a type name: not blank, and exactly one of the canonical names
pub fn validate_type(value: &str) -> Result<CalculationType, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("type", "Calculation type cannot be empty"));
    }

    CalculationType::ALL
        .into_iter()
        .find(|kind| kind.as_str() == value)
        .ok_or_else(|| {
            ValidationError::new(
                "type",
                format!(
                    "Invalid calculation type: {}. Must be one of {:?}",
                    value,
                    valid_types()
                ),
            )
        })
}

/// Reject NaN and infinities, which JSON payloads cannot carry
pub fn validate_inputs(inputs: &[f64]) -> CalculationResult<()> {
    let errors: Vec<ValidationError> = inputs
        .iter()
        .enumerate()
        .filter(|(_, number)| !number.is_finite())
        .map(|(index, _)| {
            ValidationError::new(format!("inputs.{}", index), "Input should be a finite number")
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CalculationError::Validation(errors))
    }
}

fn as_object(value: &Value) -> CalculationResult<&Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        CalculationError::Validation(vec![ValidationError::new(
            "body",
            "Input should be a valid object",
        )])
    })
}

/// Look up a required field; JSON null counts as missing
fn required<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a Value> {
    match obj.get(field) {
        Some(value) if !value.is_null() => Some(value),
        _ => {
            errors.push(ValidationError::new(field, "Field required"));
            None
        }
    }
}

fn parse_type(value: &Value, errors: &mut Vec<ValidationError>) -> Option<String> {
    let Some(name) = value.as_str() else {
        errors.push(ValidationError::new("type", "Input should be a valid string"));
        return None;
    };

    match validate_type(name) {
        Ok(_) => Some(name.to_string()),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

/// Parse a list of numbers, reporting each bad element as `inputs.<index>`
fn parse_inputs(value: &Value, errors: &mut Vec<ValidationError>) -> Option<Vec<f64>> {
    let Some(items) = value.as_array() else {
        errors.push(ValidationError::new("inputs", "Input should be a valid list"));
        return None;
    };

    let mut numbers = Vec::with_capacity(items.len());
    let mut valid = true;

    for (index, item) in items.iter().enumerate() {
        match item.as_f64() {
            Some(number) => numbers.push(number),
            None => {
                valid = false;
                errors.push(ValidationError::new(
                    format!("inputs.{}", index),
                    "Input should be a valid number",
                ));
            }
        }
    }

    valid.then_some(numbers)
}

fn parse_uuid(field: &str, value: &Value, errors: &mut Vec<ValidationError>) -> Option<Uuid> {
    match value.as_str().map(Uuid::parse_str) {
        Some(Ok(id)) => Some(id),
        _ => {
            errors.push(ValidationError::new(field, "Input should be a valid UUID"));
            None
        }
    }
}

// ============================================================================
// CREATE
// ============================================================================

/// Request to create a calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct CalculationCreate {
    #[serde(rename = "type")]
    pub calculation_type: String,
    pub inputs: Vec<f64>,
    pub user_id: Uuid,
}

impl CalculationCreate {
    pub fn new(calculation_type: &str, inputs: Vec<f64>, user_id: Uuid) -> CalculationResult<Self> {
        validate_type(calculation_type).map_err(|e| CalculationError::Validation(vec![e]))?;
        validate_inputs(&inputs)?;

        Ok(CalculationCreate {
            calculation_type: calculation_type.to_string(),
            inputs,
            user_id,
        })
    }

    /// Build the entity through the factory (not persisted)
    pub fn into_calculation(self) -> CalculationResult<Calculation> {
        factory::create(&self.calculation_type, self.user_id, self.inputs)
    }
}

impl TryFrom<Value> for CalculationCreate {
    type Error = CalculationError;

    fn try_from(value: Value) -> CalculationResult<Self> {
        let obj = as_object(&value)?;
        let mut errors = Vec::new();

        let calculation_type =
            required(obj, "type", &mut errors).and_then(|v| parse_type(v, &mut errors));
        let inputs =
            required(obj, "inputs", &mut errors).and_then(|v| parse_inputs(v, &mut errors));
        let user_id =
            required(obj, "user_id", &mut errors).and_then(|v| parse_uuid("user_id", v, &mut errors));

        let request = match (calculation_type, inputs, user_id) {
            (Some(calculation_type), Some(inputs), Some(user_id)) => Some(CalculationCreate {
                calculation_type,
                inputs,
                user_id,
            }),
            _ => None,
        };

        finish(request, errors)
    }
}

// ============================================================================
// READ
// ============================================================================

/// Minimal read shape: the type and its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct CalculationRead {
    #[serde(rename = "type")]
    pub calculation_type: String,
    pub inputs: Vec<f64>,
}

impl From<&Calculation> for CalculationRead {
    fn from(calc: &Calculation) -> Self {
        CalculationRead {
            calculation_type: calc.calculation_type().as_str().to_string(),
            inputs: calc.inputs(),
        }
    }
}

impl TryFrom<Value> for CalculationRead {
    type Error = CalculationError;

    fn try_from(value: Value) -> CalculationResult<Self> {
        let obj = as_object(&value)?;
        let mut errors = Vec::new();

        let calculation_type =
            required(obj, "type", &mut errors).and_then(|v| parse_type(v, &mut errors));
        let inputs =
            required(obj, "inputs", &mut errors).and_then(|v| parse_inputs(v, &mut errors));

        let read = calculation_type
            .zip(inputs)
            .map(|(calculation_type, inputs)| CalculationRead {
                calculation_type,
                inputs,
            });

        finish(read, errors)
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// Fields an update may never touch
const IMMUTABLE_FIELDS: [&str; 5] = ["id", "user_id", "type", "created_at", "updated_at"];

/// Request to update a calculation. Only `inputs` can change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct CalculationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<f64>>,
}

impl CalculationUpdate {
    /// Apply to an entity. Returns whether anything changed.
    pub fn apply(&self, calc: &mut Calculation) -> CalculationResult<bool> {
        match &self.inputs {
            Some(inputs) => {
                calc.set_inputs(inputs.clone())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl TryFrom<Value> for CalculationUpdate {
    type Error = CalculationError;

    fn try_from(value: Value) -> CalculationResult<Self> {
        let obj = as_object(&value)?;
        let mut errors = Vec::new();

        for field in IMMUTABLE_FIELDS {
            if obj.contains_key(field) {
                errors.push(ValidationError::new(field, "Field cannot be changed by an update"));
            }
        }

        let inputs = match obj.get("inputs") {
            None | Some(Value::Null) => Some(None),
            Some(raw) => parse_inputs(raw, &mut errors).map(Some),
        };

        finish(inputs.map(|inputs| CalculationUpdate { inputs }), errors)
    }
}

// ============================================================================
// RESPONSE
// ============================================================================

/// Read-only projection of a stored calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Deserializes only from the exact canonical lowercase names
    #[serde(rename = "type")]
    pub calculation_type: CalculationType,
    pub inputs: Vec<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Calculation> for CalculationResponse {
    fn from(calc: &Calculation) -> Self {
        CalculationResponse {
            id: calc.id(),
            user_id: calc.user_id(),
            calculation_type: calc.calculation_type(),
            inputs: calc.inputs(),
            created_at: calc.created_at(),
            updated_at: calc.updated_at(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
