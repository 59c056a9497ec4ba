// 🏭 Calculation Factory
// Type name (any case) → Calculation variant
//
// The factory only builds the entity. Persisting it is the caller's job.

use tracing::debug;
use uuid::Uuid;

use crate::entities::{Calculation, CalculationType};
use crate::error::{CalculationError, CalculationResult};

/// Build a calculation of the named type with payload `{"inputs": inputs}`.
///
/// The lookup lowercases `type_name` first. Unknown names fail with
/// `UnsupportedType` carrying the name exactly as given. NaN or infinite
/// inputs fail with a `Validation` error on `inputs.<index>`.
pub fn create(type_name: &str, user_id: Uuid, inputs: Vec<f64>) -> CalculationResult<Calculation> {
    let calculation_type = CalculationType::from_name(type_name)
        .ok_or_else(|| CalculationError::UnsupportedType(type_name.to_string()))?;

    let calc = Calculation::with_inputs(calculation_type, user_id, inputs)?;
    debug!(id = %calc.id(), kind = %calculation_type, "calculation built by factory");

    Ok(calc)
}
