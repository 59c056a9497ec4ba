// Entity Models
//
// Each entity has a stable identity (UUID) that NEVER changes.
// Calculations point at their owning User through that identity.

pub mod calculation;
pub mod user;

pub use calculation::{Calculation, CalculationType};
pub use user::User;
