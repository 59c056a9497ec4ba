// Calculation Tracker - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod factory;
pub mod operations;
pub mod schema;

// Re-export commonly used types
pub use config::{DatabaseLocation, Settings};
pub use db::{
    Event,
    open_database, setup_database, insert_user, get_user,
    insert_calculation, get_calculation, get_calculations_by_user,
    update_calculation, update_calculation_inputs, delete_calculation,
    count_calculations, insert_event, get_events_for_entity,
};
pub use entities::{Calculation, CalculationType, User};
pub use error::{CalculationError, CalculationResult};
pub use factory::create;
pub use schema::{
    CalculationCreate, CalculationRead, CalculationResponse, CalculationUpdate,
    ValidationError,
};
