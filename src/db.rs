use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{DatabaseLocation, Settings};
use crate::entities::{Calculation, CalculationType, User};
use crate::error::{CalculationError, CalculationResult};
use crate::schema::{CalculationResponse, CalculationUpdate};

const ACTOR: &str = "calculation_store";

/// Event for audit trail ("Every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// CONNECTION & SCHEMA
// ============================================================================

/// Open the store described by `settings` and make sure the schema exists
pub fn open_database(settings: &Settings) -> CalculationResult<Connection> {
    let conn = match settings.database_location()? {
        DatabaseLocation::Memory => Connection::open_in_memory()?,
        DatabaseLocation::File(path) => Connection::open(&path)?,
    };

    conn.pragma_update(None, "journal_mode", &settings.journal_mode)?;
    setup_database(&conn)?;

    if !settings.foreign_keys {
        warn!("foreign key enforcement disabled by settings");
        conn.pragma_update(None, "foreign_keys", false)?;
    }

    info!(database_url = %settings.database_url, "database opened");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> CalculationResult<()> {
    // Off by default in SQLite; calculations must reference a real user
    conn.pragma_update(None, "foreign_keys", true)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS calculations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            calculation_type VARCHAR(50) NOT NULL,
            input_data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_calculations_user ON calculations(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

// Fixed-width so stored values sort chronologically and round-trip exactly
fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// USERS
// ============================================================================

pub fn insert_user(conn: &Connection, user: &User) -> CalculationResult<()> {
    conn.execute(
        "INSERT INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
        params![
            user.id.to_string(),
            user.username,
            format_timestamp(user.created_at),
        ],
    )
    .map_err(CalculationError::from_store)?;

    info!(user_id = %user.id, username = %user.username, "user added");
    Ok(())
}

pub fn get_user(conn: &Connection, id: Uuid) -> CalculationResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok(User {
                    id: uuid_column(row, 0)?,
                    username: row.get(1)?,
                    created_at: timestamp_column(row, 2)?,
                })
            },
        )
        .optional()?;

    Ok(user)
}

// ============================================================================
// CALCULATIONS
// ============================================================================

const CALCULATION_COLUMNS: &str =
    "id, user_id, calculation_type, input_data, created_at, updated_at";

/// A stored row before its type tag has been checked
struct CalculationRow {
    id: Uuid,
    user_id: Uuid,
    calculation_type: String,
    input_data: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CalculationRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(CalculationRow {
            id: uuid_column(row, 0)?,
            user_id: uuid_column(row, 1)?,
            calculation_type: row.get(2)?,
            input_data: row.get(3)?,
            created_at: timestamp_column(row, 4)?,
            updated_at: timestamp_column(row, 5)?,
        })
    }

    fn into_calculation(self) -> CalculationResult<Calculation> {
        let calculation_type = CalculationType::from_name(&self.calculation_type)
            .ok_or_else(|| CalculationError::UnsupportedType(self.calculation_type.clone()))?;

        // A payload another writer left unreadable behaves like an absent one
        let input_data = match serde_json::from_str::<Value>(&self.input_data) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                warn!(id = %self.id, error = %e, "unreadable input_data, treating as absent");
                None
            }
        };

        Ok(Calculation::from_parts(
            self.id,
            self.user_id,
            calculation_type,
            input_data,
            self.created_at,
            self.updated_at,
        ))
    }

    /// Event payload built from the raw columns, usable even when the tag is unknown
    fn snapshot(&self) -> Value {
        let input_data = serde_json::from_str::<Value>(&self.input_data)
            .unwrap_or_else(|_| Value::String(self.input_data.clone()));

        serde_json::json!({
            "id": self.id,
            "user_id": self.user_id,
            "type": self.calculation_type,
            "input_data": input_data,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }
}

fn calculation_event(conn: &Connection, event_type: &str, calc: &Calculation) -> CalculationResult<()> {
    let event = Event::new(
        event_type,
        "calculation",
        &calc.id().to_string(),
        serde_json::to_value(CalculationResponse::from(calc))?,
        ACTOR,
    );
    insert_event(conn, &event)
}

/// Store a new calculation.
///
/// Fails with `IntegrityViolation` when `user_id` does not reference an
/// existing user (or the id is already taken).
pub fn insert_calculation(conn: &Connection, calc: &Calculation) -> CalculationResult<()> {
    let input_json = serde_json::to_string(&calc.input_data())?;
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO calculations (
            id, user_id, calculation_type, input_data, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            calc.id().to_string(),
            calc.user_id().to_string(),
            calc.calculation_type().as_str(),
            input_json,
            format_timestamp(calc.created_at()),
            format_timestamp(calc.updated_at()),
        ],
    )
    .map_err(|e| {
        warn!(id = %calc.id(), user_id = %calc.user_id(), error = %e, "calculation rejected by store");
        CalculationError::from_store(e)
    })?;

    calculation_event(&tx, "calculation_created", calc)?;
    tx.commit()?;

    info!(id = %calc.id(), kind = %calc.calculation_type(), "calculation stored");
    Ok(())
}

pub fn get_calculation(conn: &Connection, id: Uuid) -> CalculationResult<Option<Calculation>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM calculations WHERE id = ?1", CALCULATION_COLUMNS),
            params![id.to_string()],
            CalculationRow::read,
        )
        .optional()?;

    row.map(CalculationRow::into_calculation).transpose()
}

/// Reverse lookup: every calculation owned by a user, oldest first
pub fn get_calculations_by_user(conn: &Connection, user_id: Uuid) -> CalculationResult<Vec<Calculation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM calculations WHERE user_id = ?1 ORDER BY created_at, rowid",
        CALCULATION_COLUMNS
    ))?;

    let rows = stmt
        .query_map(params![user_id.to_string()], CalculationRow::read)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(CalculationRow::into_calculation).collect()
}

/// Replace a calculation's inputs. Type, owner and `created_at` never change.
pub fn update_calculation_inputs(
    conn: &Connection,
    id: Uuid,
    inputs: Vec<f64>,
) -> CalculationResult<Calculation> {
    update_calculation(conn, id, &CalculationUpdate { inputs: Some(inputs) })
}

/// Apply a validated update request. An empty update returns the record untouched.
pub fn update_calculation(
    conn: &Connection,
    id: Uuid,
    update: &CalculationUpdate,
) -> CalculationResult<Calculation> {
    let tx = conn.unchecked_transaction()?;

    let mut calc = get_calculation(&tx, id)?
        .ok_or_else(|| CalculationError::NotFound(format!("calculation {}", id)))?;

    if !update.apply(&mut calc)? {
        return Ok(calc);
    }

    let input_json = serde_json::to_string(&calc.input_data())?;

    tx.execute(
        "UPDATE calculations SET input_data = ?1, updated_at = ?2 WHERE id = ?3",
        params![input_json, format_timestamp(calc.updated_at()), id.to_string()],
    )
    .map_err(CalculationError::from_store)?;

    calculation_event(&tx, "calculation_updated", &calc)?;
    tx.commit()?;

    info!(id = %id, "calculation updated");
    Ok(calc)
}

/// Delete a calculation. Returns false when nothing matched.
///
/// Works on the raw row, so a record whose stored tag is no longer known can
/// still be removed.
pub fn delete_calculation(conn: &Connection, id: Uuid) -> CalculationResult<bool> {
    let tx = conn.unchecked_transaction()?;

    let row = tx
        .query_row(
            &format!("SELECT {} FROM calculations WHERE id = ?1", CALCULATION_COLUMNS),
            params![id.to_string()],
            CalculationRow::read,
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(false);
    };

    tx.execute("DELETE FROM calculations WHERE id = ?1", params![id.to_string()])?;
    insert_event(
        &tx,
        &Event::new(
            "calculation_deleted",
            "calculation",
            &id.to_string(),
            row.snapshot(),
            ACTOR,
        ),
    )?;
    tx.commit()?;

    info!(id = %id, "calculation deleted");
    Ok(true)
}

pub fn count_calculations(conn: &Connection) -> CalculationResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM calculations", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> CalculationResult<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            format_timestamp(event.timestamp),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, oldest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> CalculationResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: timestamp_column(row, 1)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}
