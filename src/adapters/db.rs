use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::{NewSlot, NewZone, SessionRecord, SlotRecord, ZoneRecord};
use crate::domain::slot_status::SlotStatus;

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS parking_zones (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    hourly_rate INTEGER NOT NULL CHECK (hourly_rate >= 0),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS parking_slots (
    id TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    sensor_id TEXT NOT NULL UNIQUE,
    zone_id TEXT NOT NULL REFERENCES parking_zones (id),
    status TEXT NOT NULL DEFAULT 'unknown',
    last_updated TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS parking_sessions (
    id TEXT PRIMARY KEY,
    slot_id TEXT NOT NULL REFERENCES parking_slots (id),
    user_id TEXT,
    entry_time TEXT NOT NULL,
    exit_time TEXT,
    amount_due INTEGER,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_parking_sessions_entry_time_desc
ON parking_sessions (entry_time DESC);

CREATE UNIQUE INDEX IF NOT EXISTS idx_parking_sessions_active_slot
ON parking_sessions (slot_id) WHERE is_active = 1;
"#,
)];

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    let connection = Connection::open(path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    Ok(connection)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

pub fn insert_zone(
    connection: &Connection,
    new_zone: &NewZone,
    created_at: &str,
) -> Result<ZoneRecord, DbError> {
    let id = Uuid::new_v4().to_string();
    connection.execute(
        "INSERT INTO parking_zones (id, name, hourly_rate, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, new_zone.name, new_zone.hourly_rate, created_at],
    )?;

    Ok(ZoneRecord {
        id,
        name: new_zone.name.clone(),
        hourly_rate: new_zone.hourly_rate,
        created_at: created_at.to_string(),
    })
}

pub fn list_zones(connection: &Connection) -> Result<Vec<ZoneRecord>, DbError> {
    let mut statement = connection.prepare(
        "SELECT id, name, hourly_rate, created_at
         FROM parking_zones
         ORDER BY name ASC",
    )?;

    let rows = statement.query_map([], |row| {
        Ok(ZoneRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            hourly_rate: row.get(2)?,
            created_at: row.get(3)?,
        })
    })?;

    let mut zones = Vec::new();
    for row in rows {
        zones.push(row?);
    }

    Ok(zones)
}

pub fn insert_slot(
    connection: &Connection,
    new_slot: &NewSlot,
    last_updated: &str,
) -> Result<SlotRecord, DbError> {
    let id = Uuid::new_v4().to_string();
    connection.execute(
        "INSERT INTO parking_slots (id, label, sensor_id, zone_id, status, last_updated)
         VALUES (?1, ?2, ?3, ?4, 'unknown', ?5)",
        params![
            id,
            new_slot.label,
            new_slot.sensor_id,
            new_slot.zone_id,
            last_updated
        ],
    )?;

    Ok(SlotRecord {
        id,
        label: new_slot.label.clone(),
        sensor_id: new_slot.sensor_id.clone(),
        zone_id: new_slot.zone_id.clone(),
        status: SlotStatus::Unknown,
        last_updated: last_updated.to_string(),
    })
}

const SLOT_COLUMNS: &str = "id, label, sensor_id, zone_id, status, last_updated";

fn map_slot_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SlotRecord> {
    let raw_status: String = row.get(4)?;
    let status = SlotStatus::parse(&raw_status).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })?;

    Ok(SlotRecord {
        id: row.get(0)?,
        label: row.get(1)?,
        sensor_id: row.get(2)?,
        zone_id: row.get(3)?,
        status,
        last_updated: row.get(5)?,
    })
}

pub fn find_slot_by_sensor(
    connection: &Connection,
    sensor_id: &str,
) -> Result<Option<SlotRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {SLOT_COLUMNS} FROM parking_slots WHERE sensor_id = ?1"
    ))?;

    let slot = statement
        .query_row(params![sensor_id], map_slot_row)
        .optional()?;

    Ok(slot)
}

pub fn get_slot(connection: &Connection, slot_id: &str) -> Result<Option<SlotRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {SLOT_COLUMNS} FROM parking_slots WHERE id = ?1"
    ))?;

    let slot = statement
        .query_row(params![slot_id], map_slot_row)
        .optional()?;

    Ok(slot)
}

pub fn list_slots(connection: &Connection) -> Result<Vec<SlotRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {SLOT_COLUMNS} FROM parking_slots ORDER BY label ASC"
    ))?;

    let rows = statement.query_map([], map_slot_row)?;

    let mut slots = Vec::new();
    for row in rows {
        slots.push(row?);
    }

    Ok(slots)
}

pub fn update_slot_status(
    connection: &Connection,
    slot_id: &str,
    status: SlotStatus,
    last_updated: &str,
) -> Result<Option<SlotRecord>, DbError> {
    let updated = connection.execute(
        "UPDATE parking_slots SET status = ?1, last_updated = ?2 WHERE id = ?3",
        params![status.as_str(), last_updated, slot_id],
    )?;

    if updated == 0 {
        return Ok(None);
    }

    get_slot(connection, slot_id)
}

pub fn touch_slot(
    connection: &Connection,
    slot_id: &str,
    last_updated: &str,
) -> Result<bool, DbError> {
    let updated = connection.execute(
        "UPDATE parking_slots SET last_updated = ?1 WHERE id = ?2",
        params![last_updated, slot_id],
    )?;

    Ok(updated > 0)
}

const SESSION_COLUMNS: &str =
    "id, slot_id, user_id, entry_time, exit_time, amount_due, is_active, created_at";

fn map_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        slot_id: row.get(1)?,
        user_id: row.get(2)?,
        entry_time: row.get(3)?,
        exit_time: row.get(4)?,
        amount_due: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn insert_session(
    connection: &Connection,
    slot_id: &str,
    user_id: Option<&str>,
    entry_time: &str,
) -> Result<SessionRecord, DbError> {
    let id = Uuid::new_v4().to_string();
    connection.execute(
        "INSERT INTO parking_sessions (id, slot_id, user_id, entry_time, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        params![id, slot_id, user_id, entry_time, entry_time],
    )?;

    Ok(SessionRecord {
        id,
        slot_id: slot_id.to_string(),
        user_id: user_id.map(ToString::to_string),
        entry_time: entry_time.to_string(),
        exit_time: None,
        amount_due: None,
        is_active: true,
        created_at: entry_time.to_string(),
    })
}

pub fn find_active_session(
    connection: &Connection,
    slot_id: &str,
) -> Result<Option<SessionRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {SESSION_COLUMNS}
         FROM parking_sessions
         WHERE slot_id = ?1 AND is_active = 1
         ORDER BY entry_time DESC
         LIMIT 1"
    ))?;

    let session = statement
        .query_row(params![slot_id], map_session_row)
        .optional()?;

    Ok(session)
}

pub fn get_session(
    connection: &Connection,
    session_id: &str,
) -> Result<Option<SessionRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM parking_sessions WHERE id = ?1"
    ))?;

    let session = statement
        .query_row(params![session_id], map_session_row)
        .optional()?;

    Ok(session)
}

/// Closes an active session. Returns `None` when the session does not exist
/// or is already closed; a session is mutated exactly once after creation.
pub fn close_session(
    connection: &Connection,
    session_id: &str,
    exit_time: &str,
    amount_due: i64,
) -> Result<Option<SessionRecord>, DbError> {
    let updated = connection.execute(
        "UPDATE parking_sessions
         SET exit_time = ?1, amount_due = ?2, is_active = 0
         WHERE id = ?3 AND is_active = 1",
        params![exit_time, amount_due, session_id],
    )?;

    if updated == 0 {
        return Ok(None);
    }

    get_session(connection, session_id)
}

pub fn list_sessions(
    connection: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<SessionRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {SESSION_COLUMNS}
         FROM parking_sessions
         ORDER BY entry_time DESC, id DESC
         LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = statement.query_map(params![i64::from(limit), i64::from(offset)], |row| {
        map_session_row(row)
    })?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row?);
    }

    Ok(sessions)
}

pub fn list_active_sessions(connection: &Connection) -> Result<Vec<SessionRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {SESSION_COLUMNS}
         FROM parking_sessions
         WHERE is_active = 1
         ORDER BY entry_time DESC, id DESC"
    ))?;

    let rows = statement.query_map([], map_session_row)?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row?);
    }

    Ok(sessions)
}

pub fn hourly_rate_for_slot(
    connection: &Connection,
    slot_id: &str,
) -> Result<Option<i64>, DbError> {
    let mut statement = connection.prepare(
        "SELECT z.hourly_rate
         FROM parking_slots s
         JOIN parking_zones z ON z.id = s.zone_id
         WHERE s.id = ?1",
    )?;

    let rate = statement
        .query_row(params![slot_id], |row| row.get(0))
        .optional()?;

    Ok(rate)
}

/// Provisions the demo layout used by the simulator and the test databases:
/// three zones of five slots each, sensor ids S-A1..S-C5. Skipped when zones
/// already exist.
pub fn seed_demo_layout(connection: &Connection, created_at: &str) -> Result<(), DbError> {
    let zone_count: i64 =
        connection.query_row("SELECT COUNT(*) FROM parking_zones", [], |row| row.get(0))?;
    if zone_count > 0 {
        return Ok(());
    }

    let zones = [
        ("Zone A - Main Gate", 5000_i64, 'A'),
        ("Zone B - Library", 3000_i64, 'B'),
        ("Zone C - Dormitory", 2000_i64, 'C'),
    ];

    for (name, hourly_rate, prefix) in zones {
        let zone = insert_zone(
            connection,
            &NewZone {
                name: name.to_string(),
                hourly_rate,
            },
            created_at,
        )?;

        for number in 1..=5 {
            insert_slot(
                connection,
                &NewSlot {
                    label: format!("{prefix}{number}"),
                    sensor_id: format!("S-{prefix}{number}"),
                    zone_id: zone.id.clone(),
                },
                created_at,
            )?;
        }
    }

    Ok(())
}
