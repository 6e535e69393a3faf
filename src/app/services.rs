use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::domain::models::{SessionRecord, SlotRecord, ZoneRecord};
use crate::domain::slot_status::SlotStatus;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned")]
    LockPoisoned,
    #[error("database operation failed: {0}")]
    Database(#[from] DbError),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("conflicting write: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Transient failures are the caller's to retry; the rest are terminal
    /// for the request that caused them.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LockPoisoned | Self::Database(_))
    }
}

pub trait SlotStore: Send + Sync {
    fn find_slot_by_sensor(&self, sensor_id: &str) -> Result<Option<SlotRecord>, StoreError>;
    fn list_slots(&self) -> Result<Vec<SlotRecord>, StoreError>;
    fn update_slot_status(
        &self,
        slot_id: &str,
        status: SlotStatus,
        last_updated: &str,
    ) -> Result<SlotRecord, StoreError>;
    fn touch_slot(&self, slot_id: &str, last_updated: &str) -> Result<(), StoreError>;
}

pub trait SessionStore: Send + Sync {
    fn create_session(
        &self,
        slot_id: &str,
        user_id: Option<&str>,
        entry_time: &str,
    ) -> Result<SessionRecord, StoreError>;
    fn find_active_session(&self, slot_id: &str) -> Result<Option<SessionRecord>, StoreError>;
    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;
    fn close_session(
        &self,
        session_id: &str,
        exit_time: &str,
        amount_due: i64,
    ) -> Result<SessionRecord, StoreError>;
    fn list_sessions(&self, limit: u32, offset: u32) -> Result<Vec<SessionRecord>, StoreError>;
    fn list_active_sessions(&self) -> Result<Vec<SessionRecord>, StoreError>;
}

pub trait ZoneDirectory: Send + Sync {
    fn hourly_rate_for_slot(&self, slot_id: &str) -> Result<Option<i64>, StoreError>;
    fn list_zones(&self) -> Result<Vec<ZoneRecord>, StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    Open {
        user_id: Option<String>,
        entry_time: String,
    },
    Close {
        session_id: String,
        exit_time: String,
        amount_due: i64,
    },
}

/// The full set of writes one sensor report produces. `new_status` of `None`
/// means the report was an idempotent repeat and only the slot's last-seen
/// timestamp moves.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEffects {
    pub slot_id: String,
    pub new_status: Option<SlotStatus>,
    pub observed_at: String,
    pub session: Option<SessionEffect>,
}

pub trait ParkingStore: SlotStore + SessionStore + ZoneDirectory {
    /// Applies the slot write and the optional session write as one unit:
    /// both land or neither does. Returns the session the report opened or
    /// closed, if any.
    fn apply_transition(
        &self,
        effects: &TransitionEffects,
    ) -> Result<Option<SessionRecord>, StoreError>;
}

#[derive(Clone)]
pub struct SqliteParkingStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteParkingStore {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, StoreError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?;
        op(&connection).map_err(StoreError::from)
    }
}

impl SlotStore for SqliteParkingStore {
    fn find_slot_by_sensor(&self, sensor_id: &str) -> Result<Option<SlotRecord>, StoreError> {
        self.with_connection(|connection| db::find_slot_by_sensor(connection, sensor_id))
    }

    fn list_slots(&self) -> Result<Vec<SlotRecord>, StoreError> {
        self.with_connection(db::list_slots)
    }

    fn update_slot_status(
        &self,
        slot_id: &str,
        status: SlotStatus,
        last_updated: &str,
    ) -> Result<SlotRecord, StoreError> {
        self.with_connection(|connection| {
            db::update_slot_status(connection, slot_id, status, last_updated)
        })?
        .ok_or_else(|| StoreError::NotFound(format!("slot {slot_id}")))
    }

    fn touch_slot(&self, slot_id: &str, last_updated: &str) -> Result<(), StoreError> {
        let touched =
            self.with_connection(|connection| db::touch_slot(connection, slot_id, last_updated))?;
        if !touched {
            return Err(StoreError::NotFound(format!("slot {slot_id}")));
        }
        Ok(())
    }
}

impl SessionStore for SqliteParkingStore {
    fn create_session(
        &self,
        slot_id: &str,
        user_id: Option<&str>,
        entry_time: &str,
    ) -> Result<SessionRecord, StoreError> {
        self.with_connection(|connection| {
            db::insert_session(connection, slot_id, user_id, entry_time)
        })
    }

    fn find_active_session(&self, slot_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.with_connection(|connection| db::find_active_session(connection, slot_id))
    }

    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.with_connection(|connection| db::get_session(connection, session_id))
    }

    fn close_session(
        &self,
        session_id: &str,
        exit_time: &str,
        amount_due: i64,
    ) -> Result<SessionRecord, StoreError> {
        self.with_connection(|connection| {
            db::close_session(connection, session_id, exit_time, amount_due)
        })?
        .ok_or_else(|| StoreError::NotFound(format!("active session {session_id}")))
    }

    fn list_sessions(&self, limit: u32, offset: u32) -> Result<Vec<SessionRecord>, StoreError> {
        self.with_connection(|connection| db::list_sessions(connection, limit, offset))
    }

    fn list_active_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        self.with_connection(db::list_active_sessions)
    }
}

impl ZoneDirectory for SqliteParkingStore {
    fn hourly_rate_for_slot(&self, slot_id: &str) -> Result<Option<i64>, StoreError> {
        self.with_connection(|connection| db::hourly_rate_for_slot(connection, slot_id))
    }

    fn list_zones(&self) -> Result<Vec<ZoneRecord>, StoreError> {
        self.with_connection(db::list_zones)
    }
}

impl ParkingStore for SqliteParkingStore {
    fn apply_transition(
        &self,
        effects: &TransitionEffects,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?;
        let transaction = connection.transaction().map_err(DbError::from)?;

        let applied = apply_transition_tx(&transaction, effects)?;

        transaction.commit().map_err(DbError::from)?;
        Ok(applied)
    }
}

fn apply_transition_tx(
    connection: &Connection,
    effects: &TransitionEffects,
) -> Result<Option<SessionRecord>, StoreError> {
    match effects.new_status {
        Some(status) => {
            db::update_slot_status(connection, &effects.slot_id, status, &effects.observed_at)?
                .ok_or_else(|| StoreError::NotFound(format!("slot {}", effects.slot_id)))?;
        }
        None => {
            if !db::touch_slot(connection, &effects.slot_id, &effects.observed_at)? {
                return Err(StoreError::NotFound(format!("slot {}", effects.slot_id)));
            }
        }
    }

    match &effects.session {
        Some(SessionEffect::Open {
            user_id,
            entry_time,
        }) => Ok(Some(db::insert_session(
            connection,
            &effects.slot_id,
            user_id.as_deref(),
            entry_time,
        )?)),
        Some(SessionEffect::Close {
            session_id,
            exit_time,
            amount_due,
        }) => db::close_session(connection, session_id, exit_time, *amount_due)?
            .ok_or_else(|| StoreError::NotFound(format!("active session {session_id}")))
            .map(Some),
        None => Ok(None),
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    zones: Vec<ZoneRecord>,
    slots: Vec<SlotRecord>,
    sessions: Vec<SessionRecord>,
}

/// In-memory reference implementation of the store seam. Keeps the event
/// processor testable without a database and doubles as the executable
/// definition of the store contract.
#[derive(Debug, Default)]
pub struct MemoryParkingStore {
    state: Mutex<MemoryState>,
}

impl MemoryParkingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_zone(&self, name: &str, hourly_rate: i64, created_at: &str) -> ZoneRecord {
        let zone = ZoneRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            hourly_rate,
            created_at: created_at.to_string(),
        };
        self.state
            .lock()
            .expect("memory store lock")
            .zones
            .push(zone.clone());
        zone
    }

    pub fn add_slot(
        &self,
        label: &str,
        sensor_id: &str,
        zone_id: &str,
        status: SlotStatus,
        last_updated: &str,
    ) -> SlotRecord {
        let slot = SlotRecord {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            sensor_id: sensor_id.to_string(),
            zone_id: zone_id.to_string(),
            status,
            last_updated: last_updated.to_string(),
        };
        self.state
            .lock()
            .expect("memory store lock")
            .slots
            .push(slot.clone());
        slot
    }

    fn with_state<T>(
        &self,
        op: impl FnOnce(&mut MemoryState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        op(&mut state)
    }
}

fn open_session_record(slot_id: &str, user_id: Option<&str>, entry_time: &str) -> SessionRecord {
    SessionRecord {
        id: Uuid::new_v4().to_string(),
        slot_id: slot_id.to_string(),
        user_id: user_id.map(ToString::to_string),
        entry_time: entry_time.to_string(),
        exit_time: None,
        amount_due: None,
        is_active: true,
        created_at: entry_time.to_string(),
    }
}

fn memory_create_session(
    state: &mut MemoryState,
    slot_id: &str,
    user_id: Option<&str>,
    entry_time: &str,
) -> Result<SessionRecord, StoreError> {
    if state
        .sessions
        .iter()
        .any(|session| session.slot_id == slot_id && session.is_active)
    {
        return Err(StoreError::Conflict(format!(
            "active session already exists for slot {slot_id}"
        )));
    }

    let session = open_session_record(slot_id, user_id, entry_time);
    state.sessions.push(session.clone());
    Ok(session)
}

fn memory_close_session(
    state: &mut MemoryState,
    session_id: &str,
    exit_time: &str,
    amount_due: i64,
) -> Result<SessionRecord, StoreError> {
    let session = state
        .sessions
        .iter_mut()
        .find(|session| session.id == session_id && session.is_active)
        .ok_or_else(|| StoreError::NotFound(format!("active session {session_id}")))?;

    session.exit_time = Some(exit_time.to_string());
    session.amount_due = Some(amount_due);
    session.is_active = false;
    Ok(session.clone())
}

fn memory_update_slot(
    state: &mut MemoryState,
    slot_id: &str,
    status: Option<SlotStatus>,
    last_updated: &str,
) -> Result<SlotRecord, StoreError> {
    let slot = state
        .slots
        .iter_mut()
        .find(|slot| slot.id == slot_id)
        .ok_or_else(|| StoreError::NotFound(format!("slot {slot_id}")))?;

    if let Some(status) = status {
        slot.status = status;
    }
    slot.last_updated = last_updated.to_string();
    Ok(slot.clone())
}

impl SlotStore for MemoryParkingStore {
    fn find_slot_by_sensor(&self, sensor_id: &str) -> Result<Option<SlotRecord>, StoreError> {
        self.with_state(|state| {
            Ok(state
                .slots
                .iter()
                .find(|slot| slot.sensor_id == sensor_id)
                .cloned())
        })
    }

    fn list_slots(&self) -> Result<Vec<SlotRecord>, StoreError> {
        self.with_state(|state| Ok(state.slots.clone()))
    }

    fn update_slot_status(
        &self,
        slot_id: &str,
        status: SlotStatus,
        last_updated: &str,
    ) -> Result<SlotRecord, StoreError> {
        self.with_state(|state| memory_update_slot(state, slot_id, Some(status), last_updated))
    }

    fn touch_slot(&self, slot_id: &str, last_updated: &str) -> Result<(), StoreError> {
        self.with_state(|state| memory_update_slot(state, slot_id, None, last_updated).map(|_| ()))
    }
}

impl SessionStore for MemoryParkingStore {
    fn create_session(
        &self,
        slot_id: &str,
        user_id: Option<&str>,
        entry_time: &str,
    ) -> Result<SessionRecord, StoreError> {
        self.with_state(|state| memory_create_session(state, slot_id, user_id, entry_time))
    }

    fn find_active_session(&self, slot_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.with_state(|state| {
            Ok(state
                .sessions
                .iter()
                .filter(|session| session.slot_id == slot_id && session.is_active)
                .max_by(|a, b| a.entry_time.cmp(&b.entry_time))
                .cloned())
        })
    }

    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.with_state(|state| {
            Ok(state
                .sessions
                .iter()
                .find(|session| session.id == session_id)
                .cloned())
        })
    }

    fn close_session(
        &self,
        session_id: &str,
        exit_time: &str,
        amount_due: i64,
    ) -> Result<SessionRecord, StoreError> {
        self.with_state(|state| memory_close_session(state, session_id, exit_time, amount_due))
    }

    fn list_sessions(&self, limit: u32, offset: u32) -> Result<Vec<SessionRecord>, StoreError> {
        self.with_state(|state| {
            let mut sessions = state.sessions.clone();
            sessions.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
            Ok(sessions
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        })
    }

    fn list_active_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        self.with_state(|state| {
            let mut sessions: Vec<SessionRecord> = state
                .sessions
                .iter()
                .filter(|session| session.is_active)
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
            Ok(sessions)
        })
    }
}

impl ZoneDirectory for MemoryParkingStore {
    fn hourly_rate_for_slot(&self, slot_id: &str) -> Result<Option<i64>, StoreError> {
        self.with_state(|state| {
            let Some(slot) = state.slots.iter().find(|slot| slot.id == slot_id) else {
                return Ok(None);
            };
            Ok(state
                .zones
                .iter()
                .find(|zone| zone.id == slot.zone_id)
                .map(|zone| zone.hourly_rate))
        })
    }

    fn list_zones(&self) -> Result<Vec<ZoneRecord>, StoreError> {
        self.with_state(|state| Ok(state.zones.clone()))
    }
}

impl ParkingStore for MemoryParkingStore {
    fn apply_transition(
        &self,
        effects: &TransitionEffects,
    ) -> Result<Option<SessionRecord>, StoreError> {
        self.with_state(|state| {
            // One mutation path under one lock; validate the session write
            // before touching the slot so a failure leaves nothing applied.
            let applied = match &effects.session {
                Some(SessionEffect::Open {
                    user_id,
                    entry_time,
                }) => Some(memory_create_session(
                    state,
                    &effects.slot_id,
                    user_id.as_deref(),
                    entry_time,
                )?),
                Some(SessionEffect::Close {
                    session_id,
                    exit_time,
                    amount_due,
                }) => Some(memory_close_session(
                    state,
                    session_id,
                    exit_time,
                    *amount_due,
                )?),
                None => None,
            };

            memory_update_slot(
                state,
                &effects.slot_id,
                effects.new_status,
                &effects.observed_at,
            )?;

            Ok(applied)
        })
    }
}
