use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::app::services::{ParkingStore, SessionEffect, StoreError, TransitionEffects};
use crate::domain::fee::{FeeBreakdown, FeeError, Role, calculate_fee};
use crate::domain::models::{SessionRecord, SlotRecord};
use crate::domain::sensor_report::SensorReport;
use crate::domain::slot_status::{
    Clock, SlotStatus, StatusParseError, TimestampMs, Transition, classify, parse_timestamp_ms,
    timestamp_to_rfc3339,
};

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampMs {
        TimestampMs(chrono::Utc::now().timestamp_millis())
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid slot status: {0}")]
    InvalidStatus(#[from] StatusParseError),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("no slot is mapped to sensor {0}")]
    UnknownSensor(String),
    #[error("fee calculation failed: {0}")]
    Fee(#[from] FeeError),
    #[error("slot lock poisoned")]
    LockPoisoned,
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),
}

impl ProcessError {
    /// Caller errors: terminal for this report, must not be retried verbatim.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidStatus(_)
                | Self::InvalidTimestamp(_)
                | Self::UnknownSensor(_)
                | Self::Fee(_)
        )
    }

    /// Transient failures: the sensor is expected to retry on its own
    /// schedule.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LockPoisoned => true,
            Self::Store(error) => error.is_transient(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub slot_id: String,
    pub sensor_id: String,
    pub previous_status: SlotStatus,
    pub new_status: SlotStatus,
    pub transition: Transition,
    pub session: Option<SessionRecord>,
    pub fee: Option<FeeBreakdown>,
}

/// The one component with side effects: resolves a sensor report against the
/// slot store, applies the status transition, and opens or closes parking
/// sessions. Reports for different sensors run in parallel; reports for the
/// same sensor are serialized by a per-sensor lock held from the status read
/// through the commit.
pub struct EventProcessor<S, C> {
    store: Arc<S>,
    clock: C,
    fallback_hourly_rate: i64,
    sensor_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S, C> EventProcessor<S, C>
where
    S: ParkingStore,
    C: Clock,
{
    pub fn new(store: Arc<S>, clock: C, fallback_hourly_rate: i64) -> Self {
        Self {
            store,
            clock,
            fallback_hourly_rate,
            sensor_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn process_report(&self, report: &SensorReport) -> Result<TransitionResult, ProcessError> {
        let next_status = SlotStatus::parse(&report.status)?;
        let reported_at = match &report.timestamp {
            Some(raw) => Some(
                parse_timestamp_ms(raw)
                    .ok_or_else(|| ProcessError::InvalidTimestamp(raw.clone()))?,
            ),
            None => None,
        };

        let sensor_lock = self.sensor_lock(&report.sensor_id)?;
        let _guard = sensor_lock.lock().map_err(|_| ProcessError::LockPoisoned)?;

        let slot = self
            .store
            .find_slot_by_sensor(&report.sensor_id)?
            .ok_or_else(|| ProcessError::UnknownSensor(report.sensor_id.clone()))?;

        let previous_status = slot.status;
        let now = self.clock.now();
        let observed_at = timestamp_to_rfc3339(now);

        if previous_status == next_status {
            // Idempotent repeat: the slot status stays put but the report
            // still counts as a heartbeat.
            self.store.apply_transition(&TransitionEffects {
                slot_id: slot.id.clone(),
                new_status: None,
                observed_at,
                session: None,
            })?;

            tracing::debug!(
                sensor_id = %report.sensor_id,
                status = %next_status,
                "duplicate report refreshed slot timestamp"
            );

            return Ok(no_change_result(&slot, next_status));
        }

        match classify(previous_status, next_status) {
            Transition::Entry => self.handle_entry(&slot, report, next_status, observed_at),
            Transition::Exit => {
                self.handle_exit(&slot, report, next_status, reported_at, now, observed_at)
            }
            Transition::NoChange => {
                self.store.apply_transition(&TransitionEffects {
                    slot_id: slot.id.clone(),
                    new_status: Some(next_status),
                    observed_at,
                    session: None,
                })?;

                Ok(no_change_result(&slot, next_status))
            }
        }
    }

    fn handle_entry(
        &self,
        slot: &SlotRecord,
        report: &SensorReport,
        next_status: SlotStatus,
        observed_at: String,
    ) -> Result<TransitionResult, ProcessError> {
        let session = self.store.apply_transition(&TransitionEffects {
            slot_id: slot.id.clone(),
            new_status: Some(next_status),
            observed_at: observed_at.clone(),
            session: Some(SessionEffect::Open {
                user_id: report.user_id.clone(),
                entry_time: observed_at,
            }),
        })?;

        if let Some(session) = &session {
            tracing::info!(
                sensor_id = %report.sensor_id,
                slot_id = %slot.id,
                session_id = %session.id,
                entry_time = %session.entry_time,
                "parking session opened"
            );
        }

        Ok(TransitionResult {
            slot_id: slot.id.clone(),
            sensor_id: slot.sensor_id.clone(),
            previous_status: slot.status,
            new_status: next_status,
            transition: Transition::Entry,
            session,
            fee: None,
        })
    }

    fn handle_exit(
        &self,
        slot: &SlotRecord,
        report: &SensorReport,
        next_status: SlotStatus,
        reported_at: Option<TimestampMs>,
        now: TimestampMs,
        observed_at: String,
    ) -> Result<TransitionResult, ProcessError> {
        let Some(active) = self.store.find_active_session(&slot.id)? else {
            // Dangling exit: the session may have been closed out of band.
            // Tolerated, the slot still moves to free.
            tracing::warn!(
                sensor_id = %report.sensor_id,
                slot_id = %slot.id,
                "exit reported with no active session"
            );

            self.store.apply_transition(&TransitionEffects {
                slot_id: slot.id.clone(),
                new_status: Some(next_status),
                observed_at,
                session: None,
            })?;

            return Ok(no_change_result(slot, next_status));
        };

        let entry_time = parse_timestamp_ms(&active.entry_time)
            .ok_or_else(|| ProcessError::InvalidTimestamp(active.entry_time.clone()))?;
        let exit_time = reported_at.unwrap_or(now);
        let hourly_rate = self
            .store
            .hourly_rate_for_slot(&slot.id)?
            .unwrap_or(self.fallback_hourly_rate);

        // Sensor-originated exits are anonymous and always bill as visitor.
        let fee = calculate_fee(entry_time, exit_time, hourly_rate, Some(Role::Visitor))?;

        let session = self.store.apply_transition(&TransitionEffects {
            slot_id: slot.id.clone(),
            new_status: Some(next_status),
            observed_at,
            session: Some(SessionEffect::Close {
                session_id: active.id.clone(),
                exit_time: timestamp_to_rfc3339(exit_time),
                amount_due: fee.total_fee,
            }),
        })?;

        if let Some(session) = &session {
            tracing::info!(
                sensor_id = %report.sensor_id,
                slot_id = %slot.id,
                session_id = %session.id,
                duration_hours = fee.duration_hours,
                total_fee = fee.total_fee,
                "parking session closed"
            );
        }

        Ok(TransitionResult {
            slot_id: slot.id.clone(),
            sensor_id: slot.sensor_id.clone(),
            previous_status: slot.status,
            new_status: next_status,
            transition: Transition::Exit,
            session,
            fee: Some(fee),
        })
    }

    fn sensor_lock(&self, sensor_id: &str) -> Result<Arc<Mutex<()>>, ProcessError> {
        let mut locks = self
            .sensor_locks
            .lock()
            .map_err(|_| ProcessError::LockPoisoned)?;

        Ok(Arc::clone(
            locks.entry(sensor_id.to_string()).or_default(),
        ))
    }
}

fn no_change_result(slot: &SlotRecord, next_status: SlotStatus) -> TransitionResult {
    TransitionResult {
        slot_id: slot.id.clone(),
        sensor_id: slot.sensor_id.clone(),
        previous_status: slot.status,
        new_status: next_status,
        transition: Transition::NoChange,
        session: None,
        fee: None,
    }
}
