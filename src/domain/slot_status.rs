use chrono::{SecondsFormat, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimestampMs(pub i64);

pub trait Clock {
    fn now(&self) -> TimestampMs;
}

pub fn parse_timestamp_ms(value: &str) -> Option<TimestampMs> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|datetime| TimestampMs(datetime.timestamp_millis()))
}

pub fn timestamp_to_rfc3339(timestamp: TimestampMs) -> String {
    let datetime = chrono::DateTime::<Utc>::from_timestamp_millis(timestamp.0)
        .unwrap_or_else(|| chrono::DateTime::<Utc>::from(std::time::UNIX_EPOCH));
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Free,
    Occupied,
    Unknown,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusParseError {
    #[error("unrecognized slot status: {0}")]
    Unrecognized(String),
}

impl SlotStatus {
    /// Normalizes a raw sensor status. Only the three enumerated values are
    /// accepted; anything else is rejected rather than stored.
    pub fn parse(raw: &str) -> Result<Self, StatusParseError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "occupied" => Ok(Self::Occupied),
            "unknown" => Ok(Self::Unknown),
            _ => Err(StatusParseError::Unrecognized(raw.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Occupied => "occupied",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entry,
    Exit,
    NoChange,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::NoChange => "no_change",
        }
    }
}

/// Classifies a status change from the old vs new status only. The unknown
/// status never starts or ends a session.
pub fn classify(previous: SlotStatus, next: SlotStatus) -> Transition {
    match (previous, next) {
        (SlotStatus::Free, SlotStatus::Occupied) => Transition::Entry,
        (SlotStatus::Occupied, SlotStatus::Free) => Transition::Exit,
        _ => Transition::NoChange,
    }
}
