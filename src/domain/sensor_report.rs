use serde_json::{Map, Value};
use thiserror::Error;

/// One inbound occupancy report, as posted by a sensor or the simulator.
/// `status` is kept raw here; normalization happens in the event processor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReport {
    pub sensor_id: String,
    pub status: String,
    pub timestamp: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReportParseError {
    #[error("payload must be a JSON object")]
    InvalidPayloadType,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {0} must be a non-empty string")]
    InvalidFieldType(&'static str),
}

const SENSOR_ID_KEYS: &[&str] = &["sensor_id", "sensorId"];
const STATUS_KEYS: &[&str] = &["status"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp"];
const USER_ID_KEYS: &[&str] = &["user_id", "userId"];

impl SensorReport {
    pub fn from_value(payload: &Value) -> Result<Self, ReportParseError> {
        let object = payload
            .as_object()
            .ok_or(ReportParseError::InvalidPayloadType)?;

        let sensor_id = required_string(object, SENSOR_ID_KEYS, "sensor_id")?;
        let status = required_string(object, STATUS_KEYS, "status")?;
        let timestamp = optional_string(object, TIMESTAMP_KEYS, "timestamp")?;
        let user_id = optional_string(object, USER_ID_KEYS, "user_id")?;

        Ok(Self {
            sensor_id,
            status,
            timestamp,
            user_id,
        })
    }
}

fn required_string(
    object: &Map<String, Value>,
    aliases: &[&str],
    name: &'static str,
) -> Result<String, ReportParseError> {
    match find_value(object, aliases) {
        Some(value) => as_non_empty_string(value, name),
        None => Err(ReportParseError::MissingField(name)),
    }
}

fn optional_string(
    object: &Map<String, Value>,
    aliases: &[&str],
    name: &'static str,
) -> Result<Option<String>, ReportParseError> {
    match find_value(object, aliases) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => as_non_empty_string(value, name).map(Some),
    }
}

fn as_non_empty_string(value: &Value, name: &'static str) -> Result<String, ReportParseError> {
    let text = value
        .as_str()
        .map(str::trim)
        .ok_or(ReportParseError::InvalidFieldType(name))?;

    if text.is_empty() {
        return Err(ReportParseError::MissingField(name));
    }

    Ok(text.to_string())
}

fn find_value<'a>(object: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| object.get(*alias))
}
