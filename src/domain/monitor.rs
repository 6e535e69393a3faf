use crate::domain::models::SlotRecord;
use crate::domain::slot_status::{SlotStatus, TimestampMs, parse_timestamp_ms};

/// Per-zone occupancy aggregate for dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneAvailability {
    pub total: usize,
    pub free: usize,
    pub occupied: usize,
    pub unknown: usize,
}

pub fn zone_availability(slots: &[SlotRecord], zone_id: &str) -> ZoneAvailability {
    let mut availability = ZoneAvailability {
        total: 0,
        free: 0,
        occupied: 0,
        unknown: 0,
    };

    for slot in slots.iter().filter(|slot| slot.zone_id == zone_id) {
        availability.total += 1;
        match slot.status {
            SlotStatus::Free => availability.free += 1,
            SlotStatus::Occupied => availability.occupied += 1,
            SlotStatus::Unknown => availability.unknown += 1,
        }
    }

    availability
}

/// Heartbeat check: slots whose sensor has not reported within the threshold.
/// Slots already marked unknown are skipped, and so is a slot whose
/// last-updated value does not parse.
pub fn stale_slots<'a>(
    slots: &'a [SlotRecord],
    now: TimestampMs,
    threshold_ms: i64,
) -> Vec<&'a SlotRecord> {
    slots
        .iter()
        .filter(|slot| slot.status != SlotStatus::Unknown)
        .filter(|slot| {
            parse_timestamp_ms(&slot.last_updated)
                .map(|last| now.0 - last.0 > threshold_ms)
                .unwrap_or(false)
        })
        .collect()
}
