use crate::domain::slot_status::SlotStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRecord {
    pub id: String,
    pub name: String,
    pub hourly_rate: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub id: String,
    pub label: String,
    pub sensor_id: String,
    pub zone_id: String,
    pub status: SlotStatus,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: String,
    pub slot_id: String,
    pub user_id: Option<String>,
    pub entry_time: String,
    pub exit_time: Option<String>,
    pub amount_due: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
}

impl SessionRecord {
    /// A session is active iff it has neither an exit time nor an amount due.
    pub fn is_consistent(&self) -> bool {
        self.is_active == (self.exit_time.is_none() && self.amount_due.is_none())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewZone {
    pub name: String,
    pub hourly_rate: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSlot {
    pub label: String,
    pub sensor_id: String,
    pub zone_id: String,
}
