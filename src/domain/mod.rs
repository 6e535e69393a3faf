pub mod fee;
pub mod models;
pub mod monitor;
pub mod sensor_report;
pub mod slot_status;
