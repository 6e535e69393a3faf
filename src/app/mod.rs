mod config;
mod error;
mod logging;
mod runtime;
pub mod processor;
pub mod services;

pub use config::{AppConfig, SimConfig};
pub use error::AppError;
pub use runtime::{StaleSlotMonitor, start_monitor};

pub fn run() -> Result<(), AppError> {
    let config = bootstrap()?;

    tracing::info!(
        http_bind = %config.http_bind,
        db_path = %config.db_path,
        default_hourly_rate = config.default_hourly_rate,
        stale_after_ms = config.stale_after_ms,
        monitor_interval_ms = config.monitor_interval_ms,
        "application bootstrap initialized"
    );

    runtime::run(config)
}

pub fn run_api() -> Result<(), AppError> {
    let config = bootstrap()?;

    tracing::info!(
        http_bind = %config.http_bind,
        db_path = %config.db_path,
        "api bootstrap initialized"
    );

    runtime::run_api(config)
}

pub fn run_simulator() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();
    logging::init()?;

    let config = SimConfig::from_env()?;

    tracing::info!(
        api_url = %config.api_url,
        interval_ms = config.interval_ms,
        "simulator bootstrap initialized"
    );

    crate::adapters::sensor_sim::run(config)
}

fn bootstrap() -> Result<AppConfig, AppError> {
    let _ = dotenvy::dotenv();
    logging::init()?;
    AppConfig::from_env()
}
