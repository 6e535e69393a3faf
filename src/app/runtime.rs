use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};

use crate::adapters::api::{ApiState, configure_routes};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::app::processor::{EventProcessor, SystemClock};
use crate::app::services::{SlotStore, SqliteParkingStore, StoreError};
use crate::domain::monitor::stale_slots;
use crate::domain::slot_status::{Clock, SlotStatus, timestamp_to_rfc3339};

/// Heartbeat watchdog: slots whose sensor has gone quiet are marked unknown
/// so the dashboard stops showing a confident status. Sessions are left
/// untouched; only a real occupied→free report closes one.
pub struct StaleSlotMonitor<S, C> {
    store: Arc<S>,
    clock: C,
    stale_after_ms: i64,
}

impl<S, C> StaleSlotMonitor<S, C>
where
    S: SlotStore,
    C: Clock,
{
    pub fn new(store: Arc<S>, clock: C, stale_after_ms: i64) -> Self {
        Self {
            store,
            clock,
            stale_after_ms,
        }
    }

    pub fn tick(&self) -> Result<usize, StoreError> {
        let slots = self.store.list_slots()?;
        let now = self.clock.now();
        let observed_at = timestamp_to_rfc3339(now);

        let stale = stale_slots(&slots, now, self.stale_after_ms);
        let mut marked = 0_usize;

        for slot in stale {
            self.store
                .update_slot_status(&slot.id, SlotStatus::Unknown, &observed_at)?;
            tracing::warn!(
                slot_id = %slot.id,
                sensor_id = %slot.sensor_id,
                last_updated = %slot.last_updated,
                "sensor went stale; slot marked unknown"
            );
            marked += 1;
        }

        Ok(marked)
    }
}

pub fn start_monitor<S, C>(
    monitor: StaleSlotMonitor<S, C>,
    interval: Duration,
    stop_flag: Arc<AtomicBool>,
) -> JoinHandle<()>
where
    S: SlotStore + 'static,
    C: Clock + Send + 'static,
{
    std::thread::spawn(move || {
        while !stop_flag.load(Ordering::Relaxed) {
            if let Err(error) = monitor.tick() {
                tracing::warn!(error = %error, "stale slot sweep failed");
            }
            std::thread::sleep(interval);
        }
    })
}

fn build_state(config: &AppConfig) -> Result<ApiState, AppError> {
    let mut connection =
        crate::adapters::db::open_connection(&config.db_path).map_err(AppError::database_init)?;
    crate::adapters::db::run_migrations(&mut connection).map_err(AppError::database_init)?;

    let shared_connection = Arc::new(Mutex::new(connection));
    let store = SqliteParkingStore::new(Arc::clone(&shared_connection));
    let processor = Arc::new(EventProcessor::new(
        Arc::new(store.clone()),
        SystemClock,
        config.default_hourly_rate,
    ));

    Ok(ApiState {
        store,
        processor,
        sensor_api_key: config.sensor_api_key.clone(),
    })
}

fn serve_http(api_state: ApiState, http_bind: &str) -> std::io::Result<()> {
    let bind = http_bind.to_string();
    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .app_data(web::Data::new(api_state.clone()))
                .configure(configure_routes)
        })
        .bind(&bind)?
        .run()
        .await
    })
}

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let api_state = build_state(&config)?;

    let monitor = StaleSlotMonitor::new(
        Arc::new(api_state.store.clone()),
        SystemClock,
        config.stale_after_ms,
    );
    let stop_flag = Arc::new(AtomicBool::new(false));
    let monitor_handle = start_monitor(
        monitor,
        Duration::from_millis(config.monitor_interval_ms),
        Arc::clone(&stop_flag),
    );

    tracing::info!(bind = %config.http_bind, "http server starting");

    let server_result = serve_http(api_state, &config.http_bind);

    stop_flag.store(true, Ordering::Relaxed);
    let join_result = monitor_handle.join();

    if join_result.is_err() {
        return Err(AppError::runtime("monitor thread panicked"));
    }

    server_result.map_err(AppError::runtime)
}

pub fn run_api(config: AppConfig) -> Result<(), AppError> {
    let api_state = build_state(&config)?;

    tracing::info!(bind = %config.http_bind, "http server starting (api only)");

    serve_http(api_state, &config.http_bind).map_err(AppError::runtime)
}
