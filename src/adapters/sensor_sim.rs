use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::Deserialize;

use crate::app::{AppError, SimConfig};

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotSummary {
    sensor_id: String,
    status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorState {
    pub sensor_id: String,
    pub occupied: bool,
}

impl SensorState {
    /// Simulated sensors toggle between Car In and Car Out.
    pub fn flip(&mut self) -> &'static str {
        self.occupied = !self.occupied;
        if self.occupied { "OCCUPIED" } else { "FREE" }
    }
}

/// Drives the HTTP API with randomized occupancy events, one sensor per
/// interval, mirroring a lot full of real devices.
pub fn run(config: SimConfig) -> Result<(), AppError> {
    actix_web::rt::System::new().block_on(run_loop(config))
}

async fn run_loop(config: SimConfig) -> Result<(), AppError> {
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(AppError::runtime)?;

    let mut sensors = fetch_sensors(&client, &config).await?;
    if sensors.is_empty() {
        return Err(AppError::runtime(
            "no slots provisioned; seed the database before starting the simulator",
        ));
    }

    tracing::info!(
        sensors = sensors.len(),
        api_url = %config.api_url,
        interval_ms = config.interval_ms,
        "sensor simulator started"
    );

    loop {
        let index = rand::thread_rng().gen_range(0..sensors.len());
        let sensor_id = sensors[index].sensor_id.clone();
        let status = sensors[index].flip();

        if let Err(error) = send_update(&client, &config, &sensor_id, status).await {
            tracing::warn!(sensor_id = %sensor_id, error = %error, "failed to deliver sensor update");
        }

        actix_web::rt::time::sleep(Duration::from_millis(config.interval_ms)).await;
    }
}

async fn fetch_sensors(
    client: &reqwest::Client,
    config: &SimConfig,
) -> Result<Vec<SensorState>, AppError> {
    let slots: Vec<SlotSummary> = client
        .get(format!("{}/slots", config.api_url))
        .send()
        .await
        .map_err(AppError::runtime)?
        .error_for_status()
        .map_err(AppError::runtime)?
        .json()
        .await
        .map_err(AppError::runtime)?;

    Ok(slots
        .into_iter()
        .map(|slot| SensorState {
            occupied: slot.status == "occupied",
            sensor_id: slot.sensor_id,
        })
        .collect())
}

async fn send_update(
    client: &reqwest::Client,
    config: &SimConfig,
    sensor_id: &str,
    status: &str,
) -> Result<(), reqwest::Error> {
    let payload = serde_json::json!({
        "sensor_id": sensor_id,
        "status": status,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    });

    let response = client
        .post(format!("{}/sensors/update", config.api_url))
        .header("x-api-key", &config.sensor_api_key)
        .json(&payload)
        .send()
        .await?;

    tracing::info!(
        sensor_id = %sensor_id,
        status = %status,
        http_status = response.status().as_u16(),
        "sensor update delivered"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SensorState;

    #[test]
    fn flip_alternates_between_occupied_and_free() {
        let mut sensor = SensorState {
            sensor_id: "S-A1".to_string(),
            occupied: false,
        };

        assert_eq!(sensor.flip(), "OCCUPIED");
        assert!(sensor.occupied);
        assert_eq!(sensor.flip(), "FREE");
        assert!(!sensor.occupied);
    }
}
