use crate::app::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_bind: String,
    pub db_path: String,
    pub sensor_api_key: String,
    pub default_hourly_rate: i64,
    pub stale_after_ms: i64,
    pub monitor_interval_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sensor_api_key = lookup("SENSOR_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::config("SENSOR_API_KEY is required"))?;

        Ok(Self {
            http_bind: lookup("HTTP_BIND")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            db_path: lookup("DB_PATH")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "/var/lib/spms/spms.db".to_string()),
            sensor_api_key,
            default_hourly_rate: parse_or_default(&lookup, "DEFAULT_HOURLY_RATE", 5000_i64)?,
            stale_after_ms: parse_or_default(&lookup, "STALE_AFTER_MS", 300_000_i64)?,
            monitor_interval_ms: parse_or_default(&lookup, "MONITOR_INTERVAL_MS", 60_000_u64)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub api_url: String,
    pub sensor_api_key: String,
    pub interval_ms: u64,
}

impl SimConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sensor_api_key = lookup("SENSOR_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::config("SENSOR_API_KEY is required"))?;

        Ok(Self {
            api_url: lookup("API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "http://127.0.0.1:8080".to_string()),
            sensor_api_key,
            interval_ms: parse_or_default(&lookup, "SIM_INTERVAL_MS", 5000_u64)?,
        })
    }
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}
