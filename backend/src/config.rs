use std::{fmt::Display, str::FromStr, time::Duration};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value} ({reason})")]
    Invalid { key: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub worker_count: usize,
    /// Bound on each store lookup and queue publish made while accepting a vote.
    pub intake_timeout: Duration,
    /// Bound on handling a single queue message in a worker.
    pub processing_timeout: Duration,
    pub visibility_timeout: Duration,
    pub max_delivery_attempts: u32,
    pub poll_interval: Duration,
    pub allowed_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            intake_timeout: Duration::from_millis(2000),
            processing_timeout: Duration::from_millis(5000),
            visibility_timeout: Duration::from_secs(30),
            max_delivery_attempts: 5,
            poll_interval: Duration::from_millis(250),
            allowed_origin: "http://localhost".into(),
        }
    }
}

impl AppConfig {
    /// Builds the config from a key lookup (Shuttle secrets in production).
    pub fn load(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            worker_count: try_load(&get, "WORKER_COUNT", "2")?,
            intake_timeout: Duration::from_millis(try_load(&get, "INTAKE_TIMEOUT_MS", "2000")?),
            processing_timeout: Duration::from_millis(try_load(&get, "PROCESSING_TIMEOUT_MS", "5000")?),
            visibility_timeout: Duration::from_secs(try_load(&get, "VISIBILITY_TIMEOUT_SECS", "30")?),
            max_delivery_attempts: try_load(&get, "MAX_DELIVERY_ATTEMPTS", "5")?,
            poll_interval: Duration::from_millis(try_load(&get, "POLL_INTERVAL_MS", "250")?),
            allowed_origin: try_load(&get, "ALLOWED_ORIGIN", "http://localhost")?,
        };
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(invalid("WORKER_COUNT", "0", "at least one worker is required"));
        }
        if self.intake_timeout.is_zero() {
            return Err(invalid("INTAKE_TIMEOUT_MS", "0", "every vote would time out"));
        }
        if self.poll_interval.is_zero() {
            return Err(invalid("POLL_INTERVAL_MS", "0", "idle workers would spin"));
        }
        if self.max_delivery_attempts == 0 {
            return Err(invalid("MAX_DELIVERY_ATTEMPTS", "0", "must allow at least one delivery"));
        }
        if self.processing_timeout >= self.visibility_timeout {
            return Err(invalid(
                "PROCESSING_TIMEOUT_MS",
                &self.processing_timeout.as_millis().to_string(),
                "must be shorter than VISIBILITY_TIMEOUT_SECS",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid { key, value: value.to_string(), reason: reason.to_string() }
}

fn try_load<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = get(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.trim().parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        invalid(key, &value, e)
    })
}
