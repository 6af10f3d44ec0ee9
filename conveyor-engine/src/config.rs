//! Engine configuration
//!
//! Sizes of the worker pools and queues, the default job policy and the
//! scheduler cadence. Everything has a default so an engine can be started
//! with `EngineConfig::default()`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;

/// Engine configuration
///
/// Durations are (de)serialized as milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of job workers
    pub job_workers: usize,

    /// Number of pipeline workers
    pub pipeline_workers: usize,

    /// Jobs that can wait in the queue before submitters block
    pub job_queue_capacity: usize,

    /// Pipelines that can wait in the queue before the scheduler defers them
    pub pipeline_queue_capacity: usize,

    /// Per-attempt timeout for jobs created without one
    #[serde(with = "duration_ms")]
    pub default_timeout: Duration,

    /// Retry budget for jobs created without one
    pub default_max_retries: u32,

    /// Delay after the first failed attempt
    #[serde(with = "duration_ms")]
    pub backoff_initial: Duration,

    /// Upper bound on the delay between attempts
    #[serde(with = "duration_ms")]
    pub backoff_max: Duration,

    /// How often the scheduler scans for due pipelines
    #[serde(with = "duration_ms")]
    pub scheduler_interval: Duration,
}

impl EngineConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.backoff_initial, self.backoff_max)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.job_workers == 0 {
            anyhow::bail!("job_workers must be greater than 0");
        }

        if self.pipeline_workers == 0 {
            anyhow::bail!("pipeline_workers must be greater than 0");
        }

        if self.job_queue_capacity == 0 || self.pipeline_queue_capacity == 0 {
            anyhow::bail!("queue capacities must be greater than 0");
        }

        if self.default_timeout.is_zero() {
            anyhow::bail!("default_timeout must be greater than 0");
        }

        if self.backoff_max < self.backoff_initial {
            anyhow::bail!("backoff_max must not be lower than backoff_initial");
        }

        if self.scheduler_interval.is_zero() {
            anyhow::bail!("scheduler_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            job_workers: 5,
            pipeline_workers: 3,
            job_queue_capacity: 100,
            pipeline_queue_capacity: 100,
            default_timeout: Duration::from_secs(300), // 5 minutes
            default_max_retries: 3,
            backoff_initial: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            scheduler_interval: Duration::from_secs(1),
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.job_workers, 5);
        assert_eq!(config.pipeline_workers, 3);
        assert_eq!(config.job_queue_capacity, 100);
        assert_eq!(config.default_timeout, Duration::from_secs(300));
        assert_eq!(config.default_max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.job_workers = 0;
        assert!(config.validate().is_err());
        config.job_workers = 1;

        config.backoff_initial = Duration::from_secs(10);
        config.backoff_max = Duration::from_secs(1);
        assert!(config.validate().is_err());
        config.backoff_max = Duration::from_secs(10);

        config.scheduler_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.scheduler_interval = Duration::from_millis(50);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"job_workers": 2, "scheduler_interval": 250}"#).unwrap();
        assert_eq!(config.job_workers, 2);
        assert_eq!(config.scheduler_interval, Duration::from_millis(250));
        assert_eq!(config.pipeline_workers, 3);
    }
}
