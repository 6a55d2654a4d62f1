use crate::config::GenerationConfig;
use crate::error::ConfigError;

/// Validated run parameters for the batch driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub target: u64,
    pub batch_size: u64,
    pub worker_count: usize,
}

impl DriverConfig {
    pub fn new(target: u64, batch_size: u64, worker_count: usize) -> Result<Self, ConfigError> {
        if target == 0 {
            return Err(ConfigError::validation("target must be greater than 0"));
        }
        if batch_size == 0 {
            return Err(ConfigError::validation("batch_size must be greater than 0"));
        }
        if worker_count == 0 {
            return Err(ConfigError::validation(
                "worker_count must be greater than 0",
            ));
        }
        Ok(Self {
            target,
            batch_size,
            worker_count,
        })
    }

    pub fn from_config(config: &GenerationConfig) -> Result<Self, ConfigError> {
        let target = u64::try_from(config.target)
            .map_err(|_| ConfigError::validation("target must be greater than 0"))?;
        let batch_size = u64::try_from(config.batch_size)
            .map_err(|_| ConfigError::validation("batch_size must be greater than 0"))?;
        Self::new(target, batch_size, config.worker_count)
    }

    /// Whether synthesis is fanned out to a worker pool.
    pub fn is_parallel(&self) -> bool {
        self.worker_count > 1
    }
}
