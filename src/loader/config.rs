use std::time::Duration;

use crate::error::{Result, StevedoreError};

/// Default time an archive may stay open without being used.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(10);

/// Archive loader configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Open archives idle for longer than this are closed by a purge
    idle_threshold: Duration,
    /// Start periodic purging at construction when set
    autopurge_interval: Option<Duration>,
}

impl LoaderConfig {
    /// Creates a new builder for [`LoaderConfig`]
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Get the idle threshold
    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }

    /// Get the autopurge interval
    pub fn autopurge_interval(&self) -> Option<Duration> {
        self.autopurge_interval
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            autopurge_interval: None,
        }
    }
}

/// Builder for [`LoaderConfig`]
#[derive(Debug, Default)]
pub struct LoaderConfigBuilder {
    idle_threshold: Option<Duration>,
    autopurge_interval: Option<Duration>,
}

impl LoaderConfigBuilder {
    /// Set the idle threshold
    pub fn idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = Some(threshold);
        self
    }

    /// Set the autopurge interval (`None` disables autopurge)
    pub fn autopurge_interval(mut self, interval: Option<Duration>) -> Self {
        self.autopurge_interval = interval;
        self
    }

    /// Build the configuration, rejecting a zero autopurge interval
    pub fn build(self) -> Result<LoaderConfig> {
        if self.autopurge_interval == Some(Duration::ZERO) {
            return Err(StevedoreError::ConfigError {
                message: "Autopurge interval must be greater than zero".to_string(),
            });
        }

        Ok(LoaderConfig {
            idle_threshold: self.idle_threshold.unwrap_or(DEFAULT_IDLE_THRESHOLD),
            autopurge_interval: self.autopurge_interval,
        })
    }
}
