use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_QUALITY: u8 = 85;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const DEFAULT_OUTPUT_DIR: &str = "screenshots";

/// Immutable settings for a single scan run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub concurrency: usize,
    /// Lossy compression level, 1-100.
    pub quality: u8,
    /// Hard ceiling for one capture attempt.
    pub timeout: Duration,
    pub output_dir: PathBuf,
    /// Overall budget for the run; undispatched targets time out once it elapses.
    pub run_deadline: Option<Duration>,
    /// Where the URLs came from, e.g. the input file name.
    pub source_label: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            quality: DEFAULT_QUALITY,
            timeout: DEFAULT_TIMEOUT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            run_deadline: None,
            source_label: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("quality must be within 1..=100, got {0}")]
    QualityOutOfRange(u8),
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

impl ScanConfig {
    pub fn with_output(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::QualityOutOfRange(self.quality));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.quality, 85);
        assert_eq!(config.timeout_ms(), 15_000);
        assert_eq!(config.output_dir, PathBuf::from("screenshots"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let zero_workers = ScanConfig {
            concurrency: 0,
            ..ScanConfig::default()
        };
        assert_eq!(zero_workers.validate(), Err(ConfigError::ZeroConcurrency));

        let bad_quality = ScanConfig {
            quality: 101,
            ..ScanConfig::default()
        };
        assert_eq!(
            bad_quality.validate(),
            Err(ConfigError::QualityOutOfRange(101))
        );

        let zero_timeout = ScanConfig {
            timeout: Duration::ZERO,
            ..ScanConfig::default()
        };
        assert_eq!(zero_timeout.validate(), Err(ConfigError::ZeroTimeout));
    }
}
