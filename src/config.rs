use crate::error::{Error, Result};

/// Nanoseconds in a second.
pub const NANOS_IN_SEC: u64 = 1_000_000_000;

/// Default width of a resampling step, in nanoseconds.
pub const STEP: u64 = 100;

/// What to do when an address is allocated while its previous interval is
/// still open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReusePolicy {
    /// Fail with [`ConsistencyError::DoubleAllocation`](crate::ConsistencyError::DoubleAllocation).
    #[default]
    Reject,
    /// Log a warning and restart tracking from the newer allocation.
    Replace,
}

/// Controls how a trace is turned into a plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotConfig {
    /// Width of a grid step in nanoseconds. Must be non-zero.
    pub step: u64,
    /// Handling of a second allocation on a live address.
    pub reuse: ReusePolicy,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            step: STEP,
            reuse: ReusePolicy::default(),
        }
    }
}

impl PlotConfig {
    #[must_use]
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn with_reuse(mut self, reuse: ReusePolicy) -> Self {
        self.reuse = reuse;
        self
    }

    /// Check the configuration before running the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(Error::Config("step must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_step_constant() {
        let config = PlotConfig::default();
        assert_eq!(config.step, 100);
        assert_eq!(config.reuse, ReusePolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_step_is_rejected() {
        let err = PlotConfig::default().with_step(0).validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
