//! Environment configuration
//!
//! Worker count, fast mode, logical timeout and visualization for a run.
//!
//! The worker count is stored and reported, but reactions currently execute
//! on the thread that calls [`Environment::run`](crate::Environment::run).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Configuration for an [`Environment`](crate::Environment)
///
/// # Example
///
/// ```
/// use reagent_core::EnvironmentConfig;
/// use std::time::Duration;
///
/// let config = EnvironmentConfig::default()
///     .with_fast(true)
///     .with_timeout(Some(Duration::from_secs(1)));
/// assert!(config.is_single_worker());
/// assert!(config.fast());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Number of workers, clamped to `[1, max_workers()]`
    workers: usize,
    /// Process tags without waiting for physical time to catch up
    fast: bool,
    /// Logical time at which shutdown fires, `None` for unbounded
    timeout: Option<Duration>,
    /// Render the reactor topology when the run starts
    visualize: bool,
}

impl EnvironmentConfig {
    /// Create a configuration with every setting given explicitly
    pub fn new(workers: usize, fast: bool, timeout: Option<Duration>, visualize: bool) -> Self {
        Self {
            workers: workers.clamp(1, max_workers()),
            fast,
            timeout,
            visualize,
        }
    }

    /// Set the number of workers
    ///
    /// The value is clamped to `[1, max_workers()]`.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, max_workers());
        self
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_visualize(mut self, visualize: bool) -> Self {
        self.visualize = visualize;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Check if configured for a single worker
    pub fn is_single_worker(&self) -> bool {
        self.workers == 1
    }

    pub fn fast(&self) -> bool {
        self.fast
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn visualize(&self) -> bool {
        self.visualize
    }
}

impl Default for EnvironmentConfig {
    /// Single worker, real-time pacing, no timeout, no visualization
    fn default() -> Self {
        Self {
            workers: 1,
            fast: false,
            timeout: None,
            visualize: false,
        }
    }
}

impl fmt::Display for EnvironmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workers:{} fast:{} timeout:", self.workers, self.fast)?;
        match self.timeout {
            Some(timeout) => write!(f, "{:?}", timeout)?,
            None => write!(f, "unbounded")?,
        }
        write!(f, " visualize:{}", self.visualize)
    }
}

/// Get the maximum number of workers on this system
pub fn max_workers() -> usize {
    num_cpus::get()
}
