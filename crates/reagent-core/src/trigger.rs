//! Triggers that activate reactions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A named event of a reactor that a reaction can be bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// Fires once at tag (0, 0), before anything else
    Startup,
    /// Fires once when the run ends
    Shutdown,
    /// A timer declared on the same reactor
    Timer(String),
}

impl Trigger {
    /// Create a timer trigger
    pub fn timer(name: impl Into<String>) -> Self {
        Trigger::Timer(name.into())
    }

    /// Processing rank within a tag (lower runs first)
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Trigger::Startup => 0,
            Trigger::Timer(_) => 1,
            Trigger::Shutdown => 2,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Startup => write!(f, "startup"),
            Trigger::Shutdown => write!(f, "shutdown"),
            Trigger::Timer(name) => write!(f, "timer:{}", name),
        }
    }
}

/// Offset and optional period of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    /// Logical time of the first firing
    pub offset: Duration,
    /// Interval between firings, `None` fires once
    pub period: Option<Duration>,
}

impl TimerSpec {
    /// A timer that fires once at `offset`
    pub fn once(offset: Duration) -> Self {
        Self {
            offset,
            period: None,
        }
    }

    /// A timer that fires at `offset` and then every `period`
    pub fn periodic(offset: Duration, period: Duration) -> Self {
        Self {
            offset,
            period: Some(period),
        }
    }
}
