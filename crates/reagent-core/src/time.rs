//! Logical and physical time
//!
//! Provides discrete time management for deterministic execution:
//! - `Tag` - Logical time plus microstep
//! - `Clock` - Current tag and the physical start instant of a run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Secondary counter ordering events at the same logical time
pub type Microstep = u32;

/// A point in logical time, relative to the start of a run
///
/// Tags order by elapsed time first, then by microstep.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Tag {
    /// Elapsed logical time
    pub time: Duration,
    /// Microstep at that time
    pub microstep: Microstep,
}

impl Tag {
    /// The tag at which startup fires
    pub const ZERO: Tag = Tag {
        time: Duration::ZERO,
        microstep: 0,
    };

    /// Create a new tag
    pub fn new(time: Duration, microstep: Microstep) -> Self {
        Self { time, microstep }
    }

    /// The first tag at a given elapsed time
    pub fn at(time: Duration) -> Self {
        Self { time, microstep: 0 }
    }

    /// The next microstep at the same logical time
    pub fn next_microstep(&self) -> Self {
        Self {
            time: self.time,
            microstep: self.microstep.saturating_add(1),
        }
    }

    /// Advance by `delay`, resetting the microstep
    ///
    /// Returns `None` when the resulting time overflows.
    pub fn delayed(&self, delay: Duration) -> Option<Self> {
        if delay.is_zero() {
            return Some(self.next_microstep());
        }
        self.time.checked_add(delay).map(Self::at)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {})", self.time, self.microstep)
    }
}

/// Execution clock of a run
#[derive(Debug, Clone)]
pub struct Clock {
    /// Current logical tag
    tag: Tag,
    /// Physical instant the run started at
    start: Option<Instant>,
}

impl Clock {
    /// Create a clock at tag zero that has not started yet
    pub fn new() -> Self {
        Self {
            tag: Tag::ZERO,
            start: None,
        }
    }

    /// Record the physical start of the run
    pub fn start(&mut self) {
        self.tag = Tag::ZERO;
        self.start = Some(Instant::now());
    }

    /// Current logical tag
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Move logical time forward
    ///
    /// Logical time never goes backwards.
    pub fn advance_to(&mut self, tag: Tag) {
        debug_assert!(tag >= self.tag, "logical time went backwards");
        self.tag = tag;
    }

    /// Physical time elapsed since [`Clock::start`]
    pub fn elapsed_physical_time(&self) -> Duration {
        self.start.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Block until physical time has caught up with `tag`
    pub fn wait_until(&self, tag: Tag) {
        let elapsed = self.elapsed_physical_time();
        if tag.time > elapsed {
            std::thread::sleep(tag.time - elapsed);
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
