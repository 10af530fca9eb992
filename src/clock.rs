//! Clock abstraction for time-based state.
//!
//! Window expiry and cache TTLs are the load-bearing behavior of this crate,
//! so time is injected rather than read ambiently. Production code uses
//! [`SystemClock`]; tests drive [`MockClock`] to cross window boundaries
//! without sleeping.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Port for obtaining the current instant.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// System clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Controllable clock for deterministic tests.
///
/// Clones share the same underlying time value, so advancing one clone is
/// visible to the component holding another.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock starting at the given instant.
    pub fn new(start: Instant) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().expect("mock clock mutex poisoned");
        *current += duration;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.current.lock().expect("mock clock mutex poisoned")
    }
}
