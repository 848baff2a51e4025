//! Clock abstraction for deterministic testing.
//!
//! Decouples timeout logic from the system clock. Production uses
//! [`SystemClock`]; tests use [`test_utils::MockClock`] and advance time
//! manually.

use std::time::Duration;

/// Abstract monotonic clock.
///
/// Implementations MUST guarantee that `now()` never goes backwards within
/// a single execution context.
pub trait Clock: Clone + Send + Sync + 'static {
    /// The specific instant type used by this clock.
    ///
    /// Production clocks use `std::time::Instant`; test clocks use virtual
    /// time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;
}

/// System clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }
}

/// Test clocks with manually driven virtual time.
pub mod test_utils {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use super::Clock;

    /// Virtual instant: milliseconds since the clock was created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct MockInstant(u64);

    impl std::ops::Sub for MockInstant {
        type Output = Duration;

        fn sub(self, rhs: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(rhs.0))
        }
    }

    /// Clock whose time only moves when [`MockClock::advance`] is called.
    ///
    /// Clones share the same underlying time.
    #[derive(Debug, Clone, Default)]
    pub struct MockClock {
        now_ms: Arc<AtomicU64>,
    }

    impl MockClock {
        /// Create a clock at time zero.
        pub fn new() -> Self {
            Self::default()
        }

        /// Move time forward.
        pub fn advance(&self, duration: Duration) {
            let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
            self.now_ms.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Clock for MockClock {
        type Instant = MockInstant;

        fn now(&self) -> MockInstant {
            MockInstant(self.now_ms.load(Ordering::SeqCst))
        }
    }

}
