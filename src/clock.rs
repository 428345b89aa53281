use chrono::{DateTime, Local};
use tokio::time::Instant;

/// Source of wall-clock dates and monotonic instants. Swapped out in tests so the host's
/// notion of "today" follows tokio's paused clock.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Local>;

    fn instant(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use chrono::{DateTime, Local};
    use tokio::time::Instant;

    use super::Clock;

    /// Wall clock anchored at `start` and advanced by tokio's (possibly paused) time.
    #[derive(Clone)]
    pub struct TestClock {
        start: DateTime<Local>,
        reference: Instant,
    }

    impl TestClock {
        pub fn starting_at(start: DateTime<Local>) -> Self {
            Self {
                start,
                reference: Instant::now(),
            }
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Local> {
            self.start + chrono::Duration::from_std(self.reference.elapsed()).unwrap_or_default()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }
    }
}
