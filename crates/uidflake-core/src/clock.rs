use jiff::Timestamp;
use std::time::Duration;

const MIN_SLEEP: Duration = Duration::from_millis(1);

/// Wall-clock source read by the allocator on every call.
///
/// Readings may move backwards; the allocator detects that and refuses to
/// allocate rather than trusting the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Blocks until [`Clock::now`] would return `target` or later.
    fn wait_until(&self, target: Timestamp);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn wait_until(&self, target: Timestamp) {
        // Sleep and recheck, spurious or short wakeups just go round again.
        loop {
            let now = Timestamp::now();
            if now >= target {
                return;
            }
            let remaining = target.duration_since(now).unsigned_abs();
            std::thread::sleep(remaining.max(MIN_SLEEP));
        }
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use crate::clock::Clock;
    use jiff::Timestamp;
    use std::sync::{Arc, Mutex};

    /// A manually driven clock. Clones share the same reading.
    #[derive(Clone)]
    pub(crate) struct TestClock {
        inner: Arc<Mutex<TestClockState>>,
    }

    struct TestClockState {
        now: Timestamp,
        waits: usize,
        rewind_to: Option<Timestamp>,
    }

    impl TestClock {
        pub(crate) fn new(now: Timestamp) -> Self {
            Self {
                inner: Arc::new(Mutex::new(TestClockState {
                    now,
                    waits: 0,
                    rewind_to: None,
                })),
            }
        }

        /// Moves the clock to `now`, backwards included.
        pub(crate) fn set(&self, now: Timestamp) {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
                .now = now;
        }

        /// Makes the next `wait_until` land on `to` instead of its target.
        pub(crate) fn rewind_on_next_wait(&self, to: Timestamp) {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
                .rewind_to = Some(to);
        }

        /// Number of times `wait_until` was called.
        pub(crate) fn waits(&self) -> usize {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
                .waits
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Timestamp {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
                .now
        }

        fn wait_until(&self, target: Timestamp) {
            let mut state = self
                .inner
                .lock()
                .expect("test clock lock should not be poisoned");
            state.waits += 1;
            if let Some(to) = state.rewind_to.take() {
                state.now = to;
            } else if target > state.now {
                // jump straight to the target instead of blocking
                state.now = target;
            }
        }
    }

    #[test]
    fn test_clock_works() {
        let base = Timestamp::from_second(0).unwrap();
        let clock = TestClock::new(base);
        assert_eq!(clock.now(), base);

        let target = Timestamp::from_second(1000).unwrap();
        clock.wait_until(target);
        assert_eq!(clock.now(), target);
        assert_eq!(clock.waits(), 1);

        clock.set(base);
        assert_eq!(clock.now(), base);

        clock.rewind_on_next_wait(Timestamp::from_second(-5).unwrap());
        clock.wait_until(target);
        assert_eq!(clock.now(), Timestamp::from_second(-5).unwrap());
        clock.wait_until(target);
        assert_eq!(clock.now(), target);
    }
}
