/// Monotonic logical clock.
///
/// The replacer does not care about wall time, only about the relative order
/// of accesses, so every recorded access simply advances the clock by one
/// tick. The clock is always used under the replacer's lock, hence no
/// atomics.
#[derive(Debug, Default)]
pub struct LogicalClock {
    now: u64,
}

impl LogicalClock {
    /// Creates a new clock. The first tick yields `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self { now: 0 }
    }

    /// Advances the clock and returns the new timestamp.
    ///
    /// Whenever maximum value is reached, the function returns `None` and the
    /// clock stays put.
    pub fn tick(&mut self) -> Option<u64> {
        self.now = self.now.checked_add(1)?;
        Some(self.now)
    }

    /// Returns the timestamp of the last tick (`0` if the clock never ticked).
    pub const fn now(&self) -> u64 {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_inc() {
        let mut clock = LogicalClock::new();
        assert_eq!(clock.now(), 0);

        let mut prev = 0u64;
        for _ in 0..1000 {
            let timestamp = clock.tick().expect("Failed to get timestamp");
            assert_eq!(timestamp - prev, 1);
            assert_eq!(clock.now(), timestamp);
            prev = timestamp;
        }
    }

    #[test]
    fn exhausted() {
        let mut clock = LogicalClock { now: u64::MAX - 1 };
        assert_eq!(clock.tick(), Some(u64::MAX));
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.now(), u64::MAX);
    }
}
