use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

// ============================================================================
// Injected Clock
// ============================================================================
//
// Transition timestamps come from an explicit clock dependency instead of an
// ambient global, so lifecycles are deterministic and replayable in tests.
//
// ============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock that starts at a fixed instant and advances by a fixed step on
/// every read, so consecutive timestamps are distinct but predictable.
pub struct SteppingClock {
    current: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn starting_at(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().expect("clock lock poisoned");
        let now = *current;
        *current += self.step;
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stepping_clock_advances_per_read() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let clock = SteppingClock::starting_at(start, Duration::seconds(30));

        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start + Duration::seconds(30));
        assert_eq!(clock.now(), start + Duration::seconds(60));
    }
}
