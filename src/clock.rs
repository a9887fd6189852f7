use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;

/// source of "now" for decisions and payments
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl Clock for SafeTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        SafeTimeProvider::now(self)
    }
}

/// wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// clock frozen at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use hourglass_rs::TimeSource;

    #[test]
    fn test_time_provider_clock() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let time = SafeTimeProvider::new(TimeSource::Test(start));
        let control = time.test_control().unwrap();

        assert_eq!(Clock::now(&time), start);
        control.advance(Duration::days(31));
        assert_eq!(Clock::now(&time), start + Duration::days(31));
    }

    #[test]
    fn test_fixed_clock() {
        let at = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let before = Utc::now();
        let seen = SystemClock.now();
        assert!(seen >= before);
    }
}
