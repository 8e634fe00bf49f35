use chrono::{DateTime, Utc};

/// Clock abstraction so archival timestamps and run metadata are
/// testable without depending on wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Filesystem-safe rendering of a UTC timestamp for archival directory names.
/// Colons aren't valid on some filesystems, so `:` becomes `-`.
pub fn utc_safe_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn safe_timestamp_has_no_colons() {
        let at = Utc.with_ymd_and_hms(2025, 1, 4, 10, 30, 5).unwrap();
        let rendered = utc_safe_timestamp(at);
        assert!(!rendered.contains(':'));
        assert!(rendered.starts_with("2025-01-04T10-30-05"));
    }
}
