/// Timestamps in Geomessage format, and an injectable clock.
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Error, SRResult};

/// Timestamp pattern shared by every Geomessage field carrying a time. Always UTC.
pub const GEOMESSAGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of "now". Swapped out in tests so output is reproducible.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock stopped at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.format(GEOMESSAGE_TIME_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> SRResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), GEOMESSAGE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::ParseError(format!("timestamp {s:?}: {e}")))
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let t = Utc.with_ymd_and_hms(2015, 3, 9, 17, 4, 5).unwrap();
        assert_eq!(format_timestamp(&t), "2015-03-09 17:04:05");
        assert_eq!(parse_timestamp("2015-03-09 17:04:05").unwrap(), t);
    }

    #[test]
    fn test_format_drops_subseconds() {
        let t = Utc.with_ymd_and_hms(2020, 12, 31, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(format_timestamp(&t), "2020-12-31 23:59:59");
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_fixed_clock() {
        let t = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), clock.now());
    }
}
