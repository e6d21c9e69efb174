use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use std::{fmt, str::FromStr};

const KEY_FORMAT: &str = "%Y-%m-%d-%H";

/// Identifies a one-hour window, always computed in UTC.
///
/// Ordering is chronological. For four-digit years it also agrees with the
/// lexicographic order of the `YYYY-MM-DD-HH` text form, so keys can be
/// logged and compared interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey(NaiveDateTime);

impl BucketKey {
    /// The bucket containing `ts`. Same wall-clock hour, same key, on any host.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        let midnight = ts.date_naive().and_time(NaiveTime::MIN);
        Self(midnight + Duration::hours(i64::from(ts.hour())))
    }

    pub fn start(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.0)
    }

    /// Last instant that still belongs to this bucket, at second precision.
    pub fn end(&self) -> DateTime<Utc> {
        self.start() + Duration::hours(1) - Duration::seconds(1)
    }

    pub fn hours_before(&self, hours: i64) -> Self {
        Self(self.0 - Duration::hours(hours))
    }

    pub fn next(&self) -> Self {
        Self(self.0 + Duration::hours(1))
    }

    /// Human-readable span such as `09:00-09:59`, shifted into `offset`.
    pub fn display_range(&self, offset: &FixedOffset) -> String {
        let start = self.start().with_timezone(offset);
        let end = self.end().with_timezone(offset);
        format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(KEY_FORMAT))
    }
}

impl FromStr for BucketKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = NaiveDateTime::parse_from_str(&format!("{s}:00"), "%Y-%m-%d-%H:%M")
            .with_context(|| format!("invalid bucket key {s:?}"))?;
        let key = Self(parsed);
        // chrono accepts unpadded fields; keys must stay in canonical form
        if key.to_string() != s {
            return Err(anyhow!("bucket key {s:?} is not in YYYY-MM-DD-HH form"));
        }
        Ok(key)
    }
}
