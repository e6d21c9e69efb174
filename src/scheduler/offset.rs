use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::tracker::BucketKey;

/// Minute and second past each UTC hour at which the summary fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOffset {
    pub minute: u32,
    pub second: u32,
}

impl Default for SummaryOffset {
    fn default() -> Self {
        Self {
            minute: 59,
            second: 15,
        }
    }
}

impl SummaryOffset {
    pub fn validate(&self) -> Result<()> {
        if self.minute >= 60 || self.second >= 60 {
            bail!("summary offset {self} is outside the hour");
        }
        Ok(())
    }

    fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minute)) + Duration::seconds(i64::from(self.second))
    }
}

impl fmt::Display for SummaryOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minute, self.second)
    }
}

/// Parses `MM:SS`.
impl FromStr for SummaryOffset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (minute, second) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("summary offset {s:?} must look like MM:SS"))?;
        let offset = Self {
            minute: minute
                .parse()
                .with_context(|| format!("invalid minute in {s:?}"))?,
            second: second
                .parse()
                .with_context(|| format!("invalid second in {s:?}"))?,
        };
        offset.validate()?;
        Ok(offset)
    }
}

/// First instant strictly after `now` that sits at `offset` past a UTC hour.
pub fn next_fire_after(now: DateTime<Utc>, offset: SummaryOffset) -> DateTime<Utc> {
    let candidate = BucketKey::from_timestamp(now).start() + offset.as_duration();
    if candidate > now {
        candidate
    } else {
        candidate + Duration::hours(1)
    }
}

/// Next slot for the summary loop to sleep until.
///
/// A slot is never chosen twice: if the previous sleep woke early and the
/// wall clock still reads before `last_fired`, the search starts after
/// `last_fired`. Slots that passed while the loop was not running are not
/// returned, only the first one after `now`.
pub fn plan_next_fire(
    now: DateTime<Utc>,
    last_fired: Option<DateTime<Utc>>,
    offset: SummaryOffset,
) -> DateTime<Utc> {
    let reference = last_fired.map_or(now, |fired| fired.max(now));
    next_fire_after(reference, offset)
}
