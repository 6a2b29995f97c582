use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, TimeZone, Utc};

use crate::fraction::{DayFraction, millis_to_day_fraction};

/// How often the passive clock re-samples the time source.
pub const TICK_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeSourceKind {
    System,
    Fixed(i64),
}

#[derive(Clone, Debug)]
pub struct TimeSample {
    pub unix_millis: i64,
    pub source: &'static str,
}

impl TimeSample {
    pub fn day_fraction(&self) -> DayFraction {
        millis_to_day_fraction(self.unix_millis)
    }

    pub fn to_local_datetime(&self) -> Result<DateTime<Local>> {
        Local
            .timestamp_millis_opt(self.unix_millis)
            .single()
            .ok_or_else(|| anyhow!("failed to convert sample into local datetime"))
    }
}

pub trait TimeSource: Send + Sync {
    fn now(&self) -> Result<TimeSample>;
    fn label(&self) -> &'static str;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Result<TimeSample> {
        Ok(TimeSample {
            unix_millis: Utc::now().timestamp_millis(),
            source: self.label(),
        })
    }

    fn label(&self) -> &'static str {
        "SYSTEM_UTC"
    }
}

/// Always reports the same instant.
pub struct FixedTimeSource {
    unix_millis: i64,
}

impl FixedTimeSource {
    pub fn new(unix_millis: i64) -> Result<Self> {
        if Utc.timestamp_millis_opt(unix_millis).single().is_none() {
            return Err(anyhow!("timestamp {unix_millis} ms is out of range"));
        }
        Ok(Self { unix_millis })
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Result<TimeSample> {
        Ok(TimeSample {
            unix_millis: self.unix_millis,
            source: self.label(),
        })
    }

    fn label(&self) -> &'static str {
        "FIXED"
    }
}

pub struct SelectedTimeSource {
    pub source: Box<dyn TimeSource>,
    pub label: &'static str,
}

pub fn select_source(kind: TimeSourceKind) -> Result<SelectedTimeSource> {
    let source: Box<dyn TimeSource> = match kind {
        TimeSourceKind::System => Box::new(SystemTimeSource),
        TimeSourceKind::Fixed(unix_millis) => Box::new(FixedTimeSource::new(unix_millis)?),
    };
    Ok(SelectedTimeSource {
        label: source.label(),
        source,
    })
}
