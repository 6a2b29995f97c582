use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::Serialize;
use thiserror::Error;

pub const MILLIS_PER_DAY: f64 = 86_400_000.0;
pub const MINUTES_PER_DAY: f64 = 1_440.0;

/// Florence's longitude (11.25 degrees east) as a fraction of a day.
pub const FLORENCE_OFFSET: f64 = 11.25 / 360.0;

#[derive(Debug, Error, PartialEq)]
pub enum FractionError {
    #[error("day fraction must be finite, got {0}")]
    NonFinite(f64),
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}

/// Time of day as a fraction of a full day, always in `[0, 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct DayFraction(f64);

impl DayFraction {
    pub const NOON: Self = Self(0.5);

    /// Reduces `value` modulo 1. Fails for NaN and infinities so they never
    /// reach canonical state.
    pub fn new(value: f64) -> Result<Self, FractionError> {
        if !value.is_finite() {
            return Err(FractionError::NonFinite(value));
        }
        Ok(Self(wrap_unit(value)))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Adds `delta` days and wraps around midnight.
    pub fn shifted(self, delta: f64) -> Self {
        if delta.is_finite() {
            Self(wrap_unit(self.0 + delta))
        } else {
            self
        }
    }

    /// Circular distance to `other`, in days.
    #[cfg(test)]
    pub fn distance(self, other: Self) -> f64 {
        let raw = (self.0 - other.0).abs();
        raw.min(1.0 - raw)
    }
}

impl fmt::Display for DayFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// `rem_euclid` can round up to exactly 1.0 for tiny negative inputs.
fn wrap_unit(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

pub fn millis_to_day_fraction(ms: i64) -> DayFraction {
    DayFraction(wrap_unit(ms as f64 / MILLIS_PER_DAY + FLORENCE_OFFSET))
}

/// Renders a fraction as `HH:MM`.
///
/// The minute field is rounded on its own and is not carried into the hour,
/// so a fraction a few seconds before the top of an hour renders as `HH:00`
/// of the hour that is ending.
pub fn day_fraction_to_hhmm(fraction: DayFraction) -> String {
    let hour = (24.0 * fraction.0).floor() as u32;
    let minute = (MINUTES_PER_DAY * fraction.0).round() as u32 % 60;
    format!("{hour:02}:{minute:02}")
}

pub fn parse_hhmm(raw: &str) -> Result<DayFraction, FractionError> {
    let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| FractionError::InvalidTime(raw.to_string()))?;
    let minutes = time.hour() * 60 + time.minute();
    DayFraction::new(f64::from(minutes) / MINUTES_PER_DAY)
}
