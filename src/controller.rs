use serde::Serialize;
use thiserror::Error;

use crate::florence::{MAX_RESOLUTION, encode};
use crate::fraction::{DayFraction, FractionError, day_fraction_to_hhmm, parse_hhmm};
use crate::zone::ZoneError;
use crate::zone::detect::LocalZoneHint;
use crate::zone::resolver::{to_canonical, to_display};
use crate::zone::table::{TimezoneEntry, TimezoneTable};

pub const HEX_TEXT_RESOLUTION: usize = 2;
pub const HEX_SLIDER_MAX: u8 = 255;
pub const MINUTE_SLIDER_MAX: u16 = 287;

const HEX_SLIDER_STEPS: f64 = 256.0;
const MINUTE_SLIDER_STEPS: f64 = 288.0;

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("hex time must start with '.', got '{0}'")]
    MissingRadixPoint(String),
    #[error("'{0}' is not a hexadecimal time")]
    InvalidHex(String),
    #[error("minute slider value {0} is above {MINUTE_SLIDER_MAX}")]
    MinuteSliderOutOfRange(u16),
    #[error(transparent)]
    Time(#[from] FractionError),
    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// The single source of truth every widget is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockState {
    pub fraction: DayFraction,
    pub timezone_index: usize,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            fraction: DayFraction::NOON,
            timezone_index: 0,
        }
    }
}

/// Values of the interactive widgets, all derived from [`ClockState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetSnapshot {
    pub fraction: DayFraction,
    pub hex_text: String,
    pub hex_slider: u8,
    /// Horizontal position of the hex text field, in percent of the track.
    pub hex_position_percent: f64,
    pub time_text: String,
    pub minute_slider: u16,
    pub timezone_index: usize,
    pub timezone_label: String,
}

pub struct ClockController {
    state: ClockState,
    table: TimezoneTable,
}

impl Default for ClockController {
    fn default() -> Self {
        Self::new(TimezoneTable::fallback(), 0)
    }
}

impl ClockController {
    pub fn new(table: TimezoneTable, timezone_index: usize) -> Self {
        let timezone_index = if timezone_index < table.len() {
            timezone_index
        } else {
            table.utc_index()
        };
        Self {
            state: ClockState {
                timezone_index,
                ..ClockState::default()
            },
            table,
        }
    }

    pub fn with_hint(table: TimezoneTable, hint: &LocalZoneHint) -> Self {
        let index = hint.resolve_default_index(&table);
        Self::new(table, index)
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn table(&self) -> &TimezoneTable {
        &self.table
    }

    pub fn selected_entry(&self) -> &TimezoneEntry {
        // `timezone_index` is only ever set to an index checked against `table`.
        &self.table.entries()[self.state.timezone_index]
    }

    /// Accepts `.X` .. `.XXXXXXXXXXXXX`, read in maximes: the numeral is
    /// divided by 256 and wrapped into the day. A lone digit is the high
    /// nibble, so `.8` and `.80` are the same time, and `.123` wraps to
    /// `0x23 / 256`.
    pub fn on_hex_text_edit(&mut self, raw: &str) -> Result<DayFraction, EditError> {
        let Some(digits) = raw.strip_prefix('.') else {
            return Err(EditError::MissingRadixPoint(raw.to_string()));
        };
        if digits.is_empty()
            || digits.len() > MAX_RESOLUTION
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(EditError::InvalidHex(raw.to_string()));
        }
        let value = u64::from_str_radix(digits, 16)
            .map_err(|_| EditError::InvalidHex(raw.to_string()))?;
        let maximes = if digits.len() == 1 { value * 16 } else { value };
        let shown = DayFraction::new(maximes as f64 / HEX_SLIDER_STEPS)?;
        Ok(self.commit(to_canonical(shown, self.selected_entry())))
    }

    pub fn on_hex_slider_drag(&mut self, raw: u8) -> Result<DayFraction, EditError> {
        let shown = DayFraction::new(f64::from(raw) / HEX_SLIDER_STEPS)?;
        Ok(self.commit(to_canonical(shown, self.selected_entry())))
    }

    /// `HH:MM` is universal time and is stored as is.
    pub fn on_time_widget_edit(&mut self, raw: &str) -> Result<DayFraction, EditError> {
        let fraction = parse_hhmm(raw)?;
        Ok(self.commit(fraction))
    }

    pub fn on_minute_slider_drag(&mut self, raw: u16) -> Result<DayFraction, EditError> {
        if raw > MINUTE_SLIDER_MAX {
            return Err(EditError::MinuteSliderOutOfRange(raw));
        }
        let fraction = DayFraction::new(f64::from(raw) / MINUTE_SLIDER_STEPS)?;
        Ok(self.commit(fraction))
    }

    pub fn on_timezone_select(&mut self, index: usize) -> Result<(), EditError> {
        if index >= self.table.len() {
            return Err(ZoneError::IndexOutOfRange {
                index,
                len: self.table.len(),
            }
            .into());
        }
        self.state.timezone_index = index;
        Ok(())
    }

    /// Swaps in a freshly loaded table and selects the hinted default zone.
    /// The canonical fraction is kept.
    pub fn install_table(&mut self, table: TimezoneTable, hint: &LocalZoneHint) {
        self.state.timezone_index = hint.resolve_default_index(&table);
        self.table = table;
    }

    pub fn display_fraction(&self) -> DayFraction {
        to_display(self.state.fraction, self.selected_entry())
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        let fraction = self.state.fraction;
        let shown = self.display_fraction();
        let hex_slider = (shown.value() * HEX_SLIDER_STEPS)
            .round()
            .min(f64::from(HEX_SLIDER_MAX)) as u8;
        let minute_slider = (fraction.value() * MINUTE_SLIDER_STEPS)
            .round()
            .min(f64::from(MINUTE_SLIDER_MAX)) as u16;

        WidgetSnapshot {
            fraction,
            hex_text: encode(shown, HEX_TEXT_RESOLUTION, true),
            hex_slider,
            hex_position_percent: shown.value() * 100.0,
            time_text: day_fraction_to_hhmm(fraction),
            minute_slider,
            timezone_index: self.state.timezone_index,
            timezone_label: self.selected_entry().label(),
        }
    }

    fn commit(&mut self, fraction: DayFraction) -> DayFraction {
        self.state.fraction = fraction;
        fraction
    }
}
