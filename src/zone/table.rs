use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, bounded};
use serde::Serialize;

use crate::fraction::MINUTES_PER_DAY;
use crate::zone::ZoneError;

const EMBEDDED_TABLE: &str = include_str!("../../data/tz.csv");

pub const FALLBACK_FULL_NAME: &str = "Universal Coordinated Time";

/// Signed UTC offset as written in the table's third column: `""`, `-5`,
/// `+5:30`, `-3:30`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct UtcOffset {
    pub negative: bool,
    pub hours: u8,
    pub minutes: u8,
}

impl UtcOffset {
    pub const UTC: Self = Self {
        negative: false,
        hours: 0,
        minutes: 0,
    };

    pub fn parse(raw: &str) -> Result<Self, ZoneError> {
        let text = raw.trim();
        if text.is_empty() {
            return Ok(Self::UTC);
        }

        let invalid = || ZoneError::InvalidOffset(raw.to_string());
        let (negative, unsigned) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (hours_text, minutes_text) = match unsigned.split_once(':') {
            Some((hours, minutes)) => (hours, Some(minutes)),
            None => (unsigned, None),
        };
        if hours_text.is_empty() || !hours_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hours: u8 = hours_text.parse().map_err(|_| invalid())?;
        let minutes: u8 = match minutes_text {
            Some(minutes) if minutes.len() == 2 && minutes.bytes().all(|b| b.is_ascii_digit()) => {
                minutes.parse().map_err(|_| invalid())?
            }
            Some(_) => return Err(invalid()),
            None => 0,
        };
        if hours > 14 || minutes >= 60 {
            return Err(invalid());
        }
        Ok(Self {
            negative,
            hours,
            minutes,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0
    }

    pub fn signed_hours(&self) -> i32 {
        self.sign() * i32::from(self.hours)
    }

    pub fn total_minutes(&self) -> i32 {
        self.sign() * (i32::from(self.hours) * 60 + i32::from(self.minutes))
    }

    /// Offset as a fraction of a day, negative west of Greenwich.
    pub fn day_fraction(&self) -> f64 {
        f64::from(self.total_minutes()) / MINUTES_PER_DAY
    }

    fn sign(&self) -> i32 {
        if self.negative { -1 } else { 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimezoneEntry {
    pub abbreviation: String,
    pub full_name: String,
    /// Column text as loaded, used for labels.
    pub utc_offset_raw: String,
    pub utc_offset: UtcOffset,
}

impl TimezoneEntry {
    pub fn new(abbreviation: &str, full_name: &str, utc_offset: &str) -> Result<Self, ZoneError> {
        Ok(Self {
            abbreviation: abbreviation.trim().to_string(),
            full_name: full_name.trim().to_string(),
            utc_offset_raw: utc_offset.trim().to_string(),
            utc_offset: UtcOffset::parse(utc_offset)?,
        })
    }

    pub fn utc() -> Self {
        Self {
            abbreviation: String::new(),
            full_name: FALLBACK_FULL_NAME.to_string(),
            utc_offset_raw: String::new(),
            utc_offset: UtcOffset::UTC,
        }
    }

    pub fn label(&self) -> String {
        format!(
            "UTC{}: {} ({})",
            self.utc_offset_raw, self.full_name, self.abbreviation
        )
    }
}

impl fmt::Display for TimezoneEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Ordered list of timezones; the index is the selection identifier.
/// Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TimezoneTable {
    entries: Vec<TimezoneEntry>,
}

impl Default for TimezoneTable {
    fn default() -> Self {
        Self::fallback()
    }
}

impl TimezoneTable {
    pub fn fallback() -> Self {
        Self {
            entries: vec![TimezoneEntry::utc()],
        }
    }

    pub fn embedded() -> Self {
        Self::parse_csv(EMBEDDED_TABLE).unwrap_or_else(|err| {
            log::warn!("embedded timezone table unusable: {err:#}");
            Self::fallback()
        })
    }

    /// Parses `abbreviation,full name,offset` rows. Blank lines are skipped,
    /// malformed rows are dropped with a warning, extra columns are ignored.
    pub fn parse_csv(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let columns: Vec<&str> = line.split(',').collect();
            if columns.len() < 3 {
                log::warn!(
                    "skipping timezone row {}: expected 3 columns, found {}",
                    line_no + 1,
                    columns.len()
                );
                continue;
            }
            match TimezoneEntry::new(columns[0], columns[1], columns[2]) {
                Ok(entry) => entries.push(entry),
                Err(err) => log::warn!("skipping timezone row {}: {err}", line_no + 1),
            }
        }
        if entries.is_empty() {
            bail!("timezone table contains no valid rows");
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("unable to read timezone table {}", path.display()))?;
        Self::parse_csv(&content)
            .with_context(|| format!("invalid timezone table {}", path.display()))
    }

    pub fn entries(&self) -> &[TimezoneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The `UTC` row if present, otherwise the first zero-offset row,
    /// otherwise the first row.
    pub fn utc_index(&self) -> usize {
        self.entries
            .iter()
            .position(|entry| entry.abbreviation.eq_ignore_ascii_case("UTC"))
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|entry| entry.utc_offset_raw.is_empty())
            })
            .unwrap_or(0)
    }

    /// Resolves a user-supplied zone reference: an index, an abbreviation or
    /// a full name.
    pub fn find(&self, reference: &str) -> Result<usize, ZoneError> {
        let reference = reference.trim();
        if let Ok(index) = reference.parse::<usize>() {
            return if index < self.len() {
                Ok(index)
            } else {
                Err(ZoneError::IndexOutOfRange {
                    index,
                    len: self.len(),
                })
            };
        }
        self.entries
            .iter()
            .position(|entry| entry.abbreviation.eq_ignore_ascii_case(reference))
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|entry| entry.full_name.eq_ignore_ascii_case(reference))
            })
            .ok_or_else(|| ZoneError::UnknownZone(reference.to_string()))
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TableSource {
    Embedded,
    File(PathBuf),
}

impl TableSource {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map(Self::File).unwrap_or(Self::Embedded)
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Embedded => "built-in table".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    pub fn load(&self) -> Result<TimezoneTable> {
        match self {
            Self::Embedded => Ok(TimezoneTable::embedded()),
            Self::File(path) => TimezoneTable::load(path),
        }
    }
}

pub struct LoadedTable {
    pub table: TimezoneTable,
    pub fallback_reason: Option<String>,
}

/// Loads the table, degrading to the single UTC entry on failure.
pub fn load_or_fallback(source: &TableSource) -> LoadedTable {
    match source.load() {
        Ok(table) => {
            log::info!(
                "loaded {} timezones from {}",
                table.len(),
                source.describe()
            );
            LoadedTable {
                table,
                fallback_reason: None,
            }
        }
        Err(err) => {
            log::warn!("timezone table unavailable, using UTC only: {err:#}");
            LoadedTable {
                table: TimezoneTable::fallback(),
                fallback_reason: Some(format!("{err:#}")),
            }
        }
    }
}

/// Starts a one-shot background load. The receiver yields exactly one
/// table, the fallback one if loading failed.
pub fn spawn_table_load(source: TableSource) -> Receiver<LoadedTable> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let loaded = load_or_fallback(&source);
        let _ = tx.send(loaded);
    });
    rx
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_offsets_with_and_without_minutes() {
        assert_eq!(UtcOffset::parse("").expect("utc"), UtcOffset::UTC);
        let east = UtcOffset::parse("+5:30").expect("india");
        assert_eq!(east.total_minutes(), 330);
        assert_eq!(east.signed_hours(), 5);
        let west = UtcOffset::parse("-3:30").expect("newfoundland");
        assert_eq!(west.total_minutes(), -210);
        assert_eq!(west.signed_hours(), -3);
        assert_eq!(UtcOffset::parse("9").expect("bare").total_minutes(), 540);
        assert!((UtcOffset::parse("-5").expect("est").day_fraction() + 5.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_malformed_offsets() {
        for raw in ["+", "abc", "+5:3", "+5:xx", "+25", "5:60", "--5"] {
            assert!(UtcOffset::parse(raw).is_err(), "{raw} should fail");
        }
    }

    #[test]
    fn embedded_table_has_utc_row() {
        let table = TimezoneTable::embedded();
        assert!(table.len() > 50);
        let utc = &table.entries()[table.utc_index()];
        assert_eq!(utc.abbreviation, "UTC");
        assert!(utc.utc_offset.is_zero());
    }

    #[test]
    fn csv_parsing_skips_blank_and_malformed_rows() {
        let text = "EST,Eastern Standard Time,-5\r\n\nbroken row\nXXX,Bad Offset,+9:9\nUTC,Universal Coordinated Time,\n";
        let table = TimezoneTable::parse_csv(text).expect("two valid rows");
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].utc_offset.signed_hours(), -5);
        assert_eq!(table.utc_index(), 1);
    }

    #[test]
    fn csv_without_valid_rows_is_an_error() {
        let err = TimezoneTable::parse_csv("\n\nnope\n").expect_err("no rows");
        assert!(err.to_string().contains("no valid rows"));
    }

    #[test]
    fn labels_follow_selector_format() {
        let entry = TimezoneEntry::new("IST", "India Standard Time", "+5:30").expect("entry");
        assert_eq!(entry.label(), "UTC+5:30: India Standard Time (IST)");
        assert_eq!(
            TimezoneEntry::utc().label(),
            "UTC: Universal Coordinated Time ()"
        );
    }

    #[test]
    fn find_accepts_index_abbreviation_and_name() {
        let table = TimezoneTable::embedded();
        let est = table.find("est").expect("abbreviation");
        assert_eq!(table.entries()[est].full_name, "Eastern Standard Time");
        assert_eq!(table.find("Japan Standard Time").expect("name"), table.find("JST").expect("abbr"));
        assert_eq!(table.find("0").expect("index"), 0);
        assert!(matches!(
            table.find("9999"),
            Err(ZoneError::IndexOutOfRange { .. })
        ));
        assert!(matches!(table.find("Mars Time"), Err(ZoneError::UnknownZone(_))));
    }

    #[test]
    fn missing_file_degrades_to_fallback() {
        let source = TableSource::File(PathBuf::from("/definitely/not/here/tz.csv"));
        let loaded = load_or_fallback(&source);
        assert_eq!(loaded.table, TimezoneTable::fallback());
        let reason = loaded.fallback_reason.expect("reason");
        assert!(reason.contains("unable to read timezone table"));
    }

    #[test]
    fn background_load_delivers_one_table() {
        let rx = spawn_table_load(TableSource::Embedded);
        let loaded = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("table should arrive");
        assert!(loaded.fallback_reason.is_none());
        assert!(loaded.table.len() > 1);
    }
}
