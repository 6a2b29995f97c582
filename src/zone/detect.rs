use chrono::{DateTime, Local, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::zone::ZoneError;
use crate::zone::table::TimezoneTable;

/// What the environment says about the viewer's timezone.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct LocalZoneHint {
    pub abbreviation: String,
    /// Whole hours east of UTC; minutes are dropped (`+0530` gives `5`).
    pub hour_offset: i32,
    pub name: String,
}

impl LocalZoneHint {
    /// Parses a JavaScript-style date string such as
    /// `Fri Oct 16 2026 14:00:00 GMT+0200 (Central European Summer Time)`.
    /// Some engines put an abbreviation in the parentheses (`(CEST)`).
    pub fn parse(repr: &str) -> Result<Self, ZoneError> {
        let invalid = || ZoneError::InvalidDateRepr(repr.to_string());

        let gmt = repr.find("GMT").ok_or_else(invalid)?;
        let offset_text = repr[gmt + 3..].trim_start();
        let mut chars = offset_text.chars();
        let sign = match chars.next() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Err(invalid()),
        };
        let hours_text = offset_text.get(1..3).ok_or_else(invalid)?;
        let hours: i32 = hours_text.parse().map_err(|_| invalid())?;

        let name = match (repr.find('('), repr.rfind(')')) {
            (Some(open), Some(close)) if close > open => repr[open + 1..close].trim().to_string(),
            _ => String::new(),
        };

        Ok(Self {
            abbreviation: abbreviate(&name),
            hour_offset: sign * hours,
            name,
        })
    }

    /// Builds the same representation from a chrono datetime so detection
    /// never reads process-wide state itself.
    pub fn from_datetime<Tz: TimeZone>(now: &DateTime<Tz>, zone_name: Option<&str>) -> Self {
        let offset_seconds = now.offset().fix().local_minus_utc();
        let name = zone_name.map(str::trim).unwrap_or_default().to_string();
        Self {
            abbreviation: abbreviate(&name),
            hour_offset: offset_seconds / 3_600,
            name,
        }
    }

    /// Builds a hint from an IANA zone such as `America/New_York`, with the
    /// abbreviation and offset in effect at `now`.
    pub fn from_iana(zone: &str, now: DateTime<Utc>) -> Result<Self, ZoneError> {
        let tz: Tz = zone
            .trim()
            .parse()
            .map_err(|_| ZoneError::UnknownIanaZone(zone.to_string()))?;
        let local = now.with_timezone(&tz);
        Ok(Self {
            abbreviation: local.format("%Z").to_string(),
            hour_offset: local.offset().fix().local_minus_utc() / 3_600,
            name: String::new(),
        })
    }

    /// Hint for the machine's own zone. `system_zone` is the IANA name the
    /// environment reports; without a usable one only the local clock's
    /// offset is known, which matches nothing and selects UTC.
    pub fn detect_system(now: DateTime<Utc>, system_zone: Option<&str>) -> Self {
        if let Some(zone) = system_zone {
            match Self::from_iana(zone, now) {
                Ok(hint) => return hint,
                Err(err) => log::warn!("ignoring system timezone: {err}"),
            }
        }
        Self::from_datetime(&now.with_timezone(&Local), None)
    }

    /// Picks the table row for this hint: by full name first, then by
    /// abbreviation with the same signed hour offset, else the UTC row.
    pub fn resolve_default_index(&self, table: &TimezoneTable) -> usize {
        self.match_index(table).unwrap_or_else(|| table.utc_index())
    }

    pub fn match_index(&self, table: &TimezoneTable) -> Option<usize> {
        let entries = table.entries();
        if !self.name.is_empty()
            && let Some(index) = entries.iter().position(|entry| entry.full_name == self.name)
        {
            return Some(index);
        }
        if self.abbreviation.is_empty() {
            return None;
        }
        entries.iter().position(|entry| {
            entry.abbreviation == self.abbreviation
                && entry.utc_offset.signed_hours() == self.hour_offset
        })
    }

    pub fn describe(&self) -> String {
        let name = if self.name.is_empty() {
            "unnamed zone"
        } else {
            self.name.as_str()
        };
        format!("{name} ({}, UTC{:+})", self.abbreviation, self.hour_offset)
    }
}

/// `CEST` stays `CEST`; `Central European Summer Time` becomes `CEST`.
fn abbreviate(name: &str) -> String {
    let is_abbreviation = !name.is_empty()
        && !name.contains(char::is_whitespace)
        && name.chars().all(|c| c.is_ascii_alphabetic())
        && name.chars().filter(char::is_ascii_uppercase).count() >= 2;
    if is_abbreviation {
        return name.to_string();
    }
    name.split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|word| word.chars().next())
        .filter(char::is_ascii_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Kolkata;

    use super::*;

    #[test]
    fn parses_long_zone_names() {
        let hint =
            LocalZoneHint::parse("Fri Oct 16 2026 14:00:00 GMT+0200 (Central European Summer Time)")
                .expect("valid repr");
        assert_eq!(hint.hour_offset, 2);
        assert_eq!(hint.name, "Central European Summer Time");
        assert_eq!(hint.abbreviation, "CEST");
    }

    #[test]
    fn parses_abbreviated_zone_names() {
        let hint = LocalZoneHint::parse("Fri Oct 16 2026 08:00:00 GMT-0400 (EDT)").expect("valid");
        assert_eq!(hint.hour_offset, -4);
        assert_eq!(hint.name, "EDT");
        assert_eq!(hint.abbreviation, "EDT");
    }

    #[test]
    fn half_hour_offsets_keep_whole_hours() {
        let hint = LocalZoneHint::parse("Fri Oct 16 2026 17:30:00 GMT+0530 (India Standard Time)")
            .expect("valid");
        assert_eq!(hint.hour_offset, 5);
    }

    #[test]
    fn rejects_representations_without_offset() {
        assert!(LocalZoneHint::parse("Fri Oct 16 2026 14:00:00").is_err());
        assert!(LocalZoneHint::parse("Fri Oct 16 2026 GMT (UTC)").is_err());
    }

    #[test]
    fn builds_hint_from_chrono_datetimes() {
        let summer = New_York
            .with_ymd_and_hms(2026, 7, 1, 12, 0, 0)
            .single()
            .expect("valid local time");
        let hint = LocalZoneHint::from_datetime(&summer, Some("Eastern Daylight Time"));
        assert_eq!(hint.hour_offset, -4);
        assert_eq!(hint.abbreviation, "EDT");

        let india = Kolkata
            .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("valid local time");
        assert_eq!(LocalZoneHint::from_datetime(&india, None).hour_offset, 5);

        let fixed = FixedOffset::west_opt(3 * 3_600 + 1_800)
            .expect("offset")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("valid");
        assert_eq!(LocalZoneHint::from_datetime(&fixed, None).hour_offset, -3);
    }

    #[test]
    fn resolves_by_full_name_then_abbreviation() {
        let table = TimezoneTable::embedded();

        let by_name = LocalZoneHint::from_datetime(&Utc::now(), Some("Japan Standard Time"));
        let index = by_name.resolve_default_index(&table);
        assert_eq!(table.entries()[index].abbreviation, "JST");

        let by_abbreviation =
            LocalZoneHint::parse("Fri Oct 16 2026 08:00:00 GMT-0400 (EDT)").expect("valid");
        let index = by_abbreviation.resolve_default_index(&table);
        assert_eq!(table.entries()[index].full_name, "Eastern Daylight Time");
    }

    #[test]
    fn ambiguous_abbreviation_uses_offset() {
        let table = TimezoneTable::embedded();
        let china = LocalZoneHint::parse("Fri Oct 16 2026 20:00:00 GMT+0800 (CST)").expect("valid");
        let index = china.resolve_default_index(&table);
        assert_eq!(table.entries()[index].full_name, "China Standard Time");

        let central = LocalZoneHint::parse("Fri Oct 16 2026 06:00:00 GMT-0600 (CST)").expect("valid");
        let index = central.resolve_default_index(&table);
        assert_eq!(table.entries()[index].full_name, "Central Standard Time");
    }

    #[test]
    fn system_zone_selects_daylight_row_in_summer() {
        let table = TimezoneTable::embedded();
        let july = Utc
            .with_ymd_and_hms(2026, 7, 1, 16, 0, 0)
            .single()
            .expect("valid instant");
        let hint = LocalZoneHint::detect_system(july, Some("America/New_York"));
        assert_eq!(hint.abbreviation, "EDT");
        assert_eq!(hint.hour_offset, -4);
        let index = hint.resolve_default_index(&table);
        assert_eq!(table.entries()[index].full_name, "Eastern Daylight Time");

        let january = Utc
            .with_ymd_and_hms(2026, 1, 15, 16, 0, 0)
            .single()
            .expect("valid instant");
        let index =
            LocalZoneHint::detect_system(january, Some("America/New_York")).resolve_default_index(&table);
        assert_eq!(table.entries()[index].full_name, "Eastern Standard Time");
    }

    #[test]
    fn system_zone_uses_offset_to_split_shared_abbreviations() {
        let table = TimezoneTable::embedded();
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid instant");
        let kolkata = LocalZoneHint::detect_system(now, Some("Asia/Kolkata"));
        let index = kolkata.resolve_default_index(&table);
        assert_eq!(table.entries()[index].full_name, "India Standard Time");

        let tokyo = LocalZoneHint::detect_system(now, Some("Asia/Tokyo"));
        assert_eq!(table.entries()[tokyo.resolve_default_index(&table)].abbreviation, "JST");

        let utc = LocalZoneHint::detect_system(now, Some("Etc/UTC"));
        assert_eq!(utc.resolve_default_index(&table), table.utc_index());
    }

    #[test]
    fn unusable_system_zone_falls_back_to_utc() {
        let table = TimezoneTable::embedded();
        assert!(matches!(
            LocalZoneHint::from_iana("Mars/Olympus_Mons", Utc::now()),
            Err(ZoneError::UnknownIanaZone(_))
        ));
        let hint = LocalZoneHint::detect_system(Utc::now(), Some("Mars/Olympus_Mons"));
        assert_eq!(hint.resolve_default_index(&table), table.utc_index());
        let unknown = LocalZoneHint::detect_system(Utc::now(), None);
        assert_eq!(unknown.resolve_default_index(&table), table.utc_index());
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        let table = TimezoneTable::embedded();
        let hint = LocalZoneHint::parse("Fri Oct 16 2026 14:00:00 GMT+0200 (Martian Time)")
            .expect("valid");
        assert_eq!(hint.resolve_default_index(&table), table.utc_index());

        let nameless = LocalZoneHint::from_datetime(&Utc::now(), None);
        assert_eq!(nameless.resolve_default_index(&table), table.utc_index());
    }
}
