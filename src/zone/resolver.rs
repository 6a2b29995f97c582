use crate::fraction::{DayFraction, FLORENCE_OFFSET};
use crate::zone::table::TimezoneEntry;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn factor(self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }
}

/// Shifts `fraction` by the Florence longitude (`florence`) and by the
/// entry's UTC offset (`direction`), then wraps into `[0, 1)`.
///
/// Hours and minutes of the offset move together, so `+5:30` shifts by
/// 330 minutes and `-3:30` by -210.
pub fn apply_offset(
    fraction: DayFraction,
    entry: &TimezoneEntry,
    direction: Sign,
    florence: Sign,
) -> DayFraction {
    let mut shifted = fraction.shifted(florence.factor() * FLORENCE_OFFSET);
    if !entry.utc_offset.is_zero() {
        shifted = shifted.shifted(direction.factor() * entry.utc_offset.day_fraction());
    }
    shifted
}

/// Canonical fraction to the value shown by the hex widgets.
pub fn to_display(canonical: DayFraction, entry: &TimezoneEntry) -> DayFraction {
    apply_offset(canonical, entry, Sign::Plus, Sign::Plus)
}

/// Hex widget value back to the canonical fraction; inverse of
/// [`to_display`].
pub fn to_canonical(display: DayFraction, entry: &TimezoneEntry) -> DayFraction {
    apply_offset(display, entry, Sign::Minus, Sign::Minus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::florence::encode;
    use crate::zone::table::TimezoneTable;

    const TOLERANCE: f64 = 1e-9;

    fn fraction(value: f64) -> DayFraction {
        DayFraction::new(value).expect("finite fraction")
    }

    #[test]
    fn display_adds_florence_offset_for_utc() {
        let entry = TimezoneEntry::utc();
        let shown = to_display(DayFraction::NOON, &entry);
        assert!((shown.value() - (0.5 + FLORENCE_OFFSET)).abs() < TOLERANCE);
    }

    #[test]
    fn canonical_and_display_round_trip_for_every_zone() {
        let table = TimezoneTable::embedded();
        let samples = [0.0, 0.01, 0.25, 0.5, 0.731, 0.968_75, 0.999_999];
        for entry in table.entries() {
            for value in samples {
                let original = fraction(value);
                let back = to_canonical(to_display(original, entry), entry);
                assert!(
                    back.distance(original) < TOLERANCE,
                    "{} at {value}: got {back}",
                    entry.abbreviation
                );
            }
        }
    }

    #[test]
    fn explicit_signs_match_named_operations() {
        let entry = TimezoneEntry::new("NPT", "Nepal Time", "+5:45").expect("entry");
        let value = fraction(0.4);
        assert_eq!(
            apply_offset(value, &entry, Sign::Plus, Sign::Plus),
            to_display(value, &entry)
        );
        let forward = apply_offset(value, &entry, Sign::Plus, Sign::Plus);
        let back = apply_offset(forward, &entry, Sign::Minus, Sign::Minus);
        assert!(back.distance(value) < TOLERANCE);
    }

    #[test]
    fn negative_offset_shifts_display_backwards() {
        let utc = TimezoneEntry::utc();
        let eastern = TimezoneEntry::new("EST", "Eastern Standard Time", "-5").expect("entry");
        let canonical = fraction(0.6);
        let shift = to_display(canonical, &eastern).value() - to_display(canonical, &utc).value();
        assert!((shift.rem_euclid(1.0) - (1.0 - 5.0 / 24.0)).abs() < TOLERANCE);
    }

    #[test]
    fn minutes_follow_offset_sign() {
        let utc = TimezoneEntry::utc();
        let newfoundland =
            TimezoneEntry::new("NST", "Newfoundland Standard Time", "-3:30").expect("entry");
        let canonical = fraction(0.5);
        let shift =
            to_display(canonical, &newfoundland).value() - to_display(canonical, &utc).value();
        assert!((shift + 210.0 / 1_440.0).abs() < TOLERANCE);
    }

    #[test]
    fn half_day_minus_florence_displays_as_eight() {
        let utc = TimezoneEntry::utc();
        let canonical = to_canonical(fraction(0.5), &utc);
        assert_eq!(encode(to_display(canonical, &utc), 2, true), ".80");
    }
}
