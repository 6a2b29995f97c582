use crate::fraction::DayFraction;

pub const DEFAULT_RESOLUTION: usize = 4;
/// An f64 mantissa is exhausted after 13 hex digits.
pub const MAX_RESOLUTION: usize = 13;

const SNAP_UNITS: f64 = 1e-9;

/// One position of a Florence clock string, from the radix point down to
/// hexadecimal seconds.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DigitUnit {
    pub name: &'static str,
    pub per_day: u32,
    pub explanation: &'static str,
}

pub const DIGIT_UNITS: [DigitUnit; 5] = [
    DigitUnit {
        name: "day",
        per_day: 1,
        explanation: "hours, minutes and seconds are but arbitrary subdivisions of what humanity really cares about: the earth day.\nif we take the length of a full day to be \"1\", then hours are really just fractional subdivisions,\nwhich should therefore be marked *after* the radix point.",
    },
    DigitUnit {
        name: "hexadecimal hour",
        per_day: 16,
        explanation: "each day is broken into 16 hexadecimal hours.\n1 hexadecimal hour is equivalent to 1.5 SI hours.",
    },
    DigitUnit {
        name: "maxime",
        per_day: 256,
        explanation: "each hexadecimal hour is broken into 16 hexadecimal maximes.\n1 day therefore contains 256 hexadecimal maximes.\n1 hexadecimal maxime is equivalent to ~5 1/2 SI minutes.",
    },
    DigitUnit {
        name: "hexadecimal minute",
        per_day: 4_096,
        explanation: "each hexadecimal maxime is broken into 16 hexadecimal minutes.\n1 day therefore contains 4096 hexadecimal minutes.\n1 hexadecimal minute is equivalent to ~21.09 SI seconds.",
    },
    DigitUnit {
        name: "hexadecimal second",
        per_day: 65_536,
        explanation: "each hexadecimal minute is broken into 16 hexadecimal seconds.\n1 day therefore contains 65536 hexadecimal seconds.\n1 hexadecimal second is equivalent to ~1.318 SI seconds.",
    },
];

impl DigitUnit {
    pub fn si_seconds(&self) -> f64 {
        86_400.0 / f64::from(self.per_day)
    }
}

/// Renders `fraction` as `.XXXX`: the hex expansion after the radix point,
/// truncated to `resolution` digits.
///
/// A fraction with no significant digit renders as `.0`. With
/// `trailing_zeroes` the result is always `resolution + 1` characters long;
/// without it, zeroes that end the expansion are dropped.
pub fn encode(fraction: DayFraction, resolution: usize, trailing_zeroes: bool) -> String {
    let resolution = resolution.clamp(1, MAX_RESOLUTION);
    let scale = 16_u64.pow(resolution as u32);
    let scaled = fraction.value() * scale as f64;
    // Values a rounding error below a digit boundary belong to that digit.
    let units = ((scaled + SNAP_UNITS).floor() as u64).min(scale - 1);
    let exhausted = scaled - units as f64 <= SNAP_UNITS;

    let mut digits = format!("{units:0resolution$x}");
    if exhausted {
        let significant = digits.trim_end_matches('0').len();
        digits.truncate(significant);
    }
    if digits.is_empty() {
        digits.push('0');
    }
    if trailing_zeroes {
        while digits.len() < resolution {
            digits.push('0');
        }
    }
    format!(".{digits}")
}

pub fn encode_default(fraction: DayFraction) -> String {
    encode(fraction, DEFAULT_RESOLUTION, true)
}

/// Pairs each character of a clock string with the unit it stands for.
/// Characters past the last known unit get no explanation.
pub fn annotate(text: &str) -> impl Iterator<Item = (char, Option<&'static DigitUnit>)> + '_ {
    text.chars()
        .enumerate()
        .map(|(index, ch)| (ch, DIGIT_UNITS.get(index)))
}
