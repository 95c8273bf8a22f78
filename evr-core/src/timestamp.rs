//! Decoding of the `seconds.fraction` Unix timestamps written by the sensor
//! firmware.
//!
//! The firmware prints the fraction as a bare integer count of microseconds,
//! so leading zeros are lost: `1700000000.5` means five microseconds, not half
//! a second. Fractions shorter than six digits are therefore left-padded back
//! to microseconds before being right-padded to nanoseconds. Fractions longer
//! than nine digits are truncated to nanosecond precision.

use jiff::Timestamp;

use crate::FormatError;

const MICROSECOND_DIGITS: usize = 6;
const NANOSECOND_DIGITS: usize = 9;

/// Decodes `seconds.fraction` into a UTC instant.
pub fn decode_timestamp(raw: &str) -> Result<Timestamp, FormatError> {
    let separators = raw.matches('.').count();
    let (seconds, fraction) = match raw.split_once('.') {
        Some(parts) if separators == 1 => parts,
        _ => {
            return Err(FormatError::Separator {
                input: raw.to_owned(),
                found: separators,
            });
        }
    };

    let seconds: i64 = seconds.parse().map_err(|_| FormatError::Seconds {
        input: raw.to_owned(),
    })?;

    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatError::Fraction {
            input: raw.to_owned(),
        });
    }

    let nanoseconds: i32 = normalize_fraction(fraction)
        .parse()
        .map_err(|_| FormatError::Fraction {
            input: raw.to_owned(),
        })?;

    Timestamp::new(seconds, nanoseconds).map_err(|_| FormatError::OutOfRange {
        input: raw.to_owned(),
    })
}

/// Pads an all-digit fraction to exactly nine digits.
fn normalize_fraction(fraction: &str) -> String {
    let mut digits = String::with_capacity(NANOSECOND_DIGITS);
    for _ in fraction.len()..MICROSECOND_DIGITS {
        digits.push('0');
    }
    digits.push_str(fraction);
    while digits.len() < NANOSECOND_DIGITS {
        digits.push('0');
    }
    digits.truncate(NANOSECOND_DIGITS);
    digits
}
