// =============================================================================
//  Astra HTN - Durations & Instants
//  File: duration.rs
//
//  Description:
//      Validated ISO-8601 time values at the external interface. Durations
//      accept the subset PT[nH][nM][nS] with fractional seconds up to
//      microsecond precision; instants are RFC 3339 datetimes with an
//      explicit offset. Internally everything is integer microseconds.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-12
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use crate::error::{PlanError, Result};
use chrono::{DateTime, FixedOffset};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const MICROS_PER_SECOND: i64 = 1_000_000;
pub const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
pub const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

/// A non-negative duration with microsecond resolution.
///
/// The canonical text form is the ISO-8601 subset `PT[nH][nM][nS]`; a
/// fractional part is only permitted on the seconds component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IsoDuration {
    micros: i64,
}

impl IsoDuration {
    /// Wraps a microsecond count. Negative counts are rejected.
    pub fn from_micros(micros: i64) -> Result<Self> {
        if micros < 0 {
            return Err(PlanError::InvalidDuration(format!("{micros}us")));
        }
        Ok(IsoDuration { micros })
    }

    /// Parses the `PT[nH][nM][nS]` subset. At least one component must be
    /// present, components must appear in H, M, S order without repeats,
    /// and only the seconds component may carry a fraction (up to six
    /// digits).
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || PlanError::InvalidDuration(text.to_string());
        let rest = text.strip_prefix("PT").ok_or_else(invalid)?;
        if rest.is_empty() {
            return Err(invalid());
        }

        let bytes = rest.as_bytes();
        let mut micros: i64 = 0;
        let mut i = 0;
        let mut last_rank = 0u8;
        while i < bytes.len() {
            let digits_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if digits_start == i {
                return Err(invalid());
            }
            let whole: i64 = rest[digits_start..i].parse().map_err(|_| invalid())?;

            let mut frac_micros: i64 = 0;
            let mut has_fraction = false;
            if i < bytes.len() && bytes[i] == b'.' {
                has_fraction = true;
                i += 1;
                let frac_start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let frac_digits = &rest[frac_start..i];
                if frac_digits.is_empty() || frac_digits.len() > 6 {
                    return Err(invalid());
                }
                // Right-pad to six digits so "5" means 500000us.
                let padded = format!("{frac_digits:0<6}");
                frac_micros = padded.parse().map_err(|_| invalid())?;
            }

            if i >= bytes.len() {
                return Err(invalid());
            }
            let (rank, scale) = match bytes[i] {
                b'H' => (1u8, MICROS_PER_HOUR),
                b'M' => (2u8, MICROS_PER_MINUTE),
                b'S' => (3u8, MICROS_PER_SECOND),
                _ => return Err(invalid()),
            };
            i += 1;
            if has_fraction && rank != 3 {
                return Err(invalid());
            }
            if rank <= last_rank {
                return Err(invalid());
            }
            last_rank = rank;

            let component = whole
                .checked_mul(scale)
                .and_then(|v| v.checked_add(frac_micros))
                .ok_or_else(invalid)?;
            micros = micros.checked_add(component).ok_or_else(invalid)?;
        }

        Ok(IsoDuration { micros })
    }

    /// The duration in microseconds.
    pub fn as_micros(&self) -> i64 {
        self.micros
    }

    pub fn is_zero(&self) -> bool {
        self.micros == 0
    }

    /// Renders the canonical ISO-8601 form; zero is `PT0S`.
    pub fn to_iso_string(&self) -> String {
        if self.micros == 0 {
            return "PT0S".to_string();
        }
        let hours = self.micros / MICROS_PER_HOUR;
        let minutes = (self.micros % MICROS_PER_HOUR) / MICROS_PER_MINUTE;
        let seconds = (self.micros % MICROS_PER_MINUTE) / MICROS_PER_SECOND;
        let frac = self.micros % MICROS_PER_SECOND;

        let mut out = String::from("PT");
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if seconds > 0 || frac > 0 {
            if frac > 0 {
                let frac_text = format!("{frac:06}");
                out.push_str(&format!("{seconds}.{}S", frac_text.trim_end_matches('0')));
            } else {
                out.push_str(&format!("{seconds}S"));
            }
        }
        out
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso_string())
    }
}

impl Serialize for IsoDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for IsoDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        IsoDuration::parse(&text).map_err(D::Error::custom)
    }
}

/// Parses an RFC 3339 datetime with an explicit offset (`Z` or `±HH:MM`).
pub fn parse_instant(text: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).map_err(|_| PlanError::InvalidInstant(text.to_string()))
}

/// Formats an instant back to its RFC 3339 wire form.
pub fn format_instant(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components() {
        assert_eq!(IsoDuration::parse("PT5M").unwrap().as_micros(), 5 * MICROS_PER_MINUTE);
        assert_eq!(
            IsoDuration::parse("PT1H30M").unwrap().as_micros(),
            MICROS_PER_HOUR + 30 * MICROS_PER_MINUTE
        );
        assert_eq!(IsoDuration::parse("PT0S").unwrap().as_micros(), 0);
        assert_eq!(
            IsoDuration::parse("PT2.5S").unwrap().as_micros(),
            2_500_000
        );
        assert_eq!(
            IsoDuration::parse("PT0.000001S").unwrap().as_micros(),
            1
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "", "PT", "P5M", "PT5", "PT5X", "PT5M3H", "PT5M5M", "PT1.5M", "PT1.1234567S",
            "pt5m", "PT5M ", "5M",
        ] {
            assert!(
                IsoDuration::parse(bad).is_err(),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn test_roundtrip_canonical_form() {
        for text in ["PT5M", "PT1H30M", "PT2.5S", "PT1H2M3S", "PT0S"] {
            let parsed = IsoDuration::parse(text).unwrap();
            assert_eq!(parsed.to_iso_string(), text);
            assert_eq!(IsoDuration::parse(&parsed.to_iso_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn test_negative_micros_rejected() {
        assert!(IsoDuration::from_micros(-1).is_err());
        assert!(IsoDuration::from_micros(0).is_ok());
    }

    #[test]
    fn test_instants_need_explicit_offset() {
        assert!(parse_instant("2026-02-01T10:00:00Z").is_ok());
        assert!(parse_instant("2026-02-01T10:00:00+02:00").is_ok());
        assert!(parse_instant("2026-02-01T10:00:00").is_err());
        assert!(parse_instant("2026-02-01").is_err());
        assert!(parse_instant("not a time").is_err());
    }

    #[test]
    fn test_instant_roundtrip() {
        let instant = parse_instant("2026-02-01T10:00:00+02:00").unwrap();
        assert_eq!(format_instant(&instant), "2026-02-01T10:00:00+02:00");
    }
}
