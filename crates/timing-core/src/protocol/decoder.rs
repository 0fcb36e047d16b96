//! Line decoder for the finish-line telemetry wire format.
//!
//! Wire format (one record per line, newline already removed by the reader):
//! ```text
//! identifier, timeValue, personalBest, fastestOfDay, offCourse, conesHit
//! ```
//! Whitespace around each field is ignored.  The last four fields are base-10
//! integers; the three flags are "true" when nonzero and may be arbitrarily
//! long, while `conesHit` must fit in an `i64`.

use std::fmt;

use thiserror::Error;

use crate::domain::record::Record;

/// Number of comma-separated fields in a valid line.
pub const FIELD_COUNT: usize = 6;

const FIELD_DELIMITER: char = ',';

/// Identifies one of the four integer fields of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    PersonalBest,
    FastestOfDay,
    OffCourse,
    ConesHit,
}

impl NumericField {
    /// Zero-based position of the field on the wire.
    pub fn position(self) -> usize {
        match self {
            NumericField::PersonalBest => 2,
            NumericField::FastestOfDay => 3,
            NumericField::OffCourse => 4,
            NumericField::ConesHit => 5,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericField::PersonalBest => "personalBest",
            NumericField::FastestOfDay => "fastestOfDay",
            NumericField::OffCourse => "offCourse",
            NumericField::ConesHit => "conesHit",
        };
        f.write_str(name)
    }
}

/// Reasons a line is rejected by [`decode`].
///
/// Every variant carries the original line so the caller can log it verbatim.
/// The `Display` text is the human-readable reason only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The line did not split into exactly [`FIELD_COUNT`] fields.
    #[error("incorrect number of fields: expected 6, found {found}")]
    FieldCountMismatch { line: String, found: usize },

    /// One of the integer fields did not parse.
    #[error("field {field} is not an integer: {raw:?}")]
    NumericFieldInvalid {
        line: String,
        field: NumericField,
        raw: String,
    },
}

impl DecodeError {
    /// The raw line that was rejected.
    pub fn line(&self) -> &str {
        match self {
            DecodeError::FieldCountMismatch { line, .. } => line,
            DecodeError::NumericFieldInvalid { line, .. } => line,
        }
    }
}

/// Decodes one line of telemetry into a [`Record`].
///
/// Leading and trailing whitespace (including a stray `\r`) is ignored.
/// Decoding is all-or-nothing: if any integer field is invalid the whole line
/// is rejected, even when the other fields parse.
///
/// # Errors
///
/// - [`DecodeError::FieldCountMismatch`] when the line does not have six fields.
/// - [`DecodeError::NumericFieldInvalid`] naming the first integer field that
///   failed to parse.
///
/// # Examples
///
/// ```rust
/// use timing_core::{decode, Classification};
///
/// let record = decode("CAR7, 00:12.345, 1, 0, 0, 0").unwrap();
/// assert_eq!(record.time_value(), "00:12.345");
/// assert_eq!(record.classification(), Classification::PersonalBest);
/// ```
pub fn decode(line: &str) -> Result<Record, DecodeError> {
    let trimmed = line.trim();
    let fields: Vec<&str> = trimmed.split(FIELD_DELIMITER).collect();

    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCountMismatch {
            line: trimmed.to_string(),
            found: fields.len(),
        });
    }

    let invalid = |field: NumericField, raw: &str| DecodeError::NumericFieldInvalid {
        line: trimmed.to_string(),
        field,
        raw: raw.to_string(),
    };
    let flag_at = |field: NumericField| -> Result<bool, DecodeError> {
        let raw = fields[field.position()].trim();
        integer_is_nonzero(raw).ok_or_else(|| invalid(field, raw))
    };

    let personal_best = flag_at(NumericField::PersonalBest)?;
    let fastest_of_day = flag_at(NumericField::FastestOfDay)?;
    let off_course = flag_at(NumericField::OffCourse)?;

    let raw_cones = fields[NumericField::ConesHit.position()].trim();
    let cones_hit = raw_cones
        .parse::<i64>()
        .map_err(|_| invalid(NumericField::ConesHit, raw_cones))?;

    Ok(Record::new(
        fields[0].trim(),
        fields[1].trim(),
        personal_best,
        fastest_of_day,
        off_course,
        cones_hit,
    ))
}

/// Checks that `raw` is a base-10 integer (optional sign, at least one digit)
/// and reports whether it is nonzero.
///
/// Flags are judged on their digits rather than parsed, so a flag of any
/// magnitude is accepted.  Only `conesHit` is bounded (to `i64`).
fn integer_is_nonzero(raw: &str) -> Option<bool> {
    let digits = raw.strip_prefix(&['+', '-'][..]).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.bytes().any(|b| b != b'0'))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
