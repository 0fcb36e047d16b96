//! Decoded telemetry record and the run classification rule.
//!
//! # Classification precedence
//!
//! A run can carry several flags at once (a driver can set a personal best
//! *and* the fastest time of the day).  The board shows exactly one colour, so
//! the flags are ranked:
//!
//! ```text
//! off_course  >  fastest_of_day  >  personal_best  >  (normal)
//!   red            purple             green             yellow
//! ```
//!
//! Off course always wins: a run that missed a gate must never be displayed as
//! a record time.

use std::fmt;

use serde::Serialize;

/// The display priority derived from a record's three flags.
///
/// Never stored; recomputed from the flags for every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The car left the course.  Dominates every other flag.
    Violation,
    /// Fastest run of the day so far.
    FastestOfDay,
    /// The driver's own best run.
    PersonalBest,
    /// None of the above.
    Normal,
}

impl Classification {
    /// Returns the colour name the finish-line board uses for this class.
    pub fn colour(self) -> &'static str {
        match self {
            Classification::Violation => "red",
            Classification::FastestOfDay => "purple",
            Classification::PersonalBest => "green",
            Classification::Normal => "yellow",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Violation => "Violation",
            Classification::FastestOfDay => "FastestOfDay",
            Classification::PersonalBest => "PersonalBest",
            Classification::Normal => "Normal",
        };
        f.write_str(name)
    }
}

/// Maps the three run flags to a single [`Classification`].
///
/// Total over all eight flag combinations.  Precedence is
/// `off_course` > `fastest_of_day` > `personal_best` > [`Classification::Normal`].
///
/// # Examples
///
/// ```rust
/// use timing_core::{classify, Classification};
///
/// assert_eq!(classify(true, true, true), Classification::Violation);
/// assert_eq!(classify(true, false, false), Classification::PersonalBest);
/// assert_eq!(classify(false, false, false), Classification::Normal);
/// ```
pub fn classify(personal_best: bool, fastest_of_day: bool, off_course: bool) -> Classification {
    if off_course {
        Classification::Violation
    } else if fastest_of_day {
        Classification::FastestOfDay
    } else if personal_best {
        Classification::PersonalBest
    } else {
        Classification::Normal
    }
}

/// One decoded telemetry line.
///
/// Only [`crate::protocol::decode`] produces records from wire text, which
/// guarantees the six-field / four-integer invariant.  The identifier is kept
/// so later consumers can use it, but the display report does not include it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    identifier: String,
    time_value: String,
    personal_best: bool,
    fastest_of_day: bool,
    off_course: bool,
    cones_hit: i64,
}

impl Record {
    /// Builds a record from already-validated parts.
    pub fn new(
        identifier: impl Into<String>,
        time_value: impl Into<String>,
        personal_best: bool,
        fastest_of_day: bool,
        off_course: bool,
        cones_hit: i64,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            time_value: time_value.into(),
            personal_best,
            fastest_of_day,
            off_course,
            cones_hit,
        }
    }

    /// The car/entry identifier from field 0.  Opaque; never interpreted.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The run time exactly as transmitted (trimmed).  Not validated.
    pub fn time_value(&self) -> &str {
        &self.time_value
    }

    pub fn personal_best(&self) -> bool {
        self.personal_best
    }

    pub fn fastest_of_day(&self) -> bool {
        self.fastest_of_day
    }

    pub fn off_course(&self) -> bool {
        self.off_course
    }

    /// Number of cones hit.  Not range-checked; a negative count is passed through.
    pub fn cones_hit(&self) -> i64 {
        self.cones_hit
    }

    /// Classifies this record with [`classify`].
    pub fn classification(&self) -> Classification {
        classify(self.personal_best, self.fastest_of_day, self.off_course)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── classify precedence ───────────────────────────────────────────────────

    #[test]
    fn test_classify_enumerates_all_flag_combinations() {
        // (personal_best, fastest_of_day, off_course) -> expected
        let table = [
            (false, false, false, Classification::Normal),
            (true, false, false, Classification::PersonalBest),
            (false, true, false, Classification::FastestOfDay),
            (true, true, false, Classification::FastestOfDay),
            (false, false, true, Classification::Violation),
            (true, false, true, Classification::Violation),
            (false, true, true, Classification::Violation),
            (true, true, true, Classification::Violation),
        ];

        for (pb, ftd, off, expected) in table {
            assert_eq!(
                classify(pb, ftd, off),
                expected,
                "classify(pb={pb}, ftd={ftd}, off={off})"
            );
        }
    }

    #[test]
    fn test_off_course_dominates_every_other_flag() {
        for pb in [false, true] {
            for ftd in [false, true] {
                assert_eq!(classify(pb, ftd, true), Classification::Violation);
            }
        }
    }

    #[test]
    fn test_fastest_of_day_dominates_personal_best() {
        assert_eq!(classify(true, true, false), Classification::FastestOfDay);
    }

    // ── Colours ───────────────────────────────────────────────────────────────

    #[test]
    fn test_classification_colours_match_board() {
        assert_eq!(Classification::Violation.colour(), "red");
        assert_eq!(Classification::FastestOfDay.colour(), "purple");
        assert_eq!(Classification::PersonalBest.colour(), "green");
        assert_eq!(Classification::Normal.colour(), "yellow");
    }

    #[test]
    fn test_classification_display_uses_variant_name() {
        assert_eq!(Classification::FastestOfDay.to_string(), "FastestOfDay");
    }

    // ── Record ────────────────────────────────────────────────────────────────

    #[test]
    fn test_record_classification_uses_its_flags() {
        // Arrange
        let record = Record::new("CAR1", "00:59.100", true, false, false, 0);

        // Act / Assert
        assert_eq!(record.classification(), Classification::PersonalBest);
    }

    #[test]
    fn test_record_keeps_identifier() {
        let record = Record::new("CAR42", "01:00.000", false, false, false, 3);
        assert_eq!(record.identifier(), "CAR42");
        assert_eq!(record.cones_hit(), 3);
    }
}
