//! Domain entities for the timing display.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies.  A [`record::Record`] is one decoded run, and
//! [`record::classify`] is the priority rule that turns the run's flags into a
//! [`record::Classification`].
//!
//! Code in outer layers (the session loop, the console sink, the binary)
//! depends on the domain, but the domain never depends on them.

/// Decoded telemetry records and the classification rule.
pub mod record;
