//! Error types for the soul engine.
//!
//! One enum per concern; layers wrap each other transparently so callers can
//! match on the originating kind without unwrapping boilerplate.

use thiserror::Error;

/// Errors from numerological reductions and signature building.
#[derive(Debug, Error)]
pub enum NumerologyError {
    /// A digit outside 0..=9 was passed to the inversion mapping.
    #[error("digit out of range for inversion: {0} (expected 0..=9)")]
    InvalidDigit(u32),

    /// Zero was passed to reduction without `allow_zero`.
    #[error("cannot reduce 0 when zero is not allowed")]
    ZeroReduction,

    /// A character with no Pythagorean letter value.
    #[error("unsupported character for letter mapping: {0:?}")]
    UnsupportedCharacter(char),

    /// A date input that could not be resolved to a calendar date.
    #[error("invalid date input: {0}")]
    InvalidDate(String),
}

/// Errors from trait-vector interpolation.
#[derive(Debug, Error)]
pub enum InterpolationError {
    /// Axis digits live on the 1..=9 intellect/instinct axis.
    #[error("axis digit out of range: {0} (expected 1..=9)")]
    AxisOutOfRange(u32),
}

/// Errors from loading or querying the digit ontology.
///
/// All load-time variants are fatal: the store is never returned in a
/// partial or degraded form.
#[derive(Debug, Error)]
pub enum OntologyError {
    /// The knowledge payload file does not exist.
    #[error("ontology payload not found: {path}")]
    NotFound { path: String },

    /// The knowledge payload file exists but could not be read.
    #[error("failed to read ontology payload {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Both the direct parse and the single splice-repair retry failed.
    /// Both attempts' messages are kept for diagnosis.
    #[error("ontology parse failed after repair (direct: {direct}; repaired: {repaired})")]
    ParseFailed { direct: String, repaired: String },

    /// The payload parsed but its root is not an array.
    #[error("ontology payload root must be a JSON array")]
    NotAnArray,

    /// Normalization left zero usable entries.
    #[error("no usable entries found in ontology payload")]
    Empty,

    /// A merge-policy name that is not `first`, `last` or `concat`.
    #[error("unknown merge policy: {0:?}")]
    UnknownMergePolicy(String),

    /// Digit resolution failed (inversion of an out-of-range digit).
    #[error(transparent)]
    Digit(#[from] NumerologyError),
}

/// Errors from session construction in the orchestrating engine.
///
/// `react` itself is infallible: per-turn inputs are clamped and defaulted
/// rather than rejected.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Neither a name nor a date of birth was supplied.
    #[error("identity must include at least a name or a date of birth")]
    EmptyIdentity,

    /// The signature contained no facet usable as a core archetype.
    #[error("signature produced no core facet to derive an archetype from")]
    MissingCoreDigit,

    #[error(transparent)]
    Numerology(#[from] NumerologyError),

    #[error(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
}
