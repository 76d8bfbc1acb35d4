//! Pythagorean numerology: letter values, reductions, inversion, and the
//! composite identity signature.
//!
//! Core idea:
//! - Compute Pythagorean values (1..=9) from names and dates.
//! - Reduce to a single digit, keeping configured master numbers unreduced.
//! - Optionally attach the inverted digit (9→1, 8→2, ..., 5→5; 0 stays 0).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::NumerologyConfig;
use crate::error::NumerologyError;

/// Vowel set used to split name totals (Y counts as a vowel by design).
pub const VOWELS: [char; 6] = ['A', 'E', 'I', 'O', 'U', 'Y'];

// ============================================================================
// Normalization
// ============================================================================

/// Normalize a human name for letter-to-number mapping: decompose accents to
/// base characters ("É" → "E"), uppercase, and keep ASCII letters only
/// (spaces, hyphens, punctuation and digits are dropped).
///
/// Idempotent on its own output.
pub fn normalize_name(name: &str) -> String {
    name.nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_uppercase)
        .filter(|ch| ch.is_ascii_uppercase())
        .collect()
}

// ============================================================================
// Core numeric transforms
// ============================================================================

/// Inverted Pythagorean digit mapping: 1↔9, 2↔8, 3↔7, 4↔6, 5→5, 0→0.
///
/// An involution on 0..=9; digits above 9 are rejected.
pub fn invert_digit(d: u32) -> Result<u32, NumerologyError> {
    match d {
        0 => Ok(0),
        1..=9 => Ok(10 - d),
        _ => Err(NumerologyError::InvalidDigit(d)),
    }
}

/// Sum of the decimal digits of `n`'s absolute value.
pub fn sum_digits(n: i64) -> u32 {
    let mut x = n.unsigned_abs();
    let mut total = 0u64;
    while x > 0 {
        total += x % 10;
        x /= 10;
    }
    total as u32
}

/// Reduce an integer to a single digit by repeated digit-summing, stopping
/// early on any value in `keep_master_numbers`.
///
/// The master check runs before the size check on every iteration, so a
/// reduction that lands exactly on a master stops there even when reached
/// from above. With `allow_zero`, 0 reduces to 0; otherwise 0 is invalid.
pub fn reduce_number(
    n: i64,
    keep_master_numbers: &[u32],
    allow_zero: bool,
) -> Result<u32, NumerologyError> {
    if n == 0 {
        return if allow_zero {
            Ok(0)
        } else {
            Err(NumerologyError::ZeroReduction)
        };
    }

    let mut x = n.unsigned_abs();
    loop {
        if keep_master_numbers.iter().any(|&m| u64::from(m) == x) {
            return Ok(x as u32);
        }
        if x < 10 {
            return Ok(x as u32);
        }
        x = u64::from(sum_digits(x as i64));
    }
}

// ============================================================================
// Pythagorean letter mapping
// ============================================================================

/// Pythagorean value of a letter: A–I ↦ 1–9, J–R ↦ 1–9, S–Z ↦ 1–8
/// (the alphabet cycles through 1..=9).
pub fn pythagorean_letter_value(ch: char) -> Result<u32, NumerologyError> {
    let up = ch.to_ascii_uppercase();
    if up.is_ascii_uppercase() {
        Ok((up as u32 - 'A' as u32) % 9 + 1)
    } else {
        Err(NumerologyError::UnsupportedCharacter(ch))
    }
}

fn normalized_total(name: &str, keep: impl Fn(char) -> bool) -> u32 {
    normalize_name(name)
        .chars()
        .filter(|ch| keep(*ch))
        .map(|ch| (ch as u32 - 'A' as u32) % 9 + 1)
        .sum()
}

/// Total (unreduced) Pythagorean value of a name.
pub fn name_total(name: &str) -> u32 {
    normalized_total(name, |_| true)
}

/// Total over the vowels of a name.
pub fn name_total_vowels(name: &str) -> u32 {
    normalized_total(name, |ch| VOWELS.contains(&ch))
}

/// Total over the consonants of a name.
pub fn name_total_consonants(name: &str) -> u32 {
    normalized_total(name, |ch| !VOWELS.contains(&ch))
}

// ============================================================================
// Date inputs
// ============================================================================

/// A flexible date-of-birth input: a structured date, a year/month/day
/// triple, or an ISO-like string (`YYYY-MM-DD`; slashes are accepted and
/// normalized to hyphens).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Date(NaiveDate),
    Ymd(i32, u32, u32),
    Text(String),
}

impl DateInput {
    /// Resolve to a calendar date, rejecting anything unparseable.
    pub fn resolve(&self) -> Result<NaiveDate, NumerologyError> {
        match self {
            DateInput::Date(d) => Ok(*d),
            DateInput::Ymd(y, m, d) => NaiveDate::from_ymd_opt(*y, *m, *d)
                .ok_or_else(|| NumerologyError::InvalidDate(format!("{y:04}-{m:02}-{d:02}"))),
            DateInput::Text(s) => {
                let normalized = s.trim().replace('/', "-");
                NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
                    .map_err(|_| NumerologyError::InvalidDate(normalized))
            }
        }
    }
}

impl From<NaiveDate> for DateInput {
    fn from(d: NaiveDate) -> Self {
        DateInput::Date(d)
    }
}

impl From<(i32, u32, u32)> for DateInput {
    fn from((y, m, d): (i32, u32, u32)) -> Self {
        DateInput::Ymd(y, m, d)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

// ============================================================================
// Facet numbers
// ============================================================================

/// One derived facet of the signature: the raw total (where meaningful), the
/// reduced Pythagorean value, and the inverted digit when the reduced value
/// is a plain digit 1..=9 and inversion is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetNumber {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    pub pythagorean: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverted: Option<u32>,
}

fn inversion_of(reduced: u32, cfg: &NumerologyConfig) -> Result<Option<u32>, NumerologyError> {
    if cfg.apply_inversion && (1..=9).contains(&reduced) {
        Ok(Some(invert_digit(reduced)?))
    } else {
        Ok(None)
    }
}

fn facet_from_total(
    total: u32,
    cfg: &NumerologyConfig,
    with_total: bool,
) -> Result<FacetNumber, NumerologyError> {
    let reduced = reduce_number(i64::from(total), &cfg.keep_master_numbers, false)?;
    Ok(FacetNumber {
        total: with_total.then_some(total),
        pythagorean: reduced,
        inverted: inversion_of(reduced, cfg)?,
    })
}

/// Life Path: sum the digits of the full YYYYMMDD date, then reduce.
pub fn life_path_number(
    dob: &DateInput,
    cfg: &NumerologyConfig,
) -> Result<FacetNumber, NumerologyError> {
    let dt = dob.resolve()?;
    let total = sum_digits(i64::from(dt.year()))
        + sum_digits(i64::from(dt.month()))
        + sum_digits(i64::from(dt.day()));
    facet_from_total(total, cfg, true)
}

/// Birth Day: reduce the day-of-month.
pub fn birth_day_number(
    dob: &DateInput,
    cfg: &NumerologyConfig,
) -> Result<FacetNumber, NumerologyError> {
    let dt = dob.resolve()?;
    facet_from_total(dt.day(), cfg, false)
}

/// Expression / Destiny: reduce the full name total.
pub fn expression_number(
    name: &str,
    cfg: &NumerologyConfig,
) -> Result<FacetNumber, NumerologyError> {
    facet_from_total(name_total(name), cfg, true)
}

/// Soul Urge / Heart's Desire: reduce the vowel total. A name with no vowels
/// after normalization yields 0 with no inversion attached.
pub fn soul_urge_number(
    name: &str,
    cfg: &NumerologyConfig,
) -> Result<FacetNumber, NumerologyError> {
    zero_safe_facet(name_total_vowels(name), cfg)
}

/// Personality: reduce the consonant total. A name with no consonants after
/// normalization yields 0 with no inversion attached.
pub fn personality_number(
    name: &str,
    cfg: &NumerologyConfig,
) -> Result<FacetNumber, NumerologyError> {
    zero_safe_facet(name_total_consonants(name), cfg)
}

fn zero_safe_facet(total: u32, cfg: &NumerologyConfig) -> Result<FacetNumber, NumerologyError> {
    if total == 0 {
        return Ok(FacetNumber {
            total: Some(0),
            pythagorean: 0,
            inverted: None,
        });
    }
    facet_from_total(total, cfg, true)
}

// ============================================================================
// Combined signature
// ============================================================================

/// The composite numerological signature. Facets are present only when
/// their required input (name or date) was supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_path: Option<FacetNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_day: Option<FacetNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<FacetNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soul_urge: Option<FacetNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<FacetNumber>,
}

impl Signature {
    /// True when no facet could be derived.
    pub fn is_empty(&self) -> bool {
        self.life_path.is_none()
            && self.birth_day.is_none()
            && self.expression.is_none()
            && self.soul_urge.is_none()
            && self.personality.is_none()
    }

    /// The facet the engine derives the core archetype from: life path when
    /// a date was given, else expression.
    pub fn core_facet(&self) -> Option<&FacetNumber> {
        self.life_path.as_ref().or(self.expression.as_ref())
    }
}

/// Build a signature from a name and/or date of birth. Date facets
/// (life path, birth day) require `dob`; name facets (expression, soul urge,
/// personality) require `name`.
pub fn build_signature(
    name: Option<&str>,
    dob: Option<&DateInput>,
    cfg: &NumerologyConfig,
) -> Result<Signature, NumerologyError> {
    let mut sig = Signature::default();

    if let Some(dob) = dob {
        sig.life_path = Some(life_path_number(dob, cfg)?);
        sig.birth_day = Some(birth_day_number(dob, cfg)?);
    }

    if let Some(name) = name {
        sig.expression = Some(expression_number(name, cfg)?);
        sig.soul_urge = Some(soul_urge_number(name, cfg)?);
        sig.personality = Some(personality_number(name, cfg)?);
    }

    Ok(sig)
}

// ============================================================================
// Tests
// ============================================================================
