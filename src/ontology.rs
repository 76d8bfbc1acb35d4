//! Digit-indexed knowledge store ("pi ontology").
//!
//! Loads a semi-structured JSON array of `{index, digit, analysis}` objects,
//! tolerating one specific malformed shape (naively concatenated arrays),
//! indexes entries by digit, and serves merged or raw analysis views with a
//! run-time patch layer on top. Also owns the digit→trait projection used
//! when a session is built.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OntologyError;
use crate::interpolation::{
    digit_overlays, instinct_template, intellect_template, interpolate_axis, TraitVector,
};
use crate::numerology::invert_digit;

/// `]` directly followed (possibly after whitespace) by `[` — the junction
/// left by concatenating two JSON arrays.
static ARRAY_SPLICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\s*\[").unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Max excerpt length produced by [`Ontology::summarize_digit`].
const EXCERPT_LEN: usize = 220;

/// Max items returned by [`Ontology::summarize_digit`].
const SUMMARY_MAX_ITEMS: usize = 6;

/// Extra trait weight per merged tradition in the digit→trait projection.
const LORE_DEPTH_STEP: f64 = 0.05;

// ============================================================================
// Entries and merge policies
// ============================================================================

/// One normalized ontology entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitEntry {
    /// Ordinal from the payload, -1 when absent or uncoercible.
    pub index: i64,
    /// The digit this entry describes (0..=9).
    pub digit: u32,
    /// Tradition name → interpretation text.
    pub analysis: BTreeMap<String, String>,
}

/// Conflict resolution when folding several entries (and the patch layer)
/// into one tradition→text map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// First value written for a tradition wins; later writes are ignored.
    First,
    /// Later writes overwrite earlier ones.
    #[default]
    Last,
    /// Differing values are joined with " / "; identical values (after
    /// whitespace trimming) are not duplicated.
    Concat,
}

impl FromStr for MergePolicy {
    type Err = OntologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(MergePolicy::First),
            "last" => Ok(MergePolicy::Last),
            "concat" => Ok(MergePolicy::Concat),
            other => Err(OntologyError::UnknownMergePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergePolicy::First => "first",
            MergePolicy::Last => "last",
            MergePolicy::Concat => "concat",
        })
    }
}

// ============================================================================
// Store
// ============================================================================

/// The digit ontology: base entries indexed by digit plus a layered patch
/// map applied at read time.
///
/// Read-mostly after construction. [`Ontology::patch_digit`] mutates the
/// patch layer and is not internally synchronized; share behind a lock if
/// patches and reads can race.
#[derive(Debug)]
pub struct Ontology {
    by_digit: BTreeMap<u32, Vec<DigitEntry>>,
    patches: BTreeMap<u32, BTreeMap<String, String>>,
}

impl Ontology {
    /// Parse an ontology from its textual payload.
    pub fn from_payload(raw: &str) -> Result<Self, OntologyError> {
        let data = parse_lenient_json(raw)?;
        let entries = normalize_entries(&data)?;
        let mut by_digit: BTreeMap<u32, Vec<DigitEntry>> = BTreeMap::new();
        for entry in entries {
            by_digit.entry(entry.digit).or_default().push(entry);
        }
        Ok(Self {
            by_digit,
            patches: BTreeMap::new(),
        })
    }

    /// Read and parse an ontology payload from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OntologyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OntologyError::NotFound {
                path: path.display().to_string(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| OntologyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_payload(&raw)
    }

    /// Digits that have at least one base entry, ascending.
    pub fn digits_present(&self) -> Vec<u32> {
        self.by_digit.keys().copied().collect()
    }

    fn resolve_digit(&self, digit: u32, inverted: bool) -> Result<u32, OntologyError> {
        if inverted {
            Ok(invert_digit(digit)?)
        } else {
            Ok(digit)
        }
    }

    /// Base entries for a digit (or its inversion), in payload order.
    pub fn entries(&self, digit: u32, inverted: bool) -> Result<Vec<DigitEntry>, OntologyError> {
        let d = self.resolve_digit(digit, inverted)?;
        Ok(self.by_digit.get(&d).cloned().unwrap_or_default())
    }

    /// Raw per-entry analysis maps in store order. Any patch for the digit
    /// is appended as a final synthetic entry.
    pub fn raw_analysis(
        &self,
        digit: u32,
        inverted: bool,
    ) -> Result<Vec<BTreeMap<String, String>>, OntologyError> {
        let d = self.resolve_digit(digit, inverted)?;
        let mut out: Vec<BTreeMap<String, String>> = self
            .by_digit
            .get(&d)
            .map(|entries| entries.iter().map(|e| e.analysis.clone()).collect())
            .unwrap_or_default();
        if let Some(patch) = self.patches.get(&d) {
            if !patch.is_empty() {
                out.push(patch.clone());
            }
        }
        Ok(out)
    }

    /// All entries' tradition→text pairs folded into one map in store
    /// order, with the patch layer folded on top, using `policy`.
    pub fn merged_analysis(
        &self,
        digit: u32,
        inverted: bool,
        policy: MergePolicy,
    ) -> Result<BTreeMap<String, String>, OntologyError> {
        let d = self.resolve_digit(digit, inverted)?;
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        if let Some(entries) = self.by_digit.get(&d) {
            for entry in entries {
                for (k, v) in &entry.analysis {
                    merge_key(&mut merged, k, v, policy);
                }
            }
        }
        if let Some(patch) = self.patches.get(&d) {
            for (k, v) in patch {
                merge_key(&mut merged, k, v, policy);
            }
        }
        Ok(merged)
    }

    /// Case-insensitive lookup of one tradition's text in the merged view.
    pub fn tradition_text(
        &self,
        digit: u32,
        tradition: &str,
        inverted: bool,
    ) -> Result<Option<String>, OntologyError> {
        let analysis = self.merged_analysis(digit, inverted, MergePolicy::Last)?;
        let wanted = tradition.trim().to_lowercase();
        Ok(analysis
            .into_iter()
            .find(|(k, _)| k.trim().to_lowercase() == wanted)
            .map(|(_, v)| v))
    }

    /// True when the resolved digit has no base entries, or when every
    /// entry's analysis reduces to the single key "note" (or nothing) and no
    /// patch supplies real content.
    ///
    /// The no-entries branch deliberately returns before the patch layer is
    /// consulted: a patch alone does not clear the flag for an absent digit.
    pub fn is_digit_missing_or_incomplete(
        &self,
        digit: u32,
        inverted: bool,
    ) -> Result<bool, OntologyError> {
        let d = self.resolve_digit(digit, inverted)?;
        let entries = match self.by_digit.get(&d) {
            Some(entries) if !entries.is_empty() => entries,
            _ => return Ok(true),
        };

        let only_note = |e: &DigitEntry| {
            e.analysis
                .keys()
                .all(|k| k.trim().to_lowercase() == "note")
        };
        if entries.iter().all(only_note) {
            let patched = self.patches.get(&d).is_some_and(|p| !p.is_empty());
            return Ok(!patched);
        }
        Ok(false)
    }

    /// Merge tradition→text overrides into the patch layer for a digit.
    /// Repeated calls overwrite per key, regardless of any later merge
    /// policy used at read time.
    pub fn patch_digit(
        &mut self,
        digit: u32,
        patch: &BTreeMap<String, String>,
        inverted: bool,
    ) -> Result<(), OntologyError> {
        let d = self.resolve_digit(digit, inverted)?;
        let layer = self.patches.entry(d).or_default();
        for (k, v) in patch {
            layer.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    /// Short `(tradition, excerpt)` list for display and debugging: merged
    /// analysis sorted by tradition name, values whitespace-collapsed and
    /// truncated to a bounded excerpt.
    pub fn summarize_digit(
        &self,
        digit: u32,
        inverted: bool,
        policy: MergePolicy,
    ) -> Result<Vec<(String, String)>, OntologyError> {
        let analysis = self.merged_analysis(digit, inverted, policy)?;
        let mut items: Vec<(String, String)> = analysis.into_iter().collect();
        items.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));
        Ok(items
            .into_iter()
            .take(SUMMARY_MAX_ITEMS)
            .map(|(k, v)| (k, excerpt(&v, EXCERPT_LEN)))
            .collect())
    }

    /// Project an archetype digit to a trait vector: pole-template
    /// interpolation with digit overlays, weighted up by how much lore the
    /// store holds for the digit. Digit 0 ("unknown") projects to an empty
    /// vector.
    pub fn digit_to_traits(&self, digit: u32) -> Result<TraitVector, OntologyError> {
        if digit == 0 {
            return Ok(TraitVector::new());
        }
        let mut traits = interpolate_axis(
            digit,
            &intellect_template(),
            &instinct_template(),
            Some(&digit_overlays()),
            0.25,
            false,
        )
        .map_err(|_| OntologyError::Digit(crate::error::NumerologyError::InvalidDigit(digit)))?;

        let merged = self.merged_analysis(digit, false, MergePolicy::Last)?;
        if !merged.is_empty() {
            traits.insert("lore_depth".to_string(), LORE_DEPTH_STEP * merged.len() as f64);
        }
        Ok(traits)
    }
}

// ============================================================================
// Parsing internals
// ============================================================================

/// Parse the payload as JSON, retrying exactly once after splicing naively
/// concatenated arrays (`]` `[` → `,`). Both failures are reported.
fn parse_lenient_json(raw: &str) -> Result<Value, OntologyError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(v) => Ok(v),
        Err(direct) => {
            log::warn!("ontology payload failed direct parse; attempting splice repair");
            let repaired = ARRAY_SPLICE.replace_all(raw.trim(), ",");
            serde_json::from_str::<Value>(&repaired).map_err(|second| {
                OntologyError::ParseFailed {
                    direct: direct.to_string(),
                    repaired: second.to_string(),
                }
            })
        }
    }
}

fn coerce_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            // Integral floats (e.g. 4.0) count as coercible.
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Keep array elements that are objects with both a coercible `digit` and a
/// mapping `analysis`; drop the rest silently. Zero survivors is fatal.
fn normalize_entries(data: &Value) -> Result<Vec<DigitEntry>, OntologyError> {
    let items = data.as_array().ok_or(OntologyError::NotAnArray)?;

    let mut entries = Vec::new();
    for obj in items {
        let Some(map) = obj.as_object() else {
            continue;
        };
        let (Some(digit_value), Some(analysis_value)) = (map.get("digit"), map.get("analysis"))
        else {
            continue;
        };
        let Some(digit) = coerce_int(digit_value).and_then(|d| u32::try_from(d).ok()) else {
            log::debug!("skipping ontology element with uncoercible digit: {digit_value}");
            continue;
        };
        let Some(analysis_map) = analysis_value.as_object() else {
            continue;
        };
        let index = map.get("index").and_then(coerce_int).unwrap_or(-1);

        let mut analysis = BTreeMap::new();
        for (k, v) in analysis_map {
            if let Some(text) = coerce_text(v) {
                analysis.insert(k.clone(), text);
            }
        }

        entries.push(DigitEntry {
            index,
            digit,
            analysis,
        });
    }

    if entries.is_empty() {
        return Err(OntologyError::Empty);
    }
    Ok(entries)
}

fn merge_key(merged: &mut BTreeMap<String, String>, key: &str, value: &str, policy: MergePolicy) {
    match merged.get_mut(key) {
        None => {
            merged.insert(key.to_string(), value.to_string());
        }
        Some(existing) => match policy {
            MergePolicy::First => {}
            MergePolicy::Last => *existing = value.to_string(),
            MergePolicy::Concat => {
                if existing.trim() != value.trim() {
                    *existing = format!("{existing} / {value}");
                }
            }
        },
    }
}

fn excerpt(text: &str, n: usize) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text, " ");
    let collapsed = collapsed.trim();
    if collapsed.chars().count() <= n {
        collapsed.to_string()
    } else {
        let mut out: String = collapsed.chars().take(n - 1).collect();
        out.push('…');
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
