//! Axis/mood dynamics: a swappable per-turn update strategy.
//!
//! The engine calls the updater once per turn with the current axis
//! position, the session's trait vector, the stimulus, and the caller
//! context. Implementations must not mutate their inputs and must stay
//! deterministic for deterministic inputs.

use serde_json::{json, Map, Value};

use crate::interpolation::TraitVector;

/// Result of one dynamics step. `axis_position` is in 1..=9; `mood`, when
/// present, is in 2..=8.
#[derive(Debug, Clone)]
pub struct DynamicsUpdate {
    pub axis_position: u32,
    pub mood: Option<u32>,
    /// Debug trace of how the step was computed.
    pub trace: Value,
}

/// Per-turn axis/mood update strategy.
pub trait DynamicsUpdater {
    fn update(
        &self,
        axis_position: u32,
        trait_vector: &TraitVector,
        stimulus: &str,
        context: &Map<String, Value>,
    ) -> DynamicsUpdate;
}

// ============================================================================
// Default lexical strategy
// ============================================================================

const INSTINCT_CUES: &[&str] = &[
    "feel", "love", "hate", "fear", "afraid", "dream", "angry", "furious", "hungry", "!",
];

const INTELLECT_CUES: &[&str] = &[
    "why", "how", "explain", "analyze", "think", "plan", "because", "therefore", "compare", "?",
];

const POSITIVE_CUES: &[&str] = &["thanks", "great", "love", "happy", "good", "wonderful"];

const NEGATIVE_CUES: &[&str] = &["hate", "sad", "angry", "terrible", "bad", "awful"];

fn count_cues(haystack: &str, cues: &[&str]) -> i64 {
    cues.iter()
        .map(|cue| haystack.matches(cue).count() as i64)
        .sum()
}

/// Default deterministic dynamics: lexical cues pull the axis one step per
/// turn toward an instinct or intellect target, biased by the session's own
/// trait tilt; mood follows the valence of the stimulus and is absent when
/// nothing affective matched.
#[derive(Debug, Clone, Default)]
pub struct LexicalDynamics;

impl LexicalDynamics {
    fn trait_tilt(traits: &TraitVector) -> i64 {
        let get = |k: &str| traits.get(k).copied().unwrap_or(0.0);
        let tilt = (get("intuition") + get("passion")) - (get("analysis") + get("logic"));
        if tilt > 0.25 {
            1
        } else if tilt < -0.25 {
            -1
        } else {
            0
        }
    }
}

impl DynamicsUpdater for LexicalDynamics {
    fn update(
        &self,
        axis_position: u32,
        trait_vector: &TraitVector,
        stimulus: &str,
        _context: &Map<String, Value>,
    ) -> DynamicsUpdate {
        let lowered = stimulus.to_lowercase();

        let instinct_hits = count_cues(&lowered, INSTINCT_CUES);
        let intellect_hits = count_cues(&lowered, INTELLECT_CUES);
        let drive = (instinct_hits - intellect_hits).clamp(-2, 2);
        let tilt = Self::trait_tilt(trait_vector);

        let axis = i64::from(axis_position.clamp(1, 9));
        let target = (axis + drive + tilt).clamp(1, 9);
        // Inertia: one step toward the target per turn.
        let next_axis = (axis + (target - axis).signum()) as u32;

        let positive = count_cues(&lowered, POSITIVE_CUES);
        let negative = count_cues(&lowered, NEGATIVE_CUES);
        let valence = (positive - negative).clamp(-3, 3);
        let affective = positive + negative + instinct_hits > 0;
        let mood = affective.then(|| (5 + valence).clamp(2, 8) as u32);

        let trace = json!({
            "instinct_hits": instinct_hits,
            "intellect_hits": intellect_hits,
            "drive": drive,
            "trait_tilt": tilt,
            "target": target,
            "valence": valence,
        });

        DynamicsUpdate {
            axis_position: next_axis,
            mood,
            trace,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
