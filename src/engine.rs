//! Orchestration layer: numerology → ontology → interpolation → dynamics →
//! ethics → response assembly.
//!
//! The engine owns no session state. Each session lives in a caller-held
//! [`SoulState`] handle; `react` mutates that one handle in place and is not
//! safe for concurrent calls on the same session.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::{EngineConfig, NumerologyConfig};
use crate::dynamics::{DynamicsUpdater, LexicalDynamics};
use crate::error::EngineError;
use crate::ethics::{EthicsInfo, EthicsMediator};
use crate::interpolation::{axis_descriptor, shape_text, TraitVector};
use crate::numerology::{build_signature, invert_digit, reduce_number, DateInput};
use crate::ontology::Ontology;

/// Humor and complexity markers switch on at this slider level.
const SLIDER_HIGH: f64 = 0.66;

/// Fallback for a slider override that is present but not coercible to a
/// number.
const SLIDER_FALLBACK: f64 = 0.5;

/// Dominant traits quoted in the composed response.
const TOP_TRAITS: usize = 5;

// ============================================================================
// Identity and session state
// ============================================================================

/// Loosely structured identity payload. Only `name` and `dob` participate
/// in signature derivation; anything else a caller knows stays outside.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Identity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<DateInput>,
}

/// One remembered turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub stimulus: String,
    pub response: String,
}

/// Runtime session state: the stable personality profile plus the turn
/// dynamics. Exclusively owned by the caller that built it; discarded state
/// is gone, there is no background persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoulState {
    pub trait_vector: TraitVector,
    /// 0..=9, after reduction (and inversion when enabled). Immutable for
    /// the life of the session.
    pub digit_archetype: Option<u32>,
    /// Current position on the 1..=9 intellect/instinct axis.
    pub axis_position: u32,
    /// Optional intermediate mood spectrum value (2..=8).
    pub mood: Option<u32>,
    /// Most-recent turns, oldest first, bounded by the configured cap.
    pub memory: Vec<TurnRecord>,
    /// Debug snapshot of the latest derivation / turn.
    pub last_trace: Map<String, Value>,
}

/// Structured result of one `react` turn.
#[derive(Debug, Clone, Serialize)]
pub struct ReactResponse {
    pub text: String,
    pub axis_position: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<u32>,
    pub trace: Map<String, Value>,
    pub ethics: EthicsInfo,
}

// ============================================================================
// Engine
// ============================================================================

/// The orchestrator. Collaborators are injected at construction; there is
/// no hidden initialization order.
pub struct SoulEngine {
    config: EngineConfig,
    numerology: NumerologyConfig,
    ontology: Ontology,
    dynamics: Box<dyn DynamicsUpdater + Send + Sync>,
    mediator: EthicsMediator,
}

impl SoulEngine {
    /// Build an engine over a loaded ontology with the default dynamics
    /// strategy and keyword risk mediator.
    pub fn new(config: EngineConfig, numerology: NumerologyConfig, ontology: Ontology) -> Self {
        Self {
            config,
            numerology,
            ontology,
            dynamics: Box::new(LexicalDynamics),
            mediator: EthicsMediator::default(),
        }
    }

    /// Swap the per-turn dynamics strategy.
    pub fn with_dynamics(mut self, dynamics: Box<dyn DynamicsUpdater + Send + Sync>) -> Self {
        self.dynamics = dynamics;
        self
    }

    /// Swap the ethics mediator.
    pub fn with_mediator(mut self, mediator: EthicsMediator) -> Self {
        self.mediator = mediator;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    /// Mutable access to the ontology, e.g. to apply patches.
    pub fn ontology_mut(&mut self) -> &mut Ontology {
        &mut self.ontology
    }

    // ------------------------------------------------------------------
    // Profile construction
    // ------------------------------------------------------------------

    /// Derive a session from identity data: signature → core archetype
    /// digit (inverted when configured) → trait projection → initial state
    /// with a trace snapshot of the derivation.
    pub fn build_state_from_identity(
        &self,
        identity: &Identity,
        axis_position: Option<u32>,
    ) -> Result<SoulState, EngineError> {
        if identity.name.is_none() && identity.dob.is_none() {
            return Err(EngineError::EmptyIdentity);
        }

        let signature = build_signature(
            identity.name.as_deref(),
            identity.dob.as_ref(),
            &self.numerology,
        )?;

        // Core archetype: the preferred facet collapsed to a single digit
        // (master numbers reduce on through, 11→2, 22→4, 33→6).
        let core = signature.core_facet().ok_or(EngineError::MissingCoreDigit)?;
        let mut archetype = reduce_number(i64::from(core.pythagorean), &[], true)?;
        if self.config.inversion_enabled {
            archetype = invert_digit(archetype)?;
        }

        let trait_vector = self.ontology.digit_to_traits(archetype)?;

        let axis = clamp_axis(axis_position.unwrap_or(self.config.axis_default));

        let mut last_trace = Map::new();
        last_trace.insert(
            "signature".to_string(),
            serde_json::to_value(&signature).unwrap_or(Value::Null),
        );
        last_trace.insert("digit_archetype".to_string(), json!(archetype));
        last_trace.insert(
            "inversion_enabled".to_string(),
            json!(self.config.inversion_enabled),
        );

        log::debug!("built session: archetype={archetype} axis={axis}");

        Ok(SoulState {
            trait_vector,
            digit_archetype: Some(archetype),
            axis_position: axis,
            mood: None,
            memory: Vec::new(),
            last_trace,
        })
    }

    // ------------------------------------------------------------------
    // Reaction
    // ------------------------------------------------------------------

    /// One conversational turn. Clamps and defaults its inputs rather than
    /// rejecting them: this path never fails.
    pub fn react(
        &self,
        state: &mut SoulState,
        stimulus: &str,
        sliders: Option<&Map<String, Value>>,
        context: Option<&Map<String, Value>>,
    ) -> ReactResponse {
        let empty = Map::new();
        let context = context.unwrap_or(&empty);

        let tone = pick_slider(sliders, "tone", self.config.tone);
        let humor = pick_slider(sliders, "humor", self.config.humor);
        let complexity = pick_slider(sliders, "complexity", self.config.complexity);

        // 1) Advance dynamics. The strategy owns the algorithm; the engine
        // enforces the range contract.
        let update = self
            .dynamics
            .update(state.axis_position, &state.trait_vector, stimulus, context);
        let axis_next = clamp_axis(update.axis_position);
        let mood_next = update.mood.map(|m| m.clamp(2, 8));

        // 2) Deterministic draft.
        let draft = compose_response_text(
            &state.trait_vector,
            axis_next,
            mood_next,
            stimulus,
            tone,
            humor,
            complexity,
        );

        // 3) Mediation.
        let (final_text, ethics_info) = if self.config.ethics_enabled {
            self.mediator.mediate(
                &draft,
                stimulus,
                &state.trait_vector,
                self.config.ethics_threshold,
            )
        } else {
            (draft, EthicsInfo::disabled())
        };

        // 4) Commit state and memory.
        let axis_before = state.axis_position;
        state.axis_position = axis_next;
        state.mood = mood_next;
        push_memory(state, stimulus, &final_text, self.config.memory_max_turns);

        // 5) Trace.
        let mut trace = Map::new();
        trace.insert("digit_archetype".to_string(), json!(state.digit_archetype));
        trace.insert("axis_position_before".to_string(), json!(axis_before));
        trace.insert("axis_position_after".to_string(), json!(axis_next));
        trace.insert("mood".to_string(), json!(mood_next));
        trace.insert(
            "sliders".to_string(),
            json!({"tone": tone, "humor": humor, "complexity": complexity}),
        );
        trace.insert("dynamics".to_string(), update.trace);

        state.last_trace.insert("axis_position".to_string(), json!(axis_next));
        state.last_trace.insert("mood".to_string(), json!(mood_next));
        state
            .last_trace
            .insert("react_trace".to_string(), Value::Object(trace.clone()));

        ReactResponse {
            text: final_text,
            axis_position: axis_next,
            mood: mood_next,
            trace,
            ethics: ethics_info,
        }
    }
}

// ============================================================================
// Internals
// ============================================================================

fn clamp_axis(axis: u32) -> u32 {
    axis.clamp(1, 9)
}

/// Resolve one style slider: an override wins when coercible to a number
/// (malformed overrides fall back to the neutral 0.5 instead of failing),
/// otherwise the configured default applies. Always clamped to [0, 1].
fn pick_slider(sliders: Option<&Map<String, Value>>, key: &str, default: f64) -> f64 {
    let Some(value) = sliders.and_then(|m| m.get(key)) else {
        return crate::interpolation::clamp01(default);
    };
    let coerced = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    crate::interpolation::clamp01(coerced.unwrap_or(SLIDER_FALLBACK))
}

/// The strongest traits by absolute weight, ties broken by name for
/// deterministic output.
fn top_traits(traits: &TraitVector, n: usize) -> Vec<(&str, f64)> {
    let mut items: Vec<(&str, f64)> = traits.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    items.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    items.truncate(n);
    items
}

/// Placeholder generator: deterministic template composition. A real
/// generation stack belongs in a higher layer.
fn compose_response_text(
    trait_vector: &TraitVector,
    axis_position: u32,
    mood: Option<u32>,
    stimulus: &str,
    tone: f64,
    humor: f64,
    complexity: f64,
) -> String {
    let top = top_traits(trait_vector, TOP_TRAITS);
    let traits_str = if top.is_empty() {
        "none".to_string()
    } else {
        top.iter()
            .map(|(k, v)| format!("{k}:{v:+.2}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut prefix = if tone >= 0.5 { "Response" } else { "Note" }.to_string();
    if humor >= SLIDER_HIGH {
        prefix.push_str(" (light)");
    }

    let detail = if complexity >= SLIDER_HIGH {
        let mood_str = mood.map_or("none".to_string(), |m| m.to_string());
        format!(
            "\n\nInternal state: axis={axis_position} ({}), mood={mood_str}, traits=[{traits_str}]",
            axis_descriptor(axis_position)
        )
    } else {
        String::new()
    };

    format!(
        "{prefix}: {}{detail}",
        shape_text(stimulus, axis_position)
    )
}

fn push_memory(state: &mut SoulState, stimulus: &str, response: &str, cap: usize) {
    state.memory.push(TurnRecord {
        stimulus: stimulus.to_string(),
        response: response.to_string(),
    });
    if state.memory.len() > cap {
        let excess = state.memory.len() - cap;
        state.memory.drain(..excess);
    }
}

// ============================================================================
// Tests
// ============================================================================
