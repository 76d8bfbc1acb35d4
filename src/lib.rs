//! # Ame
//!
//! Deterministic persona derivation and mediation engine.
//!
//! The pipeline: identity data (name and/or birth date) is reduced to a
//! single archetype digit through Pythagorean numerology with an optional
//! inversion rule; the digit is projected to a semantic trait vector through
//! a lenient, patchable knowledge store; a 1..=9 intellect/instinct axis
//! evolves per conversational turn through a pluggable dynamics strategy;
//! and every composed response is gated by a heuristic risk mediator before
//! it reaches the caller.
//!
//! Everything is synchronous and single-threaded. Session state lives in a
//! caller-owned [`SoulState`] handle mutated in place by
//! [`SoulEngine::react`]; nothing persists beyond it.

pub mod config;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod ethics;
pub mod interpolation;
pub mod numerology;
pub mod ontology;

pub use config::{EngineConfig, NumerologyConfig};
pub use dynamics::{DynamicsUpdate, DynamicsUpdater, LexicalDynamics};
pub use engine::{Identity, ReactResponse, SoulEngine, SoulState, TurnRecord};
pub use error::{EngineError, InterpolationError, NumerologyError, OntologyError};
pub use ethics::{EthicsInfo, EthicsMediator, KeywordRiskScorer, MediationAction, RiskScorer};
pub use interpolation::TraitVector;
pub use numerology::{DateInput, FacetNumber, Signature};
pub use ontology::{DigitEntry, MergePolicy, Ontology};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
