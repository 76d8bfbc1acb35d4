//! Immutable runtime configuration value objects.
//!
//! Both configs are constructed once and passed by reference into every
//! operation that needs them. There is no process-wide mutable default.

use serde::{Deserialize, Serialize};

/// Core engine configuration.
///
/// `inversion_enabled` applies the inverted Pythagorean mapping
/// (9→1, 8→2, ..., 1→9; 0 stays 0) to the archetype digit after standard
/// reduction. `axis_default` is the starting position on the 1..=9
/// intellect/instinct axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_true")]
    pub inversion_enabled: bool,
    /// Neutral midpoint of the axis.
    #[serde(default = "default_axis")]
    pub axis_default: u32,
    /// Most-recent turns kept in session memory.
    #[serde(default = "default_memory_max_turns")]
    pub memory_max_turns: usize,

    // Style sliders (0..=1), overridable per call.
    #[serde(default = "default_half")]
    pub tone: f64,
    #[serde(default = "default_humor")]
    pub humor: f64,
    #[serde(default = "default_half")]
    pub complexity: f64,

    // Ethics / safety knobs.
    #[serde(default = "default_true")]
    pub ethics_enabled: bool,
    #[serde(default = "default_ethics_threshold")]
    pub ethics_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inversion_enabled: true,
            axis_default: 5,
            memory_max_turns: 12,
            tone: 0.5,
            humor: 0.2,
            complexity: 0.5,
            ethics_enabled: true,
            ethics_threshold: 0.65,
        }
    }
}

/// Configuration for numerological reductions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumerologyConfig {
    /// Master numbers that stop reduction (conventionally 11, 22, 33).
    #[serde(default = "default_masters")]
    pub keep_master_numbers: Vec<u32>,
    /// Whether facet helpers attach the inverted digit.
    #[serde(default = "default_true")]
    pub apply_inversion: bool,
}

impl Default for NumerologyConfig {
    fn default() -> Self {
        Self {
            keep_master_numbers: vec![11, 22, 33],
            apply_inversion: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_axis() -> u32 {
    5
}

fn default_memory_max_turns() -> usize {
    12
}

fn default_half() -> f64 {
    0.5
}

fn default_humor() -> f64 {
    0.2
}

fn default_ethics_threshold() -> f64 {
    0.65
}

fn default_masters() -> Vec<u32> {
    vec![11, 22, 33]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults() {
        let cfg = EngineConfig::default();
        assert!(cfg.inversion_enabled);
        assert_eq!(cfg.axis_default, 5);
        assert_eq!(cfg.memory_max_turns, 12);
        assert_eq!(cfg.tone, 0.5);
        assert_eq!(cfg.humor, 0.2);
        assert_eq!(cfg.complexity, 0.5);
        assert!(cfg.ethics_enabled);
        assert_eq!(cfg.ethics_threshold, 0.65);
    }

    #[test]
    fn test_numerology_config_defaults() {
        let cfg = NumerologyConfig::default();
        assert_eq!(cfg.keep_master_numbers, vec![11, 22, 33]);
        assert!(cfg.apply_inversion);
    }

    #[test]
    fn test_configs_deserialize_with_partial_fields() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"tone": 0.9}"#).unwrap();
        assert_eq!(cfg.tone, 0.9);
        assert_eq!(cfg.humor, 0.2);
        assert!(cfg.ethics_enabled);

        let ncfg: NumerologyConfig = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(ncfg.keep_master_numbers, vec![11, 22, 33]);
    }
}
