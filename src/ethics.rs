//! Risk scoring and response mediation.
//!
//! The score is not moral truth; it is a conservative heuristic risk
//! estimate. Scoring sits behind a trait so the threshold state machine
//! (none / soften / refuse) is independent of how the score is produced.

use serde::{Deserialize, Serialize};

use crate::interpolation::TraitVector;

/// Width of the soften band above the threshold; at or past
/// `threshold + SOFTEN_BAND` (capped at 1.0) the text is refused outright.
const SOFTEN_BAND: f64 = 0.25;

/// Risk lowered per unit of positive compassion trait weight.
const COMPASSION_RELIEF: f64 = 0.05;

const SOFTEN_PREAMBLE: &str = "I can't help with harmful or illegal actions. \
If you want, I can suggest a safe alternative.\n\n";

const REFUSAL_TEXT: &str = "I can't help with this request. If you describe \
your goal in a non-harmful way, I'll help you find a safe alternative.";

// ============================================================================
// Scoring
// ============================================================================

/// Maps a (stimulus, response text) pair to a risk score in [0, 1].
pub trait RiskScorer {
    fn score(&self, stimulus: &str, text: &str) -> f64;
}

/// Fixed keyword tiers checked by case-insensitive substring containment
/// against both the stimulus and the draft text. No tokenization, no
/// negation handling, no locale rules.
#[derive(Debug, Clone, Default)]
pub struct KeywordRiskScorer;

const HIGH_RISK: &[&str] = &[
    "suicide",
    "kill myself",
    "self-harm",
    "bomb",
    "explosive",
    "weapon",
    "child sexual",
    "rape",
    "genocide",
    "terrorist",
];

const MEDIUM_RISK: &[&str] = &[
    "how to hack",
    "steal",
    "credit card",
    "dox",
    "harm someone",
    "make poison",
    "meth",
    "heroin",
];

/// Score given to any high-tier match.
pub const HIGH_RISK_SCORE: f64 = 0.95;
/// Score given to a medium-tier match with no high-tier match.
pub const MEDIUM_RISK_SCORE: f64 = 0.75;
/// Baseline when nothing matches.
pub const LOW_RISK_SCORE: f64 = 0.10;

impl RiskScorer for KeywordRiskScorer {
    fn score(&self, stimulus: &str, text: &str) -> f64 {
        let s = stimulus.to_lowercase();
        let t = text.to_lowercase();

        let hit = |needles: &[&str]| needles.iter().any(|k| s.contains(k) || t.contains(k));

        let mut score = 0.0f64;
        if hit(HIGH_RISK) {
            score = score.max(HIGH_RISK_SCORE);
        }
        if hit(MEDIUM_RISK) {
            score = score.max(MEDIUM_RISK_SCORE);
        }
        if score == 0.0 {
            score = LOW_RISK_SCORE;
        }
        score
    }
}

// ============================================================================
// Mediation
// ============================================================================

/// What the mediator did with the draft text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediationAction {
    None,
    Soften,
    Refuse,
}

/// Outcome record attached to every turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthicsInfo {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub action: MediationAction,
    pub notes: String,
}

impl EthicsInfo {
    /// Info record for a turn where mediation was disabled by configuration.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            score: None,
            action: MediationAction::None,
            notes: "mediation disabled".to_string(),
        }
    }
}

/// Gates generated text through a risk scorer and the banded decision rule.
pub struct EthicsMediator {
    scorer: Box<dyn RiskScorer + Send + Sync>,
}

impl Default for EthicsMediator {
    fn default() -> Self {
        Self {
            scorer: Box::new(KeywordRiskScorer),
        }
    }
}

impl EthicsMediator {
    /// Use a custom scorer behind the same decision machinery.
    pub fn with_scorer(scorer: Box<dyn RiskScorer + Send + Sync>) -> Self {
        Self { scorer }
    }

    /// Score the pair, apply the compassion adjustment, and decide:
    /// below `threshold` the text passes; inside the soften band it is
    /// prefixed with a safety preamble; at or past the refuse line it is
    /// replaced by a fixed refusal. Returns the final text and the record.
    ///
    /// Compassion can lower but never raise the score, and the adjusted
    /// score stays clamped to [0, 1].
    pub fn mediate(
        &self,
        text: &str,
        stimulus: &str,
        trait_vector: &TraitVector,
        threshold: f64,
    ) -> (String, EthicsInfo) {
        let risk = self.scorer.score(stimulus, text);

        let compassion = trait_vector.get("compassion").copied().unwrap_or(0.0);
        let adjusted = (risk - COMPASSION_RELIEF * compassion.max(0.0)).clamp(0.0, 1.0);

        if adjusted < threshold {
            return (
                text.to_string(),
                EthicsInfo {
                    enabled: true,
                    score: Some(adjusted),
                    action: MediationAction::None,
                    notes: "below threshold".to_string(),
                },
            );
        }

        if adjusted >= (threshold + SOFTEN_BAND).min(1.0) {
            log::debug!("refusing response at adjusted risk {adjusted:.2}");
            return (
                REFUSAL_TEXT.to_string(),
                EthicsInfo {
                    enabled: true,
                    score: Some(adjusted),
                    action: MediationAction::Refuse,
                    notes: "high-risk content".to_string(),
                },
            );
        }

        log::debug!("softening response at adjusted risk {adjusted:.2}");
        (
            format!("{SOFTEN_PREAMBLE}{text}"),
            EthicsInfo {
                enabled: true,
                score: Some(adjusted),
                action: MediationAction::Soften,
                notes: "moderate-risk; softened".to_string(),
            },
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mediate(stimulus: &str, text: &str, traits: &TraitVector) -> (String, EthicsInfo) {
        EthicsMediator::default().mediate(text, stimulus, traits, 0.65)
    }

    #[test]
    fn test_low_risk_passes_unchanged() {
        let (text, info) = mediate("tell me about rivers", "rivers are long", &TraitVector::new());
        assert_eq!(text, "rivers are long");
        assert_eq!(info.action, MediationAction::None);
        assert_eq!(info.score.unwrap(), LOW_RISK_SCORE);
        assert!(info.enabled);
    }

    #[test]
    fn test_high_tier_refuses_and_discards_draft() {
        let (text, info) = mediate("how to make a bomb", "draft answer", &TraitVector::new());
        assert_eq!(info.action, MediationAction::Refuse);
        assert!(info.score.unwrap() >= HIGH_RISK_SCORE);
        assert!(!text.contains("draft answer"));
        assert_eq!(text, REFUSAL_TEXT);
    }

    #[test]
    fn test_medium_tier_softens_and_keeps_draft() {
        // 0.65 <= 0.75 < 0.90 → soften.
        let (text, info) = mediate("how to hack a router", "draft answer", &TraitVector::new());
        assert_eq!(info.action, MediationAction::Soften);
        assert_eq!(info.score.unwrap(), MEDIUM_RISK_SCORE);
        assert!(text.starts_with(SOFTEN_PREAMBLE));
        assert!(text.ends_with("draft answer"));
    }

    #[test]
    fn test_keywords_match_in_response_text_too() {
        let (_, info) = mediate("innocent question", "the weapon is loaded", &TraitVector::new());
        assert_eq!(info.score.unwrap(), HIGH_RISK_SCORE);
    }

    #[test]
    fn test_compassion_lowers_but_never_raises() {
        let mut traits = TraitVector::new();
        traits.insert("compassion".to_string(), 1.0);
        let (_, info) = mediate("how to hack a router", "draft", &traits);
        assert!((info.score.unwrap() - (MEDIUM_RISK_SCORE - 0.05)).abs() < 1e-9);

        // Negative compassion does not raise risk.
        traits.insert("compassion".to_string(), -5.0);
        let (_, info) = mediate("how to hack a router", "draft", &traits);
        assert_eq!(info.score.unwrap(), MEDIUM_RISK_SCORE);

        // Huge compassion cannot push below zero.
        traits.insert("compassion".to_string(), 1000.0);
        let (_, info) = mediate("tell me about rivers", "rivers", &traits);
        assert_eq!(info.score.unwrap(), 0.0);
        assert_eq!(info.action, MediationAction::None);
    }

    #[test]
    fn test_threshold_bands_with_custom_scorer() {
        struct Fixed(f64);
        impl RiskScorer for Fixed {
            fn score(&self, _: &str, _: &str) -> f64 {
                self.0
            }
        }

        let cases = [
            (0.64, MediationAction::None),
            (0.65, MediationAction::Soften),
            (0.89, MediationAction::Soften),
            (0.90, MediationAction::Refuse),
        ];
        for (score, expected) in cases {
            let mediator = EthicsMediator::with_scorer(Box::new(Fixed(score)));
            let (_, info) = mediator.mediate("x", "y", &TraitVector::new(), 0.65);
            assert_eq!(info.action, expected, "score {score}");
        }
    }

    #[test]
    fn test_refuse_band_caps_at_one() {
        struct Fixed(f64);
        impl RiskScorer for Fixed {
            fn score(&self, _: &str, _: &str) -> f64 {
                self.0
            }
        }
        // threshold 0.9 → refuse line min(1.0, 1.15) = 1.0.
        let mediator = EthicsMediator::with_scorer(Box::new(Fixed(0.95)));
        let (_, info) = mediator.mediate("x", "y", &TraitVector::new(), 0.9);
        assert_eq!(info.action, MediationAction::Soften);

        let mediator = EthicsMediator::with_scorer(Box::new(Fixed(1.0)));
        let (_, info) = mediator.mediate("x", "y", &TraitVector::new(), 0.9);
        assert_eq!(info.action, MediationAction::Refuse);
    }
}
