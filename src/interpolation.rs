//! Trait-vector interpolation along the 1..=9 intellect/instinct axis.
//!
//! Vectors are sparse maps from trait name to signed weight; absent keys
//! mean weight 0. Digit 1 sits at the intellect pole, digit 9 at the
//! instinct pole, and digits 2..=8 can carry modulation overlays.

use std::collections::BTreeMap;

use crate::error::InterpolationError;

/// Sparse trait name → signed weight mapping.
pub type TraitVector = BTreeMap<String, f64>;

/// Near-zero floor below which L1 normalization is skipped.
const L1_FLOOR: f64 = 1e-12;

/// Clamp to the unit interval.
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Linear interpolation `(1-t)*a + t*b`, with `t` clamped to [0, 1].
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let t = clamp01(t);
    (1.0 - t) * a + t * b
}

/// Blend two trait vectors key-wise over the union of their keys, with
/// missing keys treated as 0. `t = 0` yields `a`, `t = 1` yields `b`.
pub fn blend_vectors(a: &TraitVector, b: &TraitVector, t: f64) -> TraitVector {
    let t = clamp01(t);
    let mut out = TraitVector::new();
    for key in a.keys().chain(b.keys()) {
        let av = a.get(key).copied().unwrap_or(0.0);
        let bv = b.get(key).copied().unwrap_or(0.0);
        out.insert(key.clone(), lerp(av, bv, t));
    }
    out
}

/// Key-wise `base + scale * overlay`; overlay keys absent from `base` are
/// added fresh.
pub fn add_scaled(base: &TraitVector, overlay: &TraitVector, scale: f64) -> TraitVector {
    let mut out = base.clone();
    for (key, value) in overlay {
        *out.entry(key.clone()).or_insert(0.0) += value * scale;
    }
    out
}

/// Scale every value so the sum of absolute values equals `target_sum`.
/// An all-zeros vector (absolute sum at or below the floor) is returned
/// unchanged to avoid dividing by nothing.
pub fn normalize_l1(v: &TraitVector, target_sum: f64) -> TraitVector {
    let sum: f64 = v.values().map(|x| x.abs()).sum();
    if sum <= L1_FLOOR {
        return v.clone();
    }
    let scale = target_sum / sum;
    v.iter().map(|(k, x)| (k.clone(), x * scale)).collect()
}

/// Map an axis digit in 1..=9 to a continuous position in [0, 1]:
/// 1 → 0.0 (intellect pole), 9 → 1.0 (instinct pole).
pub fn axis_fraction(axis_digit: u32) -> Result<f64, InterpolationError> {
    if !(1..=9).contains(&axis_digit) {
        return Err(InterpolationError::AxisOutOfRange(axis_digit));
    }
    Ok(f64::from(axis_digit - 1) / 8.0)
}

/// Interpolate between the intellect (axis 1) and instinct (axis 9)
/// templates, apply any overlay registered for exactly `axis_digit` at
/// `overlay_strength`, then optionally L1-normalize to 1.0.
pub fn interpolate_axis(
    axis_digit: u32,
    intellect: &TraitVector,
    instinct: &TraitVector,
    overlays: Option<&BTreeMap<u32, TraitVector>>,
    overlay_strength: f64,
    normalize: bool,
) -> Result<TraitVector, InterpolationError> {
    let t = axis_fraction(axis_digit)?;
    let mut out = blend_vectors(intellect, instinct, t);

    if let Some(overlay) = overlays.and_then(|m| m.get(&axis_digit)) {
        out = add_scaled(&out, overlay, overlay_strength);
    }

    if normalize {
        out = normalize_l1(&out, 1.0);
    }
    Ok(out)
}

// ============================================================================
// Built-in templates
// ============================================================================

fn vector(pairs: &[(&str, f64)]) -> TraitVector {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

/// Trait template for the intellect pole (axis 1).
pub fn intellect_template() -> TraitVector {
    vector(&[
        ("analysis", 0.9),
        ("logic", 0.8),
        ("curiosity", 0.6),
        ("detachment", 0.4),
        ("compassion", 0.2),
    ])
}

/// Trait template for the instinct pole (axis 9).
pub fn instinct_template() -> TraitVector {
    vector(&[
        ("intuition", 0.9),
        ("passion", 0.8),
        ("compassion", 0.6),
        ("impulsivity", 0.5),
        ("curiosity", 0.3),
    ])
}

/// Modulation overlays for the middle band (digits 2..=8).
pub fn digit_overlays() -> BTreeMap<u32, TraitVector> {
    let mut overlays = BTreeMap::new();
    overlays.insert(2, vector(&[("harmony", 0.6), ("compassion", 0.3)]));
    overlays.insert(3, vector(&[("expression", 0.6), ("humor", 0.4)]));
    overlays.insert(4, vector(&[("structure", 0.6), ("patience", 0.3)]));
    overlays.insert(5, vector(&[("freedom", 0.6), ("restlessness", 0.4)]));
    overlays.insert(6, vector(&[("care", 0.6), ("compassion", 0.4)]));
    overlays.insert(7, vector(&[("introspection", 0.6), ("detachment", 0.3)]));
    overlays.insert(8, vector(&[("ambition", 0.6), ("drive", 0.4)]));
    overlays
}

// ============================================================================
// Axis descriptors and text shaping
// ============================================================================

/// Short label for a band of the 1..=9 axis. Out-of-range positions are
/// reported as unknown rather than rejected; callers clamp upstream.
pub fn axis_descriptor(axis_position: u32) -> &'static str {
    match axis_position {
        1..=2 => "analytical",
        3..=4 => "reflective",
        5 => "balanced",
        6..=7 => "intuitive",
        8..=9 => "instinctive",
        _ => "unknown",
    }
}

/// Deterministic rephrasing of the stimulus shaded by the axis band.
pub fn shape_text(stimulus: &str, axis_position: u32) -> String {
    let stimulus = stimulus.trim();
    match axis_position {
        1..=3 => format!("considering \"{stimulus}\" step by step"),
        4..=6 => format!("weighing \"{stimulus}\" from both sides"),
        _ => format!("reacting to \"{stimulus}\" on feel"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn v(pairs: &[(&str, f64)]) -> TraitVector {
        vector(pairs)
    }

    #[test]
    fn test_blend_endpoints() {
        let a = v(&[("x", 1.0), ("shared", 0.5)]);
        let b = v(&[("y", -2.0), ("shared", 1.5)]);

        let at_a = blend_vectors(&a, &b, 0.0);
        assert_eq!(at_a.get("x").copied().unwrap(), 1.0);
        assert_eq!(at_a.get("shared").copied().unwrap(), 0.5);
        // Missing on the a side blends from 0.
        assert_eq!(at_a.get("y").copied().unwrap(), 0.0);

        let at_b = blend_vectors(&a, &b, 1.0);
        assert_eq!(at_b.get("y").copied().unwrap(), -2.0);
        assert_eq!(at_b.get("shared").copied().unwrap(), 1.5);
        assert_eq!(at_b.get("x").copied().unwrap(), 0.0);
    }

    #[test]
    fn test_blend_clamps_t() {
        let a = v(&[("x", 1.0)]);
        let b = v(&[("x", 3.0)]);
        assert_eq!(blend_vectors(&a, &b, -5.0).get("x").copied().unwrap(), 1.0);
        assert_eq!(blend_vectors(&a, &b, 5.0).get("x").copied().unwrap(), 3.0);
    }

    #[test]
    fn test_add_scaled_adds_fresh_keys() {
        let base = v(&[("x", 1.0)]);
        let overlay = v(&[("x", 2.0), ("new", 4.0)]);
        let out = add_scaled(&base, &overlay, 0.25);
        assert_eq!(out.get("x").copied().unwrap(), 1.5);
        assert_eq!(out.get("new").copied().unwrap(), 1.0);
    }

    #[test]
    fn test_normalize_l1_scales_to_target() {
        let out = normalize_l1(&v(&[("a", 3.0), ("b", -1.0)]), 1.0);
        let sum: f64 = out.values().map(|x| x.abs()).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(out.get("b").copied().unwrap() < 0.0);
    }

    #[test]
    fn test_normalize_l1_zero_vector_unchanged() {
        let zeros = v(&[("a", 0.0), ("b", 0.0)]);
        assert_eq!(normalize_l1(&zeros, 1.0), zeros);
    }

    #[test]
    fn test_axis_fraction_poles_and_range() {
        assert_eq!(axis_fraction(1).unwrap(), 0.0);
        assert_eq!(axis_fraction(9).unwrap(), 1.0);
        assert_eq!(axis_fraction(5).unwrap(), 0.5);
        assert!(axis_fraction(0).is_err());
        assert!(axis_fraction(10).is_err());
    }

    #[test]
    fn test_interpolate_axis_applies_overlay_only_for_exact_digit() {
        let intellect = intellect_template();
        let instinct = instinct_template();
        let overlays = digit_overlays();

        let with = interpolate_axis(3, &intellect, &instinct, Some(&overlays), 0.25, false)
            .unwrap();
        assert_eq!(with.get("expression").copied().unwrap(), 0.6 * 0.25);

        let without = interpolate_axis(1, &intellect, &instinct, Some(&overlays), 0.25, false)
            .unwrap();
        assert!(!without.contains_key("expression"));
        assert_eq!(without.get("analysis").copied().unwrap(), 0.9);
    }

    #[test]
    fn test_interpolate_axis_normalized() {
        let out = interpolate_axis(
            5,
            &intellect_template(),
            &instinct_template(),
            None,
            0.25,
            true,
        )
        .unwrap();
        let sum: f64 = out.values().map(|x| x.abs()).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_axis_descriptor_bands() {
        assert_eq!(axis_descriptor(1), "analytical");
        assert_eq!(axis_descriptor(5), "balanced");
        assert_eq!(axis_descriptor(9), "instinctive");
        assert_eq!(axis_descriptor(0), "unknown");
    }

    #[test]
    fn test_shape_text_is_deterministic_per_band() {
        assert_eq!(shape_text(" hello ", 2), shape_text("hello", 1));
        assert!(shape_text("hello", 9).contains("feel"));
    }
}
