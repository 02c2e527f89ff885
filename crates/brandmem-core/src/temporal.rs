//! Temporal decay for memory ranking
//!
//! Items lose retrieval weight exponentially with age. The decay rate is
//! modulated per item by its significance: foundational facts (s = 1.0) decay
//! ten times slower than the base rate, fleeting ones (s = 0.0) twice as fast.
//!
//! ```text
//! w        = exp(-alpha_adj * days)
//! alpha_adj = alpha * (1.0 - (s - 0.5) * 1.8)   for s >= 0.5
//! alpha_adj = alpha * (2.0 - 2.0 * s)           for s <  0.5
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base decay rate per day
pub const DEFAULT_DECAY_ALPHA: f64 = 0.02;

/// Weight of embedding similarity in the combined score
pub const DEFAULT_SIMILARITY_WEIGHT: f64 = 0.6;

/// Weight of the temporal weight in the combined score
pub const DEFAULT_TEMPORAL_WEIGHT: f64 = 0.4;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Decay rate scaled by significance (clamped into [0, 1])
pub fn adjusted_alpha(alpha: f64, significance: f64) -> f64 {
    let s = significance.clamp(0.0, 1.0);
    if s >= 0.5 {
        alpha * (1.0 - (s - 0.5) * 1.8)
    } else {
        alpha * (2.0 - 2.0 * s)
    }
}

/// Days until the weight halves for a given decay rate
pub fn half_life_days(alpha: f64) -> f64 {
    std::f64::consts::LN_2 / alpha
}

/// Fractional days elapsed from `created_at` to `now`, clamped at zero
pub fn elapsed_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created_at).num_milliseconds();
    (millis as f64 / MILLIS_PER_DAY).max(0.0)
}

/// Parse a stored timestamp, falling back when it is missing or malformed.
///
/// Accepts RFC 3339 and naive ISO-8601 (`2024-03-01T09:30:00[.123]`, read as UTC).
pub fn parse_timestamp_or(text: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return fallback;
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return dt.with_timezone(&Utc);
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .unwrap_or(fallback)
}

/// Decay parameters and score composition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayModel {
    /// Base decay rate per day
    pub alpha: f64,
    /// Weight applied to similarity
    pub similarity_weight: f64,
    /// Weight applied to the temporal weight
    pub temporal_weight: f64,
}

impl Default for DecayModel {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_DECAY_ALPHA,
            similarity_weight: DEFAULT_SIMILARITY_WEIGHT,
            temporal_weight: DEFAULT_TEMPORAL_WEIGHT,
        }
    }
}

impl DecayModel {
    /// Builder: set the base decay rate
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder: set both score weights
    pub fn with_weights(mut self, similarity: f64, temporal: f64) -> Self {
        self.similarity_weight = similarity;
        self.temporal_weight = temporal;
        self
    }

    /// Weight in (0, 1] for an item of the given age and significance.
    ///
    /// `significance = None` applies the base rate unmodified.
    pub fn temporal_weight(
        &self,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
        significance: Option<f64>,
    ) -> f64 {
        let alpha = match significance {
            Some(s) => adjusted_alpha(self.alpha, s),
            None => self.alpha,
        };
        (-alpha * elapsed_days(created_at, now)).exp()
    }

    /// Weighted sum of similarity and temporal weight
    pub fn combined_score(&self, similarity: f64, temporal_weight: f64) -> f64 {
        self.similarity_weight * similarity + self.temporal_weight * temporal_weight
    }

    /// Half-life of the base rate in days
    pub fn half_life_days(&self) -> f64 {
        half_life_days(self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_weight_at_creation_is_one() {
        let model = DecayModel::default();
        assert_eq!(model.temporal_weight(t0(), t0(), Some(0.5)), 1.0);
        assert_eq!(model.temporal_weight(t0(), t0(), None), 1.0);
    }

    #[test]
    fn test_future_timestamp_clamps_to_one() {
        let model = DecayModel::default();
        let future = t0() + Duration::days(30);
        assert_eq!(model.temporal_weight(future, t0(), Some(0.0)), 1.0);
    }

    #[test]
    fn test_one_year_old_weight_is_tiny() {
        let model = DecayModel::default();
        let w = model.temporal_weight(t0(), t0() + Duration::days(365), None);
        assert!(w < 0.001, "got {}", w);
    }

    #[test]
    fn test_significance_endpoints_and_continuity() {
        let alpha = 0.02;
        assert!((adjusted_alpha(alpha, 0.5) - alpha).abs() < 1e-15);
        assert!((adjusted_alpha(alpha, 0.5 - 1e-12) - alpha).abs() < 1e-12);
        assert!((adjusted_alpha(alpha, 1.0) - 0.1 * alpha).abs() < 1e-15);
        assert!((adjusted_alpha(alpha, 0.0) - 2.0 * alpha).abs() < 1e-15);
    }

    #[test]
    fn test_significance_is_clamped() {
        assert_eq!(adjusted_alpha(0.02, 3.0), adjusted_alpha(0.02, 1.0));
        assert_eq!(adjusted_alpha(0.02, -1.0), adjusted_alpha(0.02, 0.0));
    }

    #[test]
    fn test_half_life() {
        assert!((half_life_days(0.02) - 34.657).abs() < 0.01);
        assert!((half_life_days(0.1) - 6.931).abs() < 0.01);
    }

    #[test]
    fn test_weight_halves_at_half_life() {
        let model = DecayModel::default();
        let days = half_life_days(adjusted_alpha(model.alpha, 0.8));
        let now = t0() + Duration::milliseconds((days * MILLIS_PER_DAY) as i64);
        let w = model.temporal_weight(t0(), now, Some(0.8));
        assert!((w - 0.5).abs() < 1e-6, "got {}", w);
    }

    #[test]
    fn test_combined_score() {
        let model = DecayModel::default();
        assert!((model.combined_score(0.8, 1.0) - 0.88).abs() < 1e-12);

        let old = model.temporal_weight(t0(), t0() + Duration::days(365), None);
        let score = model.combined_score(0.9, old);
        assert!(score > 0.53 && score < 0.55, "got {}", score);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let fallback = t0();
        let rfc = parse_timestamp_or(Some("2023-06-15T12:00:00+00:00"), fallback);
        assert_eq!(rfc.to_rfc3339(), "2023-06-15T12:00:00+00:00");

        let naive = parse_timestamp_or(Some("2023-06-15T12:00:00.250"), fallback);
        assert_eq!(naive.timestamp_millis(), rfc.timestamp_millis() + 250);

        assert_eq!(parse_timestamp_or(Some("last tuesday"), fallback), fallback);
        assert_eq!(parse_timestamp_or(Some(""), fallback), fallback);
        assert_eq!(parse_timestamp_or(None, fallback), fallback);
    }

    proptest! {
        #[test]
        fn prop_weight_in_unit_interval(days in 0.001f64..5000.0, s in 0.0f64..=1.0) {
            let model = DecayModel::default();
            let now = t0() + Duration::milliseconds((days * MILLIS_PER_DAY) as i64);
            let w = model.temporal_weight(t0(), now, Some(s));
            prop_assert!(w > 0.0 && w < 1.0);
        }

        #[test]
        fn prop_weight_strictly_decreasing_in_age(days in 0.0f64..500.0, extra in 1.0f64..100.0, s in 0.0f64..=1.0) {
            let model = DecayModel::default();
            let earlier = t0() + Duration::milliseconds((days * MILLIS_PER_DAY) as i64);
            let later = earlier + Duration::milliseconds((extra * MILLIS_PER_DAY) as i64);
            let w1 = model.temporal_weight(t0(), earlier, Some(s));
            let w2 = model.temporal_weight(t0(), later, Some(s));
            prop_assert!(w2 < w1);
        }

        #[test]
        fn prop_alpha_decreasing_in_significance(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(adjusted_alpha(0.02, hi) <= adjusted_alpha(0.02, lo));
        }

        #[test]
        fn prop_recent_beats_old_at_equal_similarity(sim in 0.0f64..=1.0, age in 1.0f64..400.0) {
            let model = DecayModel::default();
            let now = t0() + Duration::days(400);
            let old_created = now - Duration::milliseconds((age * MILLIS_PER_DAY) as i64);
            let recent = model.combined_score(sim, model.temporal_weight(now, now, None));
            let old = model.combined_score(sim, model.temporal_weight(old_created, now, None));
            prop_assert!(recent >= old);
        }
    }
}
