//! Single-bar candlestick pattern detectors
//!
//! Patterns: Hammer, Shooting Star, Spinning Top.
//!
//! All three compare body size against total range with the canonical
//! 0.3 ratio. Hammer uses `<=` while Spinning Top uses strict `<`, so
//! both can legitimately fire on one bar; they capture different
//! wick-symmetry conditions and are reported independently.

use std::collections::HashMap;

use super::helpers::{self, is_body_at_most, is_body_under, is_wick_dominant};
use crate::{
    params::{ParamMeta, ParamType, ParameterizedDetector},
    CandleExt, Direction, Ohlc, PatternDetector, PatternId, PatternMatch, Result,
};

impl_with_defaults!(HammerDetector, ShootingStarDetector, SpinningTopDetector);

// ============================================================
// HAMMER
// ============================================================

/// Hammer - small body near the top of the range with a dominant lower
/// wick. A zero-range bar abstains (the ratio comparisons are kept in
/// cross-multiplied form).
#[derive(Debug, Clone, Copy)]
pub struct HammerDetector {
    pub body_max_ratio: f64,
    pub wick_factor: f64,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            body_max_ratio: helpers::BODY_SMALL_RATIO,
            wick_factor: helpers::WICK_DOMINANCE_FACTOR,
        }
    }
}

impl PatternDetector for HammerDetector {
    fn id(&self) -> PatternId {
        PatternId("HAMMER")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let body = bar.body();
        let range = bar.range();

        if !is_body_at_most(body, range, self.body_max_ratio) {
            return None;
        }
        if !is_wick_dominant(bar.lower_wick(), body, self.wick_factor) {
            return None;
        }
        if bar.upper_wick() >= body {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Bullish,
            strength: 0.65,
            start_index: index,
            end_index: index,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.body_max_ratio) {
            return Err(crate::PatternError::OutOfRange {
                field: "body_max_ratio",
                value: self.body_max_ratio,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.wick_factor < 1.0 {
            return Err(crate::PatternError::InvalidConfig(
                "wick_factor must be >= 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// SHOOTING STAR
// ============================================================

/// Shooting Star - the hammer's mirror: small body near the bottom of
/// the range with a dominant upper wick.
#[derive(Debug, Clone, Copy)]
pub struct ShootingStarDetector {
    pub body_max_ratio: f64,
    pub wick_factor: f64,
}

impl Default for ShootingStarDetector {
    fn default() -> Self {
        Self {
            body_max_ratio: helpers::BODY_SMALL_RATIO,
            wick_factor: helpers::WICK_DOMINANCE_FACTOR,
        }
    }
}

impl PatternDetector for ShootingStarDetector {
    fn id(&self) -> PatternId {
        PatternId("SHOOTING_STAR")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let body = bar.body();
        let range = bar.range();

        if !is_body_at_most(body, range, self.body_max_ratio) {
            return None;
        }
        if !is_wick_dominant(bar.upper_wick(), body, self.wick_factor) {
            return None;
        }
        if bar.lower_wick() >= body {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Bearish,
            strength: 0.65,
            start_index: index,
            end_index: index,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.body_max_ratio) {
            return Err(crate::PatternError::OutOfRange {
                field: "body_max_ratio",
                value: self.body_max_ratio,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.wick_factor < 1.0 {
            return Err(crate::PatternError::InvalidConfig(
                "wick_factor must be >= 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================
// SPINNING TOP
// ============================================================

/// Spinning Top - small body relative to total range, wicks on both
/// sides, signalling indecision. Strict `<` on the body ratio: a body at
/// exactly 0.3 of the range does not fire.
#[derive(Debug, Clone, Copy)]
pub struct SpinningTopDetector {
    pub body_max_ratio: f64,
}

impl Default for SpinningTopDetector {
    fn default() -> Self {
        Self {
            body_max_ratio: helpers::BODY_SMALL_RATIO,
        }
    }
}

impl PatternDetector for SpinningTopDetector {
    fn id(&self) -> PatternId {
        PatternId("SPINNING_TOP")
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let body = bar.body();
        let range = bar.range();

        if !is_body_under(body, range, self.body_max_ratio) {
            return None;
        }

        // Smaller body relative to the cap -> stronger indecision signal.
        let ratio = body / range;
        let strength = 0.5 + (1.0 - ratio / self.body_max_ratio).clamp(0.0, 1.0) * 0.5;

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Neutral,
            strength,
            start_index: index,
            end_index: index,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.body_max_ratio) || self.body_max_ratio == 0.0 {
            return Err(crate::PatternError::OutOfRange {
                field: "body_max_ratio",
                value: self.body_max_ratio,
                min: f64::EPSILON,
                max: 1.0,
            });
        }
        Ok(())
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static HAMMER_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "body_max_ratio",
        param_type: ParamType::Ratio,
        default: helpers::BODY_SMALL_RATIO,
        range: (0.2, 0.4, 0.05),
        description: "Maximum body as fraction of range",
    },
    ParamMeta {
        name: "wick_factor",
        param_type: ParamType::Ratio,
        default: helpers::WICK_DOMINANCE_FACTOR,
        range: (1.5, 3.0, 0.5),
        description: "Lower wick must exceed body times this factor",
    },
];

static SHOOTINGSTAR_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "body_max_ratio",
        param_type: ParamType::Ratio,
        default: helpers::BODY_SMALL_RATIO,
        range: (0.2, 0.4, 0.05),
        description: "Maximum body as fraction of range",
    },
    ParamMeta {
        name: "wick_factor",
        param_type: ParamType::Ratio,
        default: helpers::WICK_DOMINANCE_FACTOR,
        range: (1.5, 3.0, 0.5),
        description: "Upper wick must exceed body times this factor",
    },
];

static SPINNINGTOP_PARAMS: &[ParamMeta] = &[ParamMeta {
    name: "body_max_ratio",
    param_type: ParamType::Ratio,
    default: helpers::BODY_SMALL_RATIO,
    range: (0.2, 0.4, 0.05),
    description: "Body must stay strictly under this fraction of range",
}];

impl ParameterizedDetector for HammerDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HAMMER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            body_max_ratio: params
                .get("body_max_ratio")
                .copied()
                .unwrap_or(helpers::BODY_SMALL_RATIO),
            wick_factor: params
                .get("wick_factor")
                .copied()
                .unwrap_or(helpers::WICK_DOMINANCE_FACTOR),
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        "HAMMER"
    }
}

impl ParameterizedDetector for ShootingStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SHOOTINGSTAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            body_max_ratio: params
                .get("body_max_ratio")
                .copied()
                .unwrap_or(helpers::BODY_SMALL_RATIO),
            wick_factor: params
                .get("wick_factor")
                .copied()
                .unwrap_or(helpers::WICK_DOMINANCE_FACTOR),
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        "SHOOTING_STAR"
    }
}

impl ParameterizedDetector for SpinningTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SPINNINGTOP_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            body_max_ratio: params
                .get("body_max_ratio")
                .copied()
                .unwrap_or(helpers::BODY_SMALL_RATIO),
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        "SPINNING_TOP"
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Bar(f64, f64, f64, f64);

    impl Ohlc for Bar {
        fn open(&self) -> f64 {
            self.0
        }
        fn high(&self) -> f64 {
            self.1
        }
        fn low(&self) -> f64 {
            self.2
        }
        fn close(&self) -> f64 {
            self.3
        }
    }

    #[test]
    fn test_hammer_fires_on_long_lower_wick() {
        // body 0.5, lower wick 10.0, upper wick 0.1
        let bars = [Bar(100.0, 100.6, 90.0, 100.5)];
        let m = HammerDetector::with_defaults().detect(&bars, 0);
        assert!(m.is_some());
        assert_eq!(m.unwrap().pattern_id.0, "HAMMER");
    }

    #[test]
    fn test_hammer_abstains_on_flat_bar() {
        let bars = [Bar(100.0, 100.0, 100.0, 100.0)];
        assert!(HammerDetector::with_defaults().detect(&bars, 0).is_none());
    }

    #[test]
    fn test_hammer_rejects_large_upper_wick() {
        // Lower wick dominant but upper wick exceeds body
        let bars = [Bar(100.0, 102.0, 90.0, 100.5)];
        assert!(HammerDetector::with_defaults().detect(&bars, 0).is_none());
    }

    #[test]
    fn test_shooting_star_fires_on_long_upper_wick() {
        // body 0.5, upper wick 10.0, lower wick 0.1
        let bars = [Bar(100.5, 110.5, 99.9, 100.0)];
        let m = ShootingStarDetector::with_defaults().detect(&bars, 0);
        assert!(m.is_some());
        assert_eq!(m.unwrap().direction, Direction::Bearish);
    }

    #[test]
    fn test_shooting_star_abstains_on_flat_bar() {
        let bars = [Bar(100.0, 100.0, 100.0, 100.0)];
        assert!(ShootingStarDetector::with_defaults()
            .detect(&bars, 0)
            .is_none());
    }

    #[test]
    fn test_spinning_top_fires_under_ratio() {
        // body 1.0, range 10.0 -> ratio 0.1
        let bars = [Bar(100.0, 106.0, 96.0, 101.0)];
        let m = SpinningTopDetector::with_defaults().detect(&bars, 0);
        assert!(m.is_some());
        assert_eq!(m.unwrap().direction, Direction::Neutral);
    }

    #[test]
    fn test_spinning_top_strict_at_boundary() {
        // body exactly 0.3 * range: spinning top must NOT fire
        let bars = [Bar(100.0, 105.0, 95.0, 103.0)];
        assert!(SpinningTopDetector::with_defaults()
            .detect(&bars, 0)
            .is_none());
    }

    #[test]
    fn test_hammer_inclusive_at_boundary() {
        // body exactly 0.3 * range still satisfies hammer's `<=` body
        // condition; wicks make it fire: body 3, lower wick 7, upper 0
        let bars = [Bar(97.0, 100.0, 90.0, 100.0)];
        let m = HammerDetector::with_defaults().detect(&bars, 0);
        assert!(m.is_some());
    }

    #[test]
    fn test_spinning_top_abstains_on_flat_bar() {
        let bars = [Bar(100.0, 100.0, 100.0, 100.0)];
        assert!(SpinningTopDetector::with_defaults()
            .detect(&bars, 0)
            .is_none());
    }

    #[test]
    fn test_with_params_validates() {
        let mut params = HashMap::new();
        params.insert("wick_factor", 0.5);
        assert!(HammerDetector::with_params(&params).is_err());

        let mut params = HashMap::new();
        params.insert("body_max_ratio", 0.25);
        let d = HammerDetector::with_params(&params).unwrap();
        assert!((d.body_max_ratio - 0.25).abs() < f64::EPSILON);
    }
}
