//! Chart pattern detectors over trailing windows
//!
//! Patterns: Resistance Breakout, Trend Line Breakout, Cup & Handle.
//!
//! These are heuristic geometric matches against fixed thresholds, not
//! statistically validated signals; false positives on noisy data are
//! expected. A window shorter than a detector's requirement is a normal
//! "no signal" outcome.

use std::collections::HashMap;

use super::helpers::{
    self, find_peaks, linear_fit, window_high_max, window_low_argmin,
};
use crate::{
    params::{get_period, ParamMeta, ParamType, ParameterizedDetector},
    Direction, Ohlc, PatternDetector, PatternError, PatternId, PatternMatch, Period, Result,
};

impl_with_defaults!(
    ResistanceBreakoutDetector,
    TrendLineDetector,
    CupAndHandleDetector,
);

// ============================================================
// RESISTANCE BREAKOUT
// ============================================================

/// Resistance Breakout - today's close strictly exceeds the highest high
/// of the trailing window (today excluded). A close exactly equal to the
/// prior high does not fire.
#[derive(Debug, Clone)]
pub struct ResistanceBreakoutDetector {
    /// Sessions of history to treat as the resistance window.
    pub lookback: Period,
}

impl Default for ResistanceBreakoutDetector {
    fn default() -> Self {
        Self {
            lookback: Period::new_const(helpers::DEFAULT_BREAKOUT_LOOKBACK),
        }
    }
}

impl PatternDetector for ResistanceBreakoutDetector {
    fn id(&self) -> PatternId {
        PatternId("RESISTANCE_BREAKOUT")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        if index < 1 {
            return None;
        }
        let curr = bars.get(index)?;

        let start = index.saturating_sub(self.lookback.get());
        let window = &bars[start..index];
        let resistance = window_high_max(window)?;

        if curr.close() <= resistance {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Bullish,
            strength: 0.7,
            start_index: start,
            end_index: index,
        })
    }
}

// ============================================================
// TREND LINE BREAKOUT
// ============================================================

/// Trend Line Breakout - fits a least-squares line through the local
/// maxima of the trailing window's highs and tests today's close against
/// the projected resistance, with a 0.5% tolerance band below the line.
///
/// Fewer than two detected peaks means no fitted line and no signal.
#[derive(Debug, Clone)]
pub struct TrendLineDetector {
    /// Window length in sessions; the detector abstains on shorter input.
    pub lookback: Period,
    /// Minimum separation between accepted peaks, in samples.
    pub peak_distance: Period,
    /// Multiplier applied to the projected line value; closes at or above
    /// `trend_y * tolerance` count as breakouts.
    pub tolerance: f64,
}

impl Default for TrendLineDetector {
    fn default() -> Self {
        Self {
            lookback: Period::new_const(helpers::DEFAULT_TREND_LOOKBACK),
            peak_distance: Period::new_const(helpers::DEFAULT_PEAK_DISTANCE),
            tolerance: helpers::TREND_BREAK_TOLERANCE,
        }
    }
}

impl PatternDetector for TrendLineDetector {
    fn id(&self) -> PatternId {
        PatternId("TREND_LINE_BREAKOUT")
    }

    fn min_bars(&self) -> usize {
        self.lookback.get()
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let lookback = self.lookback.get();
        if index + 1 < lookback {
            return None;
        }
        let curr = bars.get(index)?;

        let start = index + 1 - lookback;
        let window = &bars[start..=index];
        let highs: Vec<f64> = window.iter().map(|b| b.high()).collect();

        let peaks = find_peaks(&highs, self.peak_distance.get());
        if peaks.len() < 2 {
            return None;
        }

        let points: Vec<(f64, f64)> = peaks.iter().map(|&i| (i as f64, highs[i])).collect();
        let (slope, intercept) = linear_fit(&points)?;
        let trend_y = slope * (window.len() - 1) as f64 + intercept;

        if curr.close() < trend_y * self.tolerance {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Bullish,
            strength: 0.65,
            start_index: start,
            end_index: index,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if self.peak_distance.get() >= self.lookback.get() {
            return Err(PatternError::InvalidConfig(format!(
                "peak_distance {} must be smaller than lookback {}",
                self.peak_distance.get(),
                self.lookback.get()
            )));
        }
        if !(self.tolerance > 0.0 && self.tolerance <= 1.0) {
            return Err(PatternError::OutOfRange {
                field: "tolerance",
                value: self.tolerance,
                min: f64::EPSILON,
                max: 1.0,
            });
        }
        Ok(())
    }
}

// ============================================================
// CUP AND HANDLE
// ============================================================

/// Cup & Handle - three-phase shape match over the trailing window:
/// a left rim, a rounded bottom, a right rim within 5% of the left, and
/// a shallow handle consolidation whose pullback stays above one third
/// of the cup depth.
#[derive(Debug, Clone)]
pub struct CupAndHandleDetector {
    /// Window length in sessions; the detector abstains on shorter input.
    pub window: Period,
    /// Handle length, taken from the tail of the right-rim sub-window.
    pub handle: Period,
}

impl Default for CupAndHandleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(helpers::DEFAULT_CUP_WINDOW),
            handle: Period::new_const(helpers::DEFAULT_HANDLE_WINDOW),
        }
    }
}

impl PatternDetector for CupAndHandleDetector {
    fn id(&self) -> PatternId {
        PatternId("CUP_AND_HANDLE")
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let window_len = self.window.get();
        if index + 1 < window_len || index >= bars.len() {
            return None;
        }

        let start = index + 1 - window_len;
        let window = &bars[start..=index];

        let left_rim = window_high_max(window)?;
        let (bottom_index, bottom_price) = window_low_argmin(window)?;

        let right = &window[bottom_index..];
        let right_rim = window_high_max(right)?;

        if left_rim <= 0.0 {
            return None;
        }
        if (right_rim - left_rim).abs() / left_rim >= helpers::RIM_SYMMETRY_RATIO {
            return None;
        }

        let cup_height = left_rim - bottom_price;
        if cup_height <= 0.0 {
            return None;
        }

        let handle_len = self.handle.get().min(right.len());
        let handle = &right[right.len() - handle_len..];
        let (_, handle_low) = window_low_argmin(handle)?;

        if handle_low < right_rim - cup_height / helpers::HANDLE_DEPTH_DIVISOR {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Bullish,
            strength: 0.6,
            start_index: start,
            end_index: index,
        })
    }

    fn validate_config(&self) -> Result<()> {
        if self.handle.get() > self.window.get() {
            return Err(PatternError::InvalidConfig(format!(
                "handle {} must not exceed window {}",
                self.handle.get(),
                self.window.get()
            )));
        }
        Ok(())
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static BREAKOUT_PARAMS: &[ParamMeta] = &[ParamMeta {
    name: "lookback",
    param_type: ParamType::Period,
    default: helpers::DEFAULT_BREAKOUT_LOOKBACK as f64,
    range: (20.0, 120.0, 20.0),
    description: "Resistance window length in sessions",
}];

static TRENDLINE_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "lookback_days",
        param_type: ParamType::Period,
        default: helpers::DEFAULT_TREND_LOOKBACK as f64,
        range: (20.0, 60.0, 10.0),
        description: "Trend window length in sessions",
    },
    ParamMeta {
        name: "peak_distance",
        param_type: ParamType::Period,
        default: helpers::DEFAULT_PEAK_DISTANCE as f64,
        range: (2.0, 5.0, 1.0),
        description: "Minimum separation between accepted peaks",
    },
];

static CUPANDHANDLE_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "cup_window",
        param_type: ParamType::Period,
        default: helpers::DEFAULT_CUP_WINDOW as f64,
        range: (20.0, 40.0, 5.0),
        description: "Cup window length in sessions",
    },
    ParamMeta {
        name: "handle_window",
        param_type: ParamType::Period,
        default: helpers::DEFAULT_HANDLE_WINDOW as f64,
        range: (3.0, 7.0, 1.0),
        description: "Handle consolidation length in sessions",
    },
];

impl ParameterizedDetector for ResistanceBreakoutDetector {
    fn param_meta() -> &'static [ParamMeta] {
        BREAKOUT_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            lookback: get_period(params, "lookback", helpers::DEFAULT_BREAKOUT_LOOKBACK)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "RESISTANCE_BREAKOUT"
    }
}

impl ParameterizedDetector for TrendLineDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TRENDLINE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            lookback: get_period(params, "lookback_days", helpers::DEFAULT_TREND_LOOKBACK)?,
            peak_distance: get_period(params, "peak_distance", helpers::DEFAULT_PEAK_DISTANCE)?,
            tolerance: helpers::TREND_BREAK_TOLERANCE,
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        "TREND_LINE_BREAKOUT"
    }
}

impl ParameterizedDetector for CupAndHandleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        CUPANDHANDLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let detector = Self {
            window: get_period(params, "cup_window", helpers::DEFAULT_CUP_WINDOW)?,
            handle: get_period(params, "handle_window", helpers::DEFAULT_HANDLE_WINDOW)?,
        };
        detector.validate_config()?;
        Ok(detector)
    }

    fn pattern_id_str() -> &'static str {
        "CUP_AND_HANDLE"
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Bar(f64, f64, f64, f64);

    impl Bar {
        fn flat(price: f64) -> Self {
            Bar(price, price + 0.2, price - 0.2, price)
        }
    }

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
    fn test_breakout_strict_inequality() {
        // Window highs [10, 12, 9]; today closes at exactly the max
        let bars = [
            Bar(9.5, 10.0, 9.0, 9.8),
            Bar(11.0, 12.0, 10.5, 11.5),
            Bar(9.0, 9.0, 8.5, 8.8),
            Bar(11.0, 12.5, 10.8, 12.0),
        ];
        let d = ResistanceBreakoutDetector::with_defaults();
        assert!(d.detect(&bars, 3).is_none());

        let bars = [
            Bar(9.5, 10.0, 9.0, 9.8),
            Bar(11.0, 12.0, 10.5, 11.5),
            Bar(9.0, 9.0, 8.5, 8.8),
            Bar(11.0, 12.5, 10.8, 12.01),
        ];
        assert!(d.detect(&bars, 3).is_some());
    }

    #[test]
    fn test_breakout_respects_lookback() {
        // The old spike at index 0 falls outside a 2-session lookback
        let bars = [
            Bar(19.5, 20.0, 19.0, 19.8),
            Bar(9.5, 10.0, 9.0, 9.8),
            Bar(9.6, 10.1, 9.2, 9.9),
            Bar(10.0, 10.6, 9.8, 10.5),
        ];
        let d = ResistanceBreakoutDetector {
            lookback: Period::new_const(2),
        };
        let m = d.detect(&bars, 3);
        assert!(m.is_some());
        assert_eq!(m.unwrap().start_index, 1);
    }

    #[test]
    fn test_breakout_abstains_at_index_zero() {
        let bars = [Bar(9.5, 10.0, 9.0, 9.8)];
        assert!(ResistanceBreakoutDetector::with_defaults()
            .detect(&bars, 0)
            .is_none());
    }

    fn trend_window_with_descending_peaks() -> Vec<Bar> {
        // 40 flat bars with two clear swing highs at indices 10 and 30;
        // resistance slopes down from 110 to 106.
        let mut bars: Vec<Bar> = (0..40).map(|_| Bar::flat(100.0)).collect();
        bars[10] = Bar(100.0, 110.0, 99.8, 100.2);
        bars[30] = Bar(100.0, 106.0, 99.8, 100.2);
        bars
    }

    #[test]
    fn test_trend_line_fires_at_projected_resistance() {
        let mut bars = trend_window_with_descending_peaks();
        // Line through (10, 110) and (30, 106): slope -0.2, projected at
        // x=39 -> 104.2; tolerance band floor = 103.679
        bars[39] = Bar(103.5, 104.5, 103.0, 104.0);
        let d = TrendLineDetector::with_defaults();
        assert!(d.detect(&bars, 39).is_some());
    }

    #[test]
    fn test_trend_line_abstains_below_band() {
        let mut bars = trend_window_with_descending_peaks();
        bars[39] = Bar(100.0, 101.0, 99.5, 100.5);
        let d = TrendLineDetector::with_defaults();
        assert!(d.detect(&bars, 39).is_none());
    }

    #[test]
    fn test_trend_line_abstains_with_fewer_than_two_peaks() {
        // One swing high only; today's close far above everything
        let mut bars: Vec<Bar> = (0..40).map(|_| Bar::flat(100.0)).collect();
        bars[20] = Bar(100.0, 110.0, 99.8, 100.2);
        bars[39] = Bar(120.0, 125.0, 119.0, 124.0);
        let d = TrendLineDetector::with_defaults();
        assert!(d.detect(&bars, 39).is_none());
    }

    #[test]
    fn test_trend_line_abstains_on_short_window() {
        let bars: Vec<Bar> = (0..39).map(|_| Bar::flat(100.0)).collect();
        let d = TrendLineDetector::with_defaults();
        assert!(d.detect(&bars, 38).is_none());
    }

    #[test]
    fn test_trend_line_validate_config() {
        let d = TrendLineDetector {
            lookback: Period::new_const(5),
            peak_distance: Period::new_const(5),
            tolerance: helpers::TREND_BREAK_TOLERANCE,
        };
        assert!(d.validate_config().is_err());

        let d = TrendLineDetector {
            tolerance: 1.5,
            ..TrendLineDetector::with_defaults()
        };
        assert!(d.validate_config().is_err());
    }

    fn cup_window(handle_low: f64) -> Vec<Bar> {
        // 30 bars: left rim 100 at index 2, bottom 80 at index 15,
        // right rim 98 at index 20, handle = last 5 bars
        let mut bars: Vec<Bar> = (0..30).map(|_| Bar::flat(90.0)).collect();
        bars[2] = Bar(95.0, 100.0, 94.0, 96.0);
        bars[15] = Bar(85.0, 86.0, 80.0, 85.5);
        bars[20] = Bar(95.0, 98.0, 94.0, 96.0);
        for i in 25..30 {
            bars[i] = Bar(96.0, 97.0, handle_low, 96.5);
        }
        bars
    }

    #[test]
    fn test_cup_and_handle_fires_on_shallow_handle() {
        // cup height 20, rims 100/98 within 5%; handle floor =
        // 98 - 20/3 = 91.33 and the handle low 95 stays above it
        let bars = cup_window(95.0);
        let d = CupAndHandleDetector::with_defaults();
        assert!(d.detect(&bars, 29).is_some());
    }

    #[test]
    fn test_cup_and_handle_rejects_deep_handle() {
        // Handle low 91 dips below the 91.33 floor
        let bars = cup_window(91.0);
        let d = CupAndHandleDetector::with_defaults();
        assert!(d.detect(&bars, 29).is_none());
    }

    #[test]
    fn test_cup_and_handle_rejects_asymmetric_rims() {
        // Right rim only reaches ~90: more than 5% below the left rim
        let mut bars = cup_window(89.0);
        bars[20] = Bar(88.0, 90.0, 87.0, 89.0);
        for i in 25..30 {
            bars[i] = Bar(89.0, 89.5, 88.5, 89.2);
        }
        let d = CupAndHandleDetector::with_defaults();
        assert!(d.detect(&bars, 29).is_none());
    }

    #[test]
    fn test_cup_and_handle_abstains_on_short_window() {
        let bars: Vec<Bar> = (0..29).map(|_| Bar::flat(90.0)).collect();
        let d = CupAndHandleDetector::with_defaults();
        assert!(d.detect(&bars, 28).is_none());
    }

    #[test]
    fn test_cup_and_handle_validate_config() {
        let d = CupAndHandleDetector {
            window: Period::new_const(10),
            handle: Period::new_const(11),
        };
        assert!(d.validate_config().is_err());
    }

    #[test]
    fn test_with_params_round_trip() {
        let mut params = HashMap::new();
        params.insert("lookback_days", 20.0);
        params.insert("peak_distance", 2.0);
        let d = TrendLineDetector::with_params(&params).unwrap();
        assert_eq!(d.lookback.get(), 20);
        assert_eq!(d.peak_distance.get(), 2);
    }
}
