//! Two-bar reversal pattern detectors
//!
//! Patterns: Bullish Engulfing, Bearish Engulfing, Piercing Line.
//!
//! Each predicate is evaluated independently over the (previous,
//! current) pair and every one that fires is reported; there is no
//! precedence and no early exit. Adjacency of the two bars is the
//! caller's contract - the scanner slices the pair, the detectors only
//! read `index - 1` and `index`.

use std::collections::HashMap;

use crate::{
    params::{get_ratio, ParamMeta, ParamType, ParameterizedDetector},
    CandleExt, Direction, Ohlc, PatternDetector, PatternId, PatternMatch, Ratio, Result,
};

impl_with_defaults!(
    BullishEngulfingDetector,
    BearishEngulfingDetector,
    PiercingLineDetector,
);

// ============================================================
// ENGULFING PATTERNS
// ============================================================

/// Bullish Engulfing - a bullish body that fully contains and exceeds
/// the prior bearish body.
#[derive(Debug, Clone, Copy, Default)]
pub struct BullishEngulfingDetector;

impl PatternDetector for BullishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId("BULLISH_ENGULFING")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        if index < 1 {
            return None;
        }
        let prev = bars.get(index - 1)?;
        let curr = bars.get(index)?;

        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        if curr.open() >= prev.close() {
            return None;
        }
        if curr.close() <= prev.open() {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Bullish,
            strength: 0.7,
            start_index: index - 1,
            end_index: index,
        })
    }
}

/// Bearish Engulfing - the exact mirror: a bearish body that fully
/// contains and exceeds the prior bullish body. Mutually exclusive with
/// the bullish variant by construction (opposite color requirements).
#[derive(Debug, Clone, Copy, Default)]
pub struct BearishEngulfingDetector;

impl PatternDetector for BearishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId("BEARISH_ENGULFING")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        if index < 1 {
            return None;
        }
        let prev = bars.get(index - 1)?;
        let curr = bars.get(index)?;

        if !prev.is_bullish() || !curr.is_bearish() {
            return None;
        }
        if curr.open() <= prev.close() {
            return None;
        }
        if curr.close() >= prev.open() {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Bearish,
            strength: 0.7,
            start_index: index - 1,
            end_index: index,
        })
    }
}

// ============================================================
// PIERCING LINE
// ============================================================

/// Piercing Line - a bullish bar that gaps down below the prior bar's
/// low, then closes above the midpoint of the prior bearish body while
/// staying below its open.
#[derive(Debug, Clone)]
pub struct PiercingLineDetector {
    pub min_pierce_ratio: Ratio,
}

impl Default for PiercingLineDetector {
    fn default() -> Self {
        Self {
            min_pierce_ratio: Ratio::new_const(0.5),
        }
    }
}

impl PatternDetector for PiercingLineDetector {
    fn id(&self) -> PatternId {
        PatternId("PIERCING_LINE")
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        if index < 1 {
            return None;
        }
        let prev = bars.get(index - 1)?;
        let curr = bars.get(index)?;

        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        // Gap down: opens below the prior LOW, not merely the prior close.
        if curr.open() >= prev.low() {
            return None;
        }
        // Closes within the prior body, above its midpoint.
        if curr.close() >= prev.open() {
            return None;
        }
        if curr.close() <= prev.close() + prev.body() * self.min_pierce_ratio.get() {
            return None;
        }

        Some(PatternMatch {
            pattern_id: PatternDetector::id(self),
            direction: Direction::Bullish,
            strength: 0.7,
            start_index: index - 1,
            end_index: index,
        })
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static PIERCING_PARAMS: &[ParamMeta] = &[ParamMeta {
    name: "min_pierce_ratio",
    param_type: ParamType::Ratio,
    default: 0.5,
    range: (0.3, 0.7, 0.1),
    description: "Close must pierce above this fraction of the prior body",
}];

static NO_PARAMS: &[ParamMeta] = &[];

impl ParameterizedDetector for BullishEngulfingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        NO_PARAMS
    }

    fn with_params(_params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self)
    }

    fn pattern_id_str() -> &'static str {
        "BULLISH_ENGULFING"
    }
}

impl ParameterizedDetector for BearishEngulfingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        NO_PARAMS
    }

    fn with_params(_params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self)
    }

    fn pattern_id_str() -> &'static str {
        "BEARISH_ENGULFING"
    }
}

impl ParameterizedDetector for PiercingLineDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PIERCING_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_pierce_ratio: get_ratio(params, "min_pierce_ratio", 0.5)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "PIERCING_LINE"
    }
}

// ============================================================
// TESTS
// ============================================================
